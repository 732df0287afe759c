//! Error types.

use std::io;

/// Problems with the broker session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The initial connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The subscription request could not be queued.
    #[error("subscribe failed: {0}")]
    Subscribe(String),

    /// An established session dropped.
    #[error("connection lost: {0}")]
    Disconnected(String),
}

/// Invalid `--broker` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Nothing before the port.
    #[error("broker host is empty")]
    EmptyHost,

    /// Port is not a number in 0..=65535.
    #[error("invalid broker port `{0}`")]
    InvalidPort(String),

    /// Bracketed IPv6 literal is not closed or has junk after it.
    #[error("malformed bracketed address `{0}`")]
    Unbalanced(String),
}

/// Errors that stop the viewer before it can run.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// Terminal setup or teardown failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),

    /// The listener thread could not be spawned.
    #[error("failed to spawn feed listener: {0}")]
    Spawn(io::Error),

    /// `start` was called outside the starting phase.
    #[error("viewer already started")]
    AlreadyStarted,

    /// The Ctrl+C handler could not be installed.
    #[error("failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
