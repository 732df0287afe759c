//! Message and outcome types for actor communication.

use std::fmt;
use std::process::ExitCode;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::config::BrokerAddress;
use crate::error::FeedError;

/// Raw message body, owned by whichever side currently holds it.
pub type Payload = Vec<u8>;

/// Create the listener → coordinator handoff channel.
///
/// Unbounded: the listener never blocks or drops on send.
pub fn handoff() -> (Sender<Payload>, Receiver<Payload>) {
    unbounded()
}

/// Why the listener thread returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerExit {
    /// Cancellation was observed.
    Cancelled,
    /// The coordinator dropped its end of the channel.
    ChannelClosed,
    /// The initial connection failed.
    ConnectFailed(FeedError),
    /// An established session dropped and reconnection gave up.
    ConnectionLost(FeedError),
}

/// Coordinator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Constructed; listener not yet spawned.
    Starting,
    /// Draining the channel and repainting.
    Running,
    /// Cancellation observed; joining the listener.
    Stopping,
    /// Surface released; nothing left to do.
    Stopped,
}

/// How a run ended, reported to the operator after the surface is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Clean, user-initiated shutdown.
    Interrupted,
    /// The broker could not be reached at startup.
    ConnectFailed {
        /// Broker that was tried.
        broker: BrokerAddress,
        /// Why it failed.
        error: FeedError,
    },
    /// The broker went away and reconnection gave up.
    ConnectionLost {
        /// Broker that was lost.
        broker: BrokerAddress,
        /// Last error seen.
        error: FeedError,
    },
}

impl RunOutcome {
    /// Map a listener result to an outcome. A listener that did not report
    /// (join timed out) is treated as interrupted.
    pub fn from_listener(exit: Option<ListenerExit>, broker: &BrokerAddress) -> Self {
        match exit {
            Some(ListenerExit::ConnectFailed(error)) => Self::ConnectFailed {
                broker: broker.clone(),
                error,
            },
            Some(ListenerExit::ConnectionLost(error)) => Self::ConnectionLost {
                broker: broker.clone(),
                error,
            },
            Some(ListenerExit::Cancelled | ListenerExit::ChannelClosed) | None => {
                Self::Interrupted
            }
        }
    }

    /// Whether the run ended because of a failure.
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Self::Interrupted)
    }

    /// Process exit code: 0 on interrupt, 1 on broker failure.
    pub fn exit_code(&self) -> ExitCode {
        if self.is_failure() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted => write!(f, "Exiting."),
            Self::ConnectFailed { broker, error } => {
                write!(f, "Failed to connect to MQTT broker at {broker}: {error}")
            }
            Self::ConnectionLost { broker, error } => {
                write!(f, "Lost MQTT broker at {broker}: {error}")
            }
        }
    }
}
