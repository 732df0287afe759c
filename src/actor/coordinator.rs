//! Coordinator: Main loop owning the board state and the renderer.
//!
//! Lifecycle is `Starting -> Running -> Stopping -> Stopped`. The
//! coordinator is the only writer of [`BoardState`]; payloads reach it
//! through the handoff channel and are decoded on this thread.

use std::io::Write;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info};

use super::cancel::CancelToken;
use super::listener::FeedListener;
use super::messages::{handoff, Payload, Phase, RunOutcome};
use crate::board::BoardState;
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::feed::FeedSource;
use crate::terminal::{Renderer, Surface};

/// Drives the viewer from startup to shutdown.
pub struct Coordinator<W: Write> {
    config: ViewerConfig,
    board: BoardState,
    cancel: CancelToken,
    sender: Option<Sender<Payload>>,
    receiver: Receiver<Payload>,
    listener: Option<FeedListener>,
    renderer: Renderer<W>,
    surface: Option<Surface>,
    phase: Phase,
    received: u64,
    applied: u64,
}

impl<W: Write> Coordinator<W> {
    /// Create a coordinator with an empty board, a fresh cancellation token
    /// and the handoff channel. Nothing runs until [`start`](Self::start).
    pub fn new(config: ViewerConfig, renderer: Renderer<W>) -> Self {
        let (sender, receiver) = handoff();
        Self {
            config,
            board: BoardState::new(),
            cancel: CancelToken::new(),
            sender: Some(sender),
            receiver,
            listener: None,
            renderer,
            surface: None,
            phase: Phase::Starting,
            received: 0,
            applied: 0,
        }
    }

    /// Hand over the terminal surface; it is released when the run stops.
    #[must_use]
    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Token that stops the run when cancelled, e.g. from a signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Spawn the listener over `source` and paint the initial board.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::AlreadyStarted`] outside `Starting`, or
    /// [`ViewerError::Spawn`] if the listener thread cannot be created.
    pub fn start<S>(&mut self, source: S) -> Result<(), ViewerError>
    where
        S: FeedSource + Send + 'static,
    {
        if self.phase != Phase::Starting {
            return Err(ViewerError::AlreadyStarted);
        }
        let sender = self.sender.take().ok_or(ViewerError::AlreadyStarted)?;

        let listener = FeedListener::spawn(
            source,
            sender,
            self.cancel.clone(),
            self.config.listener.clone(),
        )?;
        self.listener = Some(listener);

        self.renderer.update(&self.board.render());
        self.renderer.flush_now();
        self.phase = Phase::Running;
        info!(broker = %self.config.broker, "viewer running");
        Ok(())
    }

    /// Run until cancelled, then shut down and report how the run ended.
    ///
    /// Cancellation comes from the token (operator interrupt) or from the
    /// listener giving up on the broker. Calling this before `start`
    /// returns immediately.
    pub fn run(&mut self) -> RunOutcome {
        if self.phase == Phase::Running {
            self.event_loop();
        }
        self.shutdown()
    }

    fn event_loop(&mut self) {
        while !self.cancel.is_cancelled() {
            let wait = self
                .renderer
                .pending_for()
                .map_or(self.config.handoff_wait, |due| due.min(self.config.handoff_wait));

            match self.receiver.recv_timeout(wait) {
                Ok(payload) => self.handle(&payload),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    // Only the listener holds a sender; it has exited.
                    self.cancel.cancel();
                }
            }
            self.renderer.tick();
        }
    }

    fn handle(&mut self, payload: &[u8]) {
        self.received += 1;
        if self.board.update_from_payload(payload) {
            self.applied += 1;
        }
        self.renderer.update(&self.board.render());
    }

    fn shutdown(&mut self) -> RunOutcome {
        self.phase = Phase::Stopping;
        self.cancel.cancel();

        let exit = self
            .listener
            .take()
            .and_then(|listener| listener.join_timeout(self.config.join_timeout));
        debug!(?exit, "listener joined");

        while let Ok(payload) = self.receiver.try_recv() {
            self.handle(&payload);
        }
        self.renderer.flush_now();

        let stats = self.renderer.stats();
        debug!(
            received = self.received,
            applied = self.applied,
            frames = stats.frames,
            coalesced = stats.coalesced,
            cells_changed = stats.cells_changed,
            bytes = stats.bytes_written,
            "render stats"
        );

        self.surface = None;
        self.phase = Phase::Stopped;
        let outcome = RunOutcome::from_listener(exit, &self.config.broker);
        info!(%outcome, "viewer stopped");
        outcome
    }

    /// Current board state.
    pub const fn board(&self) -> &BoardState {
        &self.board
    }

    /// Current lifecycle phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The renderer, for inspecting output and stats.
    pub const fn renderer(&self) -> &Renderer<W> {
        &self.renderer
    }
}
