//! Feed Listener: Dedicated thread owning the broker subscription.
//!
//! The listener forwards every payload, unparsed, into the handoff
//! channel. It never touches board state and never waits on the renderer.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use tracing::{error, info, warn};

use super::cancel::CancelToken;
use super::messages::{ListenerExit, Payload};
use crate::config::ListenerConfig;
use crate::error::ViewerError;
use crate::feed::{FeedSource, SourceEvent};

/// How often a bounded join checks whether the thread has finished.
const JOIN_POLL: Duration = Duration::from_millis(10);

/// Handle to the listener thread.
pub struct FeedListener {
    handle: Option<JoinHandle<ListenerExit>>,
    cancel: CancelToken,
}

impl FeedListener {
    /// Spawn the listener thread.
    ///
    /// The thread runs [`run`] against `source` until `cancel` is set or
    /// the connection fails for good.
    pub fn spawn<S>(
        source: S,
        sender: Sender<Payload>,
        cancel: CancelToken,
        config: ListenerConfig,
    ) -> Result<Self, ViewerError>
    where
        S: FeedSource + Send + 'static,
    {
        let token = cancel.clone();
        let handle = thread::Builder::new()
            .name("chessview-feed".to_string())
            .spawn(move || {
                let mut source = source;
                run(&mut source, &sender, &token, &config)
            })
            .map_err(ViewerError::Spawn)?;

        Ok(Self {
            handle: Some(handle),
            cancel,
        })
    }

    /// Whether the thread has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait at most `timeout` for the thread to return.
    ///
    /// Returns `None` if the thread is still busy when the timeout expires
    /// (it is detached) or if it panicked.
    pub fn join_timeout(mut self, timeout: Duration) -> Option<ListenerExit> {
        self.cancel.cancel();
        let handle = self.handle.take()?;
        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(?timeout, "feed listener did not stop in time; detaching");
                return None;
            }
            thread::sleep(JOIN_POLL);
        }
        match handle.join() {
            Ok(exit) => Some(exit),
            Err(_) => {
                error!("feed listener panicked");
                None
            }
        }
    }
}

impl Drop for FeedListener {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Listener body: connect, subscribe, forward payloads until cancelled.
///
/// A failed initial connect sets `cancel` and returns immediately. After
/// that, dropped sessions are retried per the reconnect policy; running
/// out of attempts also sets `cancel`.
pub fn run<S: FeedSource>(
    source: &mut S,
    channel: &Sender<Payload>,
    cancel: &CancelToken,
    config: &ListenerConfig,
) -> ListenerExit {
    if let Err(e) = source.connect() {
        error!(error = %e, "could not connect to broker");
        cancel.cancel();
        return ListenerExit::ConnectFailed(e);
    }
    info!(topic = %config.topic, "listening for board updates");

    let mut failures = 0u32;
    let exit = loop {
        if cancel.is_cancelled() {
            break ListenerExit::Cancelled;
        }

        match source.poll(config.poll_interval) {
            Ok(Some(SourceEvent::Payload(payload))) => {
                if channel.send(payload).is_err() {
                    break ListenerExit::ChannelClosed;
                }
            }
            Ok(Some(SourceEvent::Connected)) => {
                if failures > 0 {
                    info!(attempts = failures, "session re-established");
                }
                failures = 0;
            }
            Ok(None) => {}
            Err(e) => {
                failures += 1;
                if failures > config.reconnect.max_attempts {
                    error!(error = %e, attempts = failures - 1, "giving up on broker");
                    cancel.cancel();
                    break ListenerExit::ConnectionLost(e);
                }
                let delay = config.reconnect.backoff(failures);
                warn!(error = %e, attempt = failures, ?delay, "connection dropped; retrying");
                if !sleep_unless_cancelled(delay, cancel, config.poll_interval) {
                    break ListenerExit::Cancelled;
                }
            }
        }
    };

    source.close();
    info!(?exit, "feed listener stopped");
    exit
}

/// Sleep for `total`, waking every `step` to check `cancel`.
///
/// Returns `false` if cancelled before the time was up.
fn sleep_unless_cancelled(total: Duration, cancel: &CancelToken, step: Duration) -> bool {
    let deadline = Instant::now() + total;
    let step = step.max(Duration::from_millis(1));
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(step));
    }
}
