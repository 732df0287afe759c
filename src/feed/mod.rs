//! Feed: the broker side of the listener.
//!
//! The listener loop is written against [`FeedSource`] so the threading and
//! shutdown logic does not depend on a particular client library.
//! [`MqttSource`] is the production implementation.

mod mqtt;

pub use mqtt::MqttSource;

use std::time::Duration;

use crate::actor::Payload;
use crate::error::FeedError;

/// Something a source produced within one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A message arrived on the subscribed topic.
    Payload(Payload),
    /// The session was (re-)established and the subscription renewed.
    Connected,
}

/// A subscription to the board topic.
pub trait FeedSource {
    /// Establish the session and subscribe. Blocks for at most the
    /// source's own connect timeout.
    fn connect(&mut self) -> Result<(), FeedError>;

    /// Wait up to `timeout` for the next event.
    ///
    /// `Ok(None)` means nothing of interest happened. An `Err` means the
    /// session dropped; polling again lets the source try to reconnect.
    fn poll(&mut self, timeout: Duration) -> Result<Option<SourceEvent>, FeedError>;

    /// Unsubscribe and disconnect. Must not block for long.
    fn close(&mut self);
}
