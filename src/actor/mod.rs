//! Actors: the feed listener thread and the coordinator loop.
//!
//! ```text
//! ┌───────────────┐   Payload (unbounded)   ┌───────────────┐
//! │ Feed Listener │ ──────────────────────▶ │  Coordinator  │
//! │   (thread)    │                         │  + Renderer   │
//! └───────────────┘                         └───────────────┘
//!         ▲                                         │
//!         └────────────── CancelToken ──────────────┘
//! ```
//!
//! Payloads cross the channel exactly once; board state never leaves the
//! coordinator's thread.

mod cancel;
mod coordinator;
mod listener;
mod messages;

pub use cancel::CancelToken;
pub use coordinator::Coordinator;
pub use listener::{run as run_listener, FeedListener};
pub use messages::{handoff, ListenerExit, Payload, Phase, RunOutcome};
