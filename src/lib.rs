//! # Chessview
//!
//! A live terminal chessboard fed by an MQTT topic.
//!
//! A background listener subscribes to `chess/board/fullstate` and hands
//! every payload, unparsed, to the coordinator over an unbounded channel.
//! The coordinator decodes payloads into a [`BoardState`] and repaints the
//! board in place at a bounded rate.
//!
//! ## Core Concepts
//!
//! - **Last known good**: malformed payloads leave the board untouched
//! - **Single writer**: only the coordinator's thread mutates board state
//! - **Cooperative shutdown**: a shared [`CancelToken`] checked between bounded waits
//! - **Double-buffered rendering**: only changed cells are rewritten
//!
//! ## Example
//!
//! ```rust
//! use chessview::BoardState;
//!
//! let mut board = BoardState::new();
//! assert!(board.update_from_payload(br#"{"timestamp": 7}"#));
//! assert!(!board.update_from_payload(b"not json"));
//! assert_eq!(board.render().title, "Chess Board (timestamp: 7)");
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod board;
pub mod buffer;
pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod terminal;

// Re-exports for convenience
pub use actor::{CancelToken, Coordinator, FeedListener, Phase, RunOutcome};
pub use board::{BoardState, BoardView, Grid};
pub use buffer::{Buffer, Cell, Color, Modifiers, Rgb, Style};
pub use config::{Args, BrokerAddress, ViewerConfig};
pub use error::{FeedError, ViewerError};
pub use feed::{FeedSource, MqttSource};
pub use terminal::{Renderer, Surface};
