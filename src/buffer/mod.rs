//! Buffer module: Double-buffer primitives for the live board.
//!
//! This module contains:
//! - [`Cell`]: One character position with its [`Style`]
//! - [`Buffer`]: A fixed grid of cells holding one frame
//! - [`Rgb`] and [`Color`]: True color, or the terminal's default
//! - [`Modifiers`]: Text style bitflags
//! - [`diff`]: Emits minimal cursor-addressed ANSI between two frames

mod cell;
#[allow(clippy::module_inception)]
mod buffer;
pub mod diff;

pub use buffer::Buffer;
pub use cell::{Cell, Color, Modifiers, Rgb, Style};
