//! Board: the one piece of display state, and its renderer-ready view.
//!
//! The coordinator is the only writer of [`BoardState`]; the renderer only
//! ever sees the [`BoardView`] built from it.

mod state;
mod view;

pub use state::{BoardState, BoardUpdate, DecodeError, Grid, BOARD_SIZE};
pub use view::{
    BoardView, RankRow, Shade, SquareView, DARK_SQUARE, FILE_LABELS, FRAME_HEIGHT, FRAME_WIDTH,
    LIGHT_SQUARE, PIECE_GLYPH,
};
