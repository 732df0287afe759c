//! Displayable grid: the renderer-ready form of a [`BoardState`].
//!
//! [`BoardState`]: super::BoardState

use serde_json::Number;

use super::state::{Grid, BOARD_SIZE};
use crate::buffer::{Buffer, Rgb, Style};

/// Column labels, left to right.
pub const FILE_LABELS: [char; BOARD_SIZE] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];

/// Glyph drawn on occupied squares.
pub const PIECE_GLYPH: char = '♟';

/// Light square background.
pub const LIGHT_SQUARE: Rgb = Rgb::from_u32(0xF0D9B5);
/// Dark square background.
pub const DARK_SQUARE: Rgb = Rgb::from_u32(0xB58863);

/// Columns used by one square.
const SQUARE_WIDTH: u16 = 3;
/// Columns used by the rank label gutter.
const GUTTER_WIDTH: u16 = 3;

/// Width of a painted frame. Wide enough for the title with a large timestamp.
pub const FRAME_WIDTH: u16 = 48;
/// Height of a painted frame: title, file header and eight ranks.
pub const FRAME_HEIGHT: u16 = 2 + BOARD_SIZE as u16;

/// Square color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shade {
    /// Light square (`(row + col)` even).
    Light,
    /// Dark square.
    Dark,
}

impl Shade {
    /// Shade of the square at (`row`, `col`).
    pub const fn at(row: usize, col: usize) -> Self {
        if (row + col) % 2 == 0 {
            Self::Light
        } else {
            Self::Dark
        }
    }

    /// Background color for this shade.
    pub const fn color(self) -> Rgb {
        match self {
            Self::Light => LIGHT_SQUARE,
            Self::Dark => DARK_SQUARE,
        }
    }
}

/// One styled square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SquareView {
    /// Whether a piece stands here.
    pub occupied: bool,
    /// Square color.
    pub shade: Shade,
}

/// One labelled rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankRow {
    /// Rank label, `'8'` down to `'1'`.
    pub label: char,
    /// Squares from file A to file H.
    pub squares: [SquareView; BOARD_SIZE],
}

/// A full frame: title, file labels and eight ranks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardView {
    /// Title line, carrying the timestamp.
    pub title: String,
    /// File labels `A`-`H`.
    pub files: [char; BOARD_SIZE],
    /// Ranks, top (8) to bottom (1).
    pub ranks: [RankRow; BOARD_SIZE],
}

impl BoardView {
    /// Build the view for a grid and timestamp.
    pub fn new(grid: &Grid, timestamp: &Number) -> Self {
        let ranks = std::array::from_fn(|row| RankRow {
            label: rank_label(row),
            squares: std::array::from_fn(|col| SquareView {
                occupied: grid.is_occupied(row, col),
                shade: Shade::at(row, col),
            }),
        });
        Self {
            title: format!("Chess Board (timestamp: {timestamp})"),
            files: FILE_LABELS,
            ranks,
        }
    }

    /// Paint this view into `buffer`, top-left aligned.
    ///
    /// Anything outside the buffer is clipped.
    pub fn paint(&self, buffer: &mut Buffer) {
        let label = Style::PLAIN.bold();
        let board_width = GUTTER_WIDTH + SQUARE_WIDTH * BOARD_SIZE as u16;

        let title_width = u16::try_from(self.title.chars().count()).unwrap_or(u16::MAX);
        let title_x = board_width.saturating_sub(title_width) / 2;
        buffer.put_str(title_x, 0, &self.title, Style::PLAIN.bold());

        let mut x = GUTTER_WIDTH;
        for file in self.files {
            buffer.put_str(x + 1, 1, &file.to_string(), label);
            x += SQUARE_WIDTH;
        }

        let piece = Style::PLAIN.fg(Rgb::BLACK).bold();
        for (y, rank) in (2u16..).zip(&self.ranks) {
            buffer.put_str(1, y, &rank.label.to_string(), label);
            let mut x = GUTTER_WIDTH;
            for square in &rank.squares {
                let bg = square.shade.color();
                buffer.fill_span(x, y, SQUARE_WIDTH, Style::PLAIN.bg(bg));
                if square.occupied {
                    buffer.put_str(x + 1, y, &PIECE_GLYPH.to_string(), piece.bg(bg));
                }
                x += SQUARE_WIDTH;
            }
        }
    }
}

fn rank_label(row: usize) -> char {
    // Row 0 is rank 8.
    char::from_digit(u32::try_from(BOARD_SIZE - row).unwrap_or(0), 10).unwrap_or('?')
}
