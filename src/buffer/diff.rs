//! Diffing Engine: Generate minimal ANSI sequences between two frames.
//!
//! This is what keeps the live board from flickering:
//! 1. Compare the visible frame with the next one
//! 2. Emit cursor-addressed output for changed cells only
//! 3. Skip cursor moves when writing adjacent cells
//! 4. Track SGR state to avoid redundant color sequences
//!
//! Output is accumulated in a single `Vec<u8>` so the renderer can flush
//! it with one write.

use super::{Buffer, Cell, Color, Modifiers};
use std::io::Write;

/// Terminal state as last left by emitted output.
#[derive(Debug, Clone)]
pub struct DiffState {
    cursor_x: u16,
    cursor_y: u16,
    fg: Option<Color>,
    bg: Option<Color>,
    modifiers: Option<Modifiers>,
}

impl Default for DiffState {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffState {
    /// State with an unknown cursor position and unknown attributes.
    pub const fn new() -> Self {
        Self {
            cursor_x: u16::MAX,
            cursor_y: u16::MAX,
            fg: None,
            bg: None,
            modifiers: None,
        }
    }

    /// Forget everything (after a full redraw or foreign output).
    pub const fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Counters from one diff pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Number of cells that differed.
    pub cells_changed: usize,
    /// Number of cursor move sequences emitted.
    pub cursor_moves: usize,
    /// Number of color sequences emitted.
    pub color_changes: usize,
}

/// Render the difference between `current` and `next` into `output`.
///
/// Both buffers must have the same dimensions.
pub fn render_diff(
    current: &Buffer,
    next: &Buffer,
    output: &mut Vec<u8>,
    state: &mut DiffState,
) -> DiffResult {
    debug_assert_eq!(current.width(), next.width());
    debug_assert_eq!(current.height(), next.height());

    let mut result = DiffResult::default();
    let width = usize::from(next.width());

    for (idx, (old, new)) in current.cells().iter().zip(next.cells()).enumerate() {
        if old == new || new.is_continuation() {
            continue;
        }
        // Both values fit in u16 because the buffer dimensions do.
        let x = u16::try_from(idx % width).unwrap_or(u16::MAX);
        let y = u16::try_from(idx / width).unwrap_or(u16::MAX);

        result.cells_changed += 1;

        if state.cursor_x != x || state.cursor_y != y {
            emit_cursor_move(output, x, y);
            state.cursor_x = x;
            state.cursor_y = y;
            result.cursor_moves += 1;
        }

        emit_style(output, new, state, &mut result);
        emit_glyph(output, new);

        state.cursor_x = state
            .cursor_x
            .saturating_add(u16::from(new.display_width().max(1)));
    }

    result
}

/// Generate a full repaint of `buffer` (no diffing).
///
/// Every row is cursor-addressed so the frame is drawn in place and never
/// scrolls the terminal.
pub fn render_full(buffer: &Buffer, output: &mut Vec<u8>, state: &mut DiffState) {
    state.reset();
    output.extend_from_slice(b"\x1b[?25l\x1b[0m");

    let mut result = DiffResult::default();
    for y in 0..buffer.height() {
        emit_cursor_move(output, 0, y);
        for x in 0..buffer.width() {
            let Some(cell) = buffer.get(x, y) else {
                continue;
            };
            if cell.is_continuation() {
                continue;
            }
            emit_style(output, cell, state, &mut result);
            emit_glyph(output, cell);
        }
        state.cursor_x = buffer.width();
        state.cursor_y = y;
    }
}

/// Emit whatever SGR sequences are needed to draw `cell`.
fn emit_style(output: &mut Vec<u8>, cell: &Cell, state: &mut DiffState, result: &mut DiffResult) {
    let style = cell.style();

    // Removing a modifier needs a full reset, which also drops colors.
    let current_mods = state.modifiers.unwrap_or(Modifiers::empty());
    if !current_mods.difference(style.modifiers).is_empty() {
        output.extend_from_slice(b"\x1b[0m");
        state.fg = None;
        state.bg = None;
        state.modifiers = None;
    }

    if state.fg != Some(style.fg) {
        match style.fg {
            Color::Default => output.extend_from_slice(b"\x1b[39m"),
            Color::Rgb(c) => {
                let _ = write!(output, "\x1b[38;2;{};{};{}m", c.r, c.g, c.b);
            }
        }
        state.fg = Some(style.fg);
        result.color_changes += 1;
    }
    if state.bg != Some(style.bg) {
        match style.bg {
            Color::Default => output.extend_from_slice(b"\x1b[49m"),
            Color::Rgb(c) => {
                let _ = write!(output, "\x1b[48;2;{};{};{}m", c.r, c.g, c.b);
            }
        }
        state.bg = Some(style.bg);
        result.color_changes += 1;
    }

    if state.modifiers != Some(style.modifiers) {
        let added = style
            .modifiers
            .difference(state.modifiers.unwrap_or(Modifiers::empty()));
        if added.contains(Modifiers::BOLD) {
            output.extend_from_slice(b"\x1b[1m");
        }
        state.modifiers = Some(style.modifiers);
    }
}

/// Emit a cursor move, using the short forms where possible.
#[inline]
fn emit_cursor_move(output: &mut Vec<u8>, x: u16, y: u16) {
    let row = y + 1;
    let col = x + 1;

    if row == 1 && col == 1 {
        output.extend_from_slice(b"\x1b[H");
    } else if col == 1 {
        let _ = write!(output, "\x1b[{row}H");
    } else {
        let _ = write!(output, "\x1b[{row};{col}H");
    }
}

#[inline]
fn emit_glyph(output: &mut Vec<u8>, cell: &Cell) {
    let mut utf8 = [0u8; 4];
    output.extend_from_slice(cell.glyph().encode_utf8(&mut utf8).as_bytes());
}
