//! Cell: One character position of the board frame.
//!
//! A frame is small (a title, a header and eight ranks), so cells store
//! their glyph as a plain `char` instead of packed grapheme bytes. What
//! matters for flicker-free output is cheap equality, which the diff
//! engine relies on to skip unchanged squares.

use bitflags::bitflags;

/// True-color RGB representation.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rgb {
    /// Red channel (0-255)
    pub r: u8,
    /// Green channel (0-255)
    pub g: u8,
    /// Blue channel (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Black (0, 0, 0)
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Create from a 24-bit hex color (e.g., 0xF0D9B5).
    #[inline]
    pub const fn from_u32(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xFF) as u8,
            ((hex >> 8) & 0xFF) as u8,
            (hex & 0xFF) as u8,
        )
    }
}

impl std::fmt::Debug for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<u32> for Rgb {
    #[inline]
    fn from(hex: u32) -> Self {
        Self::from_u32(hex)
    }
}

/// A cell color: whatever the terminal uses by default, or a true color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Color {
    /// The terminal's own default (SGR 39/49).
    #[default]
    Default,
    /// Explicit 24-bit color.
    Rgb(Rgb),
}

bitflags! {
    /// Text style modifiers.
    ///
    /// ```
    /// use chessview::Modifiers;
    /// let style = Modifiers::BOLD;
    /// assert!(style.contains(Modifiers::BOLD));
    /// assert!(!Modifiers::empty().contains(Modifiers::BOLD));
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Bold text
        const BOLD = 0b0000_0001;
    }
}

impl std::fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Foreground, background and modifiers applied to a run of cells.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Style {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Text modifiers.
    pub modifiers: Modifiers,
}

impl Style {
    /// The terminal's default colors, no modifiers.
    pub const PLAIN: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        modifiers: Modifiers::empty(),
    };

    /// Builder: set foreground.
    #[must_use]
    pub const fn fg(mut self, fg: Rgb) -> Self {
        self.fg = Color::Rgb(fg);
        self
    }

    /// Builder: set background.
    #[must_use]
    pub const fn bg(mut self, bg: Rgb) -> Self {
        self.bg = Color::Rgb(bg);
        self
    }

    /// Builder: add bold.
    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.modifiers = self.modifiers.union(Modifiers::BOLD);
        self
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::PLAIN
    }
}

/// A single terminal cell.
///
/// Wide glyphs occupy their own cell plus a continuation cell to the
/// right; the continuation is never emitted by the diff engine.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Cell {
    glyph: char,
    /// Display width of the glyph (0 = continuation, 1 = normal, 2 = wide).
    width: u8,
    style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Cell {
    /// A blank cell in the plain style.
    pub const EMPTY: Self = Self {
        glyph: ' ',
        width: 1,
        style: Style::PLAIN,
    };

    /// Create a cell for `glyph` with the plain style.
    ///
    /// Zero-width and control characters are replaced by a space.
    pub fn new(glyph: char) -> Self {
        match unicode_width::UnicodeWidthChar::width(glyph) {
            Some(width @ 1..=2) => Self {
                glyph,
                width: u8::try_from(width).unwrap_or(1),
                style: Style::PLAIN,
            },
            _ => Self::EMPTY,
        }
    }

    /// Continuation cell placed after a wide glyph.
    pub const fn continuation(style: Style) -> Self {
        Self {
            glyph: '\0',
            width: 0,
            style,
        }
    }

    /// Set the style (builder pattern).
    #[must_use]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// The glyph stored in this cell.
    #[inline]
    pub const fn glyph(&self) -> char {
        self.glyph
    }

    /// Display width (0, 1 or 2).
    #[inline]
    pub const fn display_width(&self) -> u8 {
        self.width
    }

    /// Whether this cell only continues a wide glyph to its left.
    #[inline]
    pub const fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// The cell's style.
    #[inline]
    pub const fn style(&self) -> Style {
        self.style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_from_hex() {
        let rgb: Rgb = 0xF0D9B5.into();
        assert_eq!(rgb, Rgb::new(0xF0, 0xD9, 0xB5));
        assert_eq!(format!("{rgb:?}"), "#f0d9b5");
    }

    #[test]
    fn test_cell_pawn_is_single_width() {
        let cell = Cell::new('♟');
        assert_eq!(cell.glyph(), '♟');
        assert_eq!(cell.display_width(), 1);
    }

    #[test]
    fn test_cell_wide_glyph() {
        assert_eq!(Cell::new('日').display_width(), 2);
    }

    #[test]
    fn test_cell_zero_width_is_blank() {
        assert_eq!(Cell::new('\u{200B}'), Cell::EMPTY);
    }

    #[test]
    fn test_cell_equality_includes_style() {
        let a = Cell::new('A').with_style(Style::PLAIN.bold());
        let b = Cell::new('A').with_style(Style::PLAIN.bold());
        let c = Cell::new('A');
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_style_builder() {
        let light = Rgb::from_u32(0xF0D9B5);
        let style = Style::PLAIN.fg(Rgb::BLACK).bg(light).bold();
        assert_eq!(style.fg, Color::Rgb(Rgb::BLACK));
        assert_eq!(style.bg, Color::Rgb(light));
        assert!(style.modifiers.contains(Modifiers::BOLD));
    }

    #[test]
    fn test_plain_style_uses_terminal_defaults() {
        assert_eq!(Style::PLAIN.fg, Color::Default);
        assert_eq!(Style::PLAIN.bg, Color::Default);
        assert_eq!(Cell::EMPTY.style().bg, Color::Default);
    }
}
