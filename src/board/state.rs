//! Board state and payload decoding.
//!
//! Payloads are JSON objects of the form
//!
//! ```text
//! { "board": [[int; 8]; 8], "timestamp": number }
//! ```
//!
//! Both fields are optional and unknown fields are ignored. Decoding is
//! all-or-nothing: a payload with any malformed field changes nothing,
//! so the display keeps the last known good position.

use serde::Deserialize;
use serde_json::{Number, Value};

use super::view::BoardView;

/// Board edge length.
pub const BOARD_SIZE: usize = 8;

/// 8×8 occupancy grid. Row 0 is rank 8, column 0 is file A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Grid([[bool; BOARD_SIZE]; BOARD_SIZE]);

impl Grid {
    /// All squares empty.
    pub const EMPTY: Self = Self([[false; BOARD_SIZE]; BOARD_SIZE]);

    /// Build a grid from rows of occupancy flags.
    pub const fn from_rows(rows: [[bool; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self(rows)
    }

    /// Whether the square at (`row`, `col`) holds a piece.
    ///
    /// Out-of-range coordinates read as empty.
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        self.0
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Number of occupied squares.
    pub fn occupied_count(&self) -> usize {
        self.0.iter().flatten().filter(|&&occupied| occupied).count()
    }

    fn from_numbers(rows: &[[Number; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        let mut grid = Self::EMPTY;
        for (dst, src) in grid.0.iter_mut().zip(rows) {
            for (square, value) in dst.iter_mut().zip(src) {
                *square = is_nonzero(value);
            }
        }
        grid
    }
}

fn is_nonzero(value: &Number) -> bool {
    if let Some(v) = value.as_i64() {
        v != 0
    } else if let Some(v) = value.as_u64() {
        v != 0
    } else {
        value.as_f64().is_some_and(|v| v != 0.0)
    }
}

/// Why a payload was not applied.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Not JSON, or a field had the wrong shape or type.
    #[error("malformed board payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Valid JSON, but not an object.
    #[error("board payload is not a JSON object")]
    NotAnObject,
}

#[derive(Deserialize)]
struct WireMessage {
    #[serde(default)]
    board: Option<[[Number; BOARD_SIZE]; BOARD_SIZE]>,
    #[serde(default)]
    timestamp: Option<Number>,
}

/// A decoded, well-formed update. Absent fields leave state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardUpdate {
    /// Replacement grid, if the payload carried one.
    pub grid: Option<Grid>,
    /// Replacement timestamp, if the payload carried one.
    pub timestamp: Option<Number>,
}

impl BoardUpdate {
    /// Decode a raw payload.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(raw)?;
        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }
        let wire: WireMessage = serde_json::from_value(value)?;
        Ok(Self {
            grid: wire.board.as_ref().map(Grid::from_numbers),
            timestamp: wire.timestamp,
        })
    }

    /// Whether applying this update would change anything.
    pub const fn is_empty(&self) -> bool {
        self.grid.is_none() && self.timestamp.is_none()
    }
}

/// Latest known board and the timestamp of the update that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    grid: Grid,
    timestamp: Number,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// Empty board at timestamp 0.
    pub fn new() -> Self {
        Self {
            grid: Grid::EMPTY,
            timestamp: Number::from(0),
        }
    }

    /// Current grid.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Timestamp of the last applied update.
    pub const fn timestamp(&self) -> &Number {
        &self.timestamp
    }

    /// Decode `raw` and apply it.
    ///
    /// Returns `true` if a field was applied. Malformed payloads are
    /// dropped silently and leave the state exactly as it was.
    pub fn update_from_payload(&mut self, raw: &[u8]) -> bool {
        BoardUpdate::decode(raw).is_ok_and(|update| self.apply(update))
    }

    /// Apply a decoded update. Returns `true` if a field was applied.
    pub fn apply(&mut self, update: BoardUpdate) -> bool {
        let applied = !update.is_empty();
        if let Some(grid) = update.grid {
            self.grid = grid;
        }
        if let Some(timestamp) = update.timestamp {
            self.timestamp = timestamp;
        }
        applied
    }

    /// Build the displayable grid for the current state.
    pub fn render(&self) -> BoardView {
        BoardView::new(&self.grid, &self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(board: &str, timestamp: &str) -> Vec<u8> {
        format!(r#"{{"board":{board},"timestamp":{timestamp}}}"#).into_bytes()
    }

    fn empty_rows() -> Vec<Vec<i64>> {
        vec![vec![0; BOARD_SIZE]; BOARD_SIZE]
    }

    fn rows_json(rows: &[Vec<i64>]) -> String {
        serde_json::to_string(rows).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let state = BoardState::new();
        assert_eq!(state.grid(), &Grid::EMPTY);
        assert_eq!(state.timestamp(), &Number::from(0));
    }

    #[test]
    fn test_full_update_applies_grid_and_timestamp() {
        let mut rows = empty_rows();
        rows[0][0] = 1;
        rows[7][7] = 5;
        let mut state = BoardState::new();

        assert!(state.update_from_payload(&payload(&rows_json(&rows), "2")));
        assert!(state.grid().is_occupied(0, 0));
        assert!(state.grid().is_occupied(7, 7));
        assert_eq!(state.grid().occupied_count(), 2);
        assert_eq!(state.timestamp(), &Number::from(2));
    }

    #[test]
    fn test_board_replaces_whole_grid() {
        let mut state = BoardState::new();
        let mut first = empty_rows();
        first[3][3] = 1;
        let mut second = empty_rows();
        second[4][4] = 1;

        state.update_from_payload(&payload(&rows_json(&first), "1"));
        state.update_from_payload(&payload(&rows_json(&second), "2"));

        assert!(!state.grid().is_occupied(3, 3));
        assert!(state.grid().is_occupied(4, 4));
    }

    #[test]
    fn test_timestamp_only_keeps_grid() {
        let mut rows = empty_rows();
        rows[1][2] = 1;
        let mut state = BoardState::new();
        state.update_from_payload(&payload(&rows_json(&rows), "1"));
        let grid = *state.grid();

        assert!(state.update_from_payload(br#"{"timestamp": 99}"#));
        assert_eq!(state.grid(), &grid);
        assert_eq!(state.timestamp(), &Number::from(99));
    }

    #[test]
    fn test_board_only_keeps_timestamp() {
        let mut state = BoardState::new();
        state.update_from_payload(br#"{"timestamp": 7}"#);

        let mut rows = empty_rows();
        rows[6][1] = 1;
        let raw = format!(r#"{{"board":{}}}"#, rows_json(&rows));
        assert!(state.update_from_payload(raw.as_bytes()));
        assert!(state.grid().is_occupied(6, 1));
        assert_eq!(state.timestamp(), &Number::from(7));
    }

    #[test]
    fn test_float_and_negative_cells_count_as_occupied() {
        let mut rows: Vec<Vec<serde_json::Value>> =
            vec![vec![serde_json::json!(0); BOARD_SIZE]; BOARD_SIZE];
        rows[0][1] = serde_json::json!(0.5);
        rows[0][2] = serde_json::json!(-3);
        rows[0][3] = serde_json::json!(0.0);
        let raw = serde_json::json!({ "board": rows }).to_string();

        let mut state = BoardState::new();
        assert!(state.update_from_payload(raw.as_bytes()));
        assert!(state.grid().is_occupied(0, 1));
        assert!(state.grid().is_occupied(0, 2));
        assert!(!state.grid().is_occupied(0, 3));
    }

    #[test]
    fn test_fractional_timestamp_is_kept_verbatim() {
        let mut state = BoardState::new();
        assert!(state.update_from_payload(br#"{"timestamp": 12.5}"#));
        assert_eq!(state.timestamp().to_string(), "12.5");
    }

    #[test]
    fn test_malformed_payloads_leave_state_untouched() {
        let mut rows = empty_rows();
        rows[2][5] = 1;
        let mut state = BoardState::new();
        state.update_from_payload(&payload(&rows_json(&rows), "3"));
        let before = state.clone();
        let before_view = state.render();

        let seven_rows = rows_json(&rows[..7]);
        let mut short_row = rows.clone();
        short_row[4].pop();
        let mut long_row = rows.clone();
        long_row[4].push(0);
        let mut nine_rows = rows.clone();
        nine_rows.push(vec![0; BOARD_SIZE]);

        let cases: Vec<Vec<u8>> = vec![
            b"not json at all".to_vec(),
            b"".to_vec(),
            b"[1, 2, 3]".to_vec(),
            b"42".to_vec(),
            b"{\"board\": \"e4\"}".to_vec(),
            payload(&seven_rows, "4"),
            payload(&rows_json(&short_row), "4"),
            payload(&rows_json(&long_row), "4"),
            payload(&rows_json(&nine_rows), "4"),
            payload(r#"[["x",0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0],[0,0,0,0,0,0,0,0]]"#, "4"),
            payload(&rows_json(&empty_rows()), "\"late\""),
            vec![0xff, 0xfe, 0x00],
        ];

        for raw in cases {
            assert!(
                !state.update_from_payload(&raw),
                "payload should be rejected: {}",
                String::from_utf8_lossy(&raw)
            );
            assert_eq!(state, before);
            assert_eq!(state.render(), before_view);
        }
    }

    #[test]
    fn test_unknown_fields_only_is_not_applied() {
        let mut state = BoardState::new();
        assert!(!state.update_from_payload(br#"{"bogus": true}"#));
        assert_eq!(state, BoardState::new());
    }

    #[test]
    fn test_null_board_counts_as_absent() {
        let mut state = BoardState::new();
        assert!(state.update_from_payload(br#"{"board": null, "timestamp": 4}"#));
        assert_eq!(state.grid(), &Grid::EMPTY);
        assert_eq!(state.timestamp(), &Number::from(4));
    }

    #[test]
    fn test_same_payload_twice_is_idempotent() {
        let mut rows = empty_rows();
        rows[0][4] = 1;
        let raw = payload(&rows_json(&rows), "10");
        let mut state = BoardState::new();

        state.update_from_payload(&raw);
        let once = state.render();
        state.update_from_payload(&raw);
        assert_eq!(state.render(), once);
    }

    #[test]
    fn test_decode_error_kinds() {
        assert!(matches!(
            BoardUpdate::decode(b"[]"),
            Err(DecodeError::NotAnObject)
        ));
        assert!(matches!(
            BoardUpdate::decode(b"{"),
            Err(DecodeError::Malformed(_))
        ));
        assert!(BoardUpdate::decode(b"{}").is_ok_and(|u| u.is_empty()));
    }
}
