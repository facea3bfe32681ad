//! Caret resolution.
//!
//! Maps a character index to a content-space point using the caret table of a
//! shaped text block, and moves the index one visual line up or down. There is
//! no line-break API: rows are recovered from the table geometry itself.

use crate::model::{CaretError, Vec2};
use crate::shaping::{CaretBox, CaretTable};

/// Vertical caret movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// One visual line up.
    Up,
    /// One visual line down.
    Down,
}

impl Direction {
    /// Parse the key names published under `specialKeyPressed`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Direction::Up),
            "ArrowDown" => Some(Direction::Down),
            _ => None,
        }
    }
}

/// Content-space point of caret position `char_index`.
///
/// Position 0 is the anchor itself. Position `i > 0` sits at the top-right of
/// character `i - 1`. Positions past the end clamp to the last character.
///
/// # Errors
///
/// Returns [`CaretError::NotReady`] when `table` is `None` (shaping pending).
/// Callers keep their previous point.
///
/// # Examples
///
/// ```
/// use transcript_layout::model::Vec2;
/// use transcript_layout::shaping::CaretTable;
/// use transcript_layout::view_state::caret::resolve;
///
/// let table = CaretTable::from_flat(vec![0.0, 6.0, -10.0, 0.0, 6.0, 12.0, -10.0, 0.0]);
/// let anchor = Vec2::new(100.0, 50.0);
/// assert_eq!(resolve(0, Some(&table), anchor), Ok(anchor));
/// assert_eq!(resolve(2, Some(&table), anchor), Ok(Vec2::new(112.0, 50.0)));
/// assert_eq!(resolve(9, Some(&table), anchor), Ok(Vec2::new(112.0, 50.0)));
/// ```
pub fn resolve(
    char_index: usize,
    table: Option<&CaretTable>,
    anchor: Vec2,
) -> Result<Vec2, CaretError> {
    let table = table.ok_or(CaretError::NotReady)?;
    if char_index == 0 || table.is_empty() {
        return Ok(anchor);
    }
    let index = char_index.min(table.len()) - 1;
    match table.entry(index) {
        Some(b) => Ok(anchor.offset(b.right, b.top)),
        None => Ok(anchor),
    }
}

/// A visual row recovered from the table.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Row {
    bottom: f32,
    top: f32,
}

impl Row {
    fn of(b: &CaretBox) -> Self {
        Self {
            bottom: b.bottom,
            top: b.top,
        }
    }

    fn contains(&self, y: f32) -> bool {
        y >= self.bottom && y <= self.top
    }
}

/// Row and x of caret position `char_index`, relative to the anchor.
fn locate(char_index: usize, table: &CaretTable) -> Option<(Row, f32)> {
    if char_index == 0 {
        let first = table.entry(0)?;
        return Some((Row::of(&first), first.left));
    }
    let b = table.entry(char_index.min(table.len()) - 1)?;
    Some((Row::of(&b), b.right))
}

/// Caret position one visual line above or below `char_index`.
///
/// Probes the middle of the neighbouring row band and picks, among the
/// boundaries of the characters on that row, the one whose x is closest to the
/// current x (ties go to the lower index). With no row in that direction, or no
/// table, the index is returned unchanged.
pub fn move_vertically(
    direction: Direction,
    char_index: usize,
    table: Option<&CaretTable>,
) -> usize {
    let Some(table) = table else {
        return char_index;
    };
    let Some((row, x)) = locate(char_index, table) else {
        return char_index;
    };
    let height = row.top - row.bottom;
    let probe = match direction {
        Direction::Up => row.top + height / 2.0,
        Direction::Down => row.bottom - height / 2.0,
    };

    let mut best: Option<(usize, f32)> = None;
    for (i, b) in table.boxes().enumerate() {
        if !Row::of(&b).contains(probe) {
            continue;
        }
        for (candidate, cx) in [(i, b.left), (i + 1, b.right)] {
            let distance = (cx - x).abs();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((candidate, distance));
            }
        }
    }
    best.map_or(char_index, |(index, _)| index)
}

#[cfg(test)]
#[path = "caret_tests.rs"]
mod tests;
