//! Reference monospace shaper.
//!
//! Lays text out on a fixed-advance grid using terminal column widths from
//! `unicode-width`. It resolves every ticket immediately, which makes it the
//! shaper of choice for the headless runner and deterministic tests.

use super::{CaretBox, CaretTable, ShapeRequest, ShapeTicket, ShapedText, TextShaper, WrapPolicy};
use crate::model::BoundingBox;
use unicode_width::UnicodeWidthChar;

/// Advance of one column relative to the font size.
pub const DEFAULT_ADVANCE_RATIO: f32 = 0.6;

/// Shapes text on a monospace grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceShaper {
    advance_ratio: f32,
}

impl Default for MonospaceShaper {
    fn default() -> Self {
        Self {
            advance_ratio: DEFAULT_ADVANCE_RATIO,
        }
    }
}

impl MonospaceShaper {
    /// Shaper with a custom column advance (fraction of the font size).
    pub fn with_advance_ratio(advance_ratio: f32) -> Self {
        Self { advance_ratio }
    }

    /// Shape synchronously.
    ///
    /// # Examples
    ///
    /// ```
    /// use transcript_layout::shaping::{MonospaceShaper, ShapeRequest, WrapPolicy};
    ///
    /// let shaped = MonospaceShaper::default().layout(&ShapeRequest {
    ///     text: "hi".to_string(),
    ///     font: "mono".to_string(),
    ///     font_size: 10.0,
    ///     line_height: 12.0,
    ///     max_width: 100.0,
    ///     wrap: WrapPolicy::BreakWord,
    /// });
    /// assert_eq!(shaped.bounding_box.width(), 12.0);
    /// assert_eq!(shaped.bounding_box.height(), 12.0);
    /// ```
    pub fn layout(&self, request: &ShapeRequest) -> ShapedText {
        let advance = request.font_size * self.advance_ratio;
        let widths: Vec<f32> = request
            .text
            .chars()
            .map(|c| c.width().unwrap_or(0) as f32 * advance)
            .collect();
        let chars: Vec<char> = request.text.chars().collect();
        let lines = break_lines(&chars, &widths, request.max_width, request.wrap);

        let mut boxes = Vec::with_capacity(chars.len());
        let mut max_x: f32 = 0.0;
        for (row, line) in lines.iter().enumerate() {
            let top = 0.0 - row as f32 * request.line_height;
            let bottom = top - request.line_height;
            let mut x = 0.0;
            for &i in line {
                let right = x + widths[i];
                boxes.push(CaretBox {
                    left: x,
                    right,
                    bottom,
                    top,
                });
                x = right;
            }
            max_x = max_x.max(x);
        }

        let rows = if chars.is_empty() { 0 } else { lines.len() };
        ShapedText {
            bounding_box: BoundingBox::new(
                0.0,
                max_x,
                0.0 - rows as f32 * request.line_height,
                0.0,
            ),
            caret_table: CaretTable::from_boxes(boxes),
        }
    }
}

impl TextShaper for MonospaceShaper {
    fn shape(&mut self, request: ShapeRequest) -> ShapeTicket {
        ShapeTicket::ready(self.layout(&request))
    }
}

/// Split character indices into lines. Every index appears exactly once, in
/// order; a newline stays on the line it ends.
fn break_lines(
    chars: &[char],
    widths: &[f32],
    max_width: f32,
    wrap: WrapPolicy,
) -> Vec<Vec<usize>> {
    let mut lines: Vec<Vec<usize>> = vec![Vec::new()];
    let mut x = 0.0;

    for (i, &c) in chars.iter().enumerate() {
        let w = widths[i];
        let overflows = wrap == WrapPolicy::BreakWord
            && !c.is_whitespace()
            && x + w > max_width
            && lines.last().is_some_and(|line| !line.is_empty());

        if overflows {
            if let Some(current) = lines.pop() {
                // Prefer carrying the partial word down to the next line.
                let split = current
                    .iter()
                    .rposition(|&j| chars[j].is_whitespace())
                    .map_or(current.len(), |pos| pos + 1);
                let (kept, carried) = current.split_at(split);
                x = carried.iter().map(|&j| widths[j]).sum();
                lines.push(kept.to_vec());
                lines.push(carried.to_vec());
            }
        }

        if let Some(line) = lines.last_mut() {
            line.push(i);
        }
        x += w;

        if c == '\n' {
            lines.push(Vec::new());
            x = 0.0;
        }
    }

    if lines.len() > 1 && lines.last().is_some_and(Vec::is_empty) {
        lines.pop();
    }
    lines
}
