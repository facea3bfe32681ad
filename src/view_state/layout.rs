//! Layout calculator.
//!
//! Turns the viewport size and the ratio settings held in the store into the
//! absolute content-space geometry every other component positions against.
//! The calculation is a pure function ([`LayoutMetrics::compute`]); the
//! [`LayoutCalculator`] wires it to the store so any change to an input key
//! writes fresh outputs back in a single mutation.

use crate::model::Vec2;
use crate::state::{keys, Patch, Store, SubscriptionId};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Everything the layout depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutInputs {
    /// Viewport width.
    pub viewport_width: f32,
    /// Viewport height.
    pub viewport_height: f32,
    /// Padding on each side of the content box.
    pub padding: f32,
    /// Number of text lines that fit the content height.
    pub num_lines: f32,
    /// Gap between messages, in lines.
    pub num_lines_spacing: f32,
    /// Input message width as a fraction of the usable width.
    pub message_width_ratio: f32,
    /// Response offset as a fraction of the usable width.
    pub counterpart_offset_ratio: f32,
    /// Cursor width as a fraction of the line height.
    pub cursor_width_ratio: f32,
    /// Font line height relative to font size.
    pub font_line_height_ratio: f32,
}

impl LayoutInputs {
    /// Read all inputs from the store.
    ///
    /// Returns `None` if any input key is missing or not a number.
    pub fn from_store(store: &Store) -> Option<Self> {
        Some(Self {
            viewport_width: store.f32(keys::VIEWPORT_WIDTH)?,
            viewport_height: store.f32(keys::VIEWPORT_HEIGHT)?,
            padding: store.f32(keys::PADDING)?,
            num_lines: store.f32(keys::NUM_LINES)?,
            num_lines_spacing: store.f32(keys::NUM_LINES_SPACING)?,
            message_width_ratio: store.f32(keys::MESSAGE_WIDTH_RATIO)?,
            counterpart_offset_ratio: store.f32(keys::COUNTERPART_OFFSET_RATIO)?,
            cursor_width_ratio: store.f32(keys::CURSOR_WIDTH_RATIO)?,
            font_line_height_ratio: store.f32(keys::FONT_LINE_HEIGHT_RATIO)?,
        })
    }
}

/// Derived geometry, all in content-space units.
///
/// Indicator positions are x offsets relative to `left_bottom.x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    /// Lower-left corner of the viewport.
    pub origin: Vec2,
    /// Lower-left corner of the content box.
    pub left_bottom: Vec2,
    /// Content box width.
    pub content_width: f32,
    /// Content box height.
    pub content_height: f32,
    /// Height of one line of text.
    pub line_height: f32,
    /// Gap between stacked messages.
    pub spacing: f32,
    /// Maximum width of input messages.
    pub message_width: f32,
    /// Maximum width of response messages.
    pub counterpart_width: f32,
    /// Horizontal shift of response messages.
    pub counterpart_offset: f32,
    /// Input sender indicator x.
    pub message_indicator: f32,
    /// Loading indicator x.
    pub loa_indicator: f32,
    /// Response sender indicator x.
    pub counterpart_indicator: f32,
    /// Width of cursors and indicators.
    pub cursor_width: f32,
    /// Font size giving `line_height` at the configured line-height ratio.
    pub font_size: f32,
}

impl LayoutMetrics {
    /// Compute the layout. Pure and idempotent; nothing is clamped.
    ///
    /// # Examples
    ///
    /// ```
    /// use transcript_layout::view_state::layout::{LayoutInputs, LayoutMetrics};
    ///
    /// let metrics = LayoutMetrics::compute(&LayoutInputs {
    ///     viewport_width: 100.0,
    ///     viewport_height: 100.0,
    ///     padding: 10.0,
    ///     num_lines: 8.0,
    ///     num_lines_spacing: 0.5,
    ///     message_width_ratio: 1.0,
    ///     counterpart_offset_ratio: 0.25,
    ///     cursor_width_ratio: 0.5,
    ///     font_line_height_ratio: 1.25,
    /// });
    /// assert_eq!(metrics.content_height, 80.0);
    /// assert_eq!(metrics.line_height, 10.0);
    /// assert_eq!(metrics.spacing, 5.0);
    /// assert_eq!(metrics.message_width, 70.0);
    /// assert_eq!(metrics.font_size, 8.0);
    /// ```
    pub fn compute(inputs: &LayoutInputs) -> Self {
        let w = inputs.viewport_width;
        let h = inputs.viewport_height;
        let p = inputs.padding;

        let content_width = w - 2.0 * p;
        let content_height = h - 2.0 * p;
        let line_height = content_height / inputs.num_lines;
        let spacing = line_height * inputs.num_lines_spacing;
        let usable = content_width - 2.0 * spacing;
        let message_width = usable * inputs.message_width_ratio;
        let counterpart_offset = usable * inputs.counterpart_offset_ratio;
        let counterpart_width = (usable - counterpart_offset).min(message_width);

        let origin = Vec2::new(-w / 2.0, -h / 2.0);
        let left_bottom = origin.offset(p, p);

        Self {
            origin,
            left_bottom,
            content_width,
            content_height,
            line_height,
            spacing,
            message_width,
            counterpart_width,
            counterpart_offset,
            message_indicator: 0.0,
            loa_indicator: counterpart_offset - spacing,
            counterpart_indicator: spacing
                + counterpart_offset
                + counterpart_width
                + spacing * (1.0 - inputs.cursor_width_ratio),
            cursor_width: line_height * inputs.cursor_width_ratio,
            font_size: line_height / inputs.font_line_height_ratio,
        }
    }

    /// False when the metrics are degenerate and dependents should skip the
    /// frame. NaN (from zero lines) also counts as not ready.
    pub fn is_ready(&self) -> bool {
        self.line_height > 0.0 && self.content_width > 0.0
    }

    /// Read previously published metrics back from the store.
    pub fn from_store(store: &Store) -> Option<Self> {
        Some(Self {
            origin: store.vec2(keys::ORIGIN)?,
            left_bottom: store.vec2(keys::LEFT_BOTTOM)?,
            content_width: store.f32(keys::CONTENT_WIDTH)?,
            content_height: store.f32(keys::CONTENT_HEIGHT)?,
            line_height: store.f32(keys::LINE_HEIGHT)?,
            spacing: store.f32(keys::SPACING)?,
            message_width: store.f32(keys::MESSAGE_WIDTH)?,
            counterpart_width: store.f32(keys::COUNTERPART_WIDTH)?,
            counterpart_offset: store.f32(keys::COUNTERPART_OFFSET)?,
            message_indicator: store.f32(keys::MESSAGE_INDICATOR)?,
            loa_indicator: store.f32(keys::LOA_INDICATOR)?,
            counterpart_indicator: store.f32(keys::COUNTERPART_INDICATOR)?,
            cursor_width: store.f32(keys::CURSOR_WIDTH)?,
            font_size: store.f32(keys::FONT_SIZE)?,
        })
    }

    /// Metrics from the store, only if the last recompute marked them ready.
    pub fn ready_from_store(store: &Store) -> Option<Self> {
        if store.flag(keys::LAYOUT_READY) != Some(true) {
            return None;
        }
        Self::from_store(store)
    }

    /// All outputs, plus the readiness flag, as one patch.
    pub fn to_patch(&self) -> Patch {
        Patch::new()
            .with(keys::ORIGIN, self.origin)
            .with(keys::LEFT_BOTTOM, self.left_bottom)
            .with(keys::CONTENT_WIDTH, self.content_width)
            .with(keys::CONTENT_HEIGHT, self.content_height)
            .with(keys::LINE_HEIGHT, self.line_height)
            .with(keys::SPACING, self.spacing)
            .with(keys::MESSAGE_WIDTH, self.message_width)
            .with(keys::COUNTERPART_WIDTH, self.counterpart_width)
            .with(keys::COUNTERPART_OFFSET, self.counterpart_offset)
            .with(keys::MESSAGE_INDICATOR, self.message_indicator)
            .with(keys::LOA_INDICATOR, self.loa_indicator)
            .with(keys::COUNTERPART_INDICATOR, self.counterpart_indicator)
            .with(keys::CURSOR_WIDTH, self.cursor_width)
            .with(keys::FONT_SIZE, self.font_size)
            .with(keys::LAYOUT_READY, self.is_ready())
    }
}

/// Keeps the layout outputs in the store in sync with its inputs.
///
/// Recomputes once on attach and again whenever a mutation changes any of
/// [`keys::LAYOUT_INPUTS`]. A batch that writes several inputs (a resize
/// writes width and height together) publishes the outputs once.
#[derive(Debug)]
pub struct LayoutCalculator {
    store: Store,
    last_inputs: Rc<Cell<Option<LayoutInputs>>>,
    subscriptions: Vec<(&'static str, SubscriptionId)>,
}

impl LayoutCalculator {
    /// Compute the initial layout and subscribe to the input keys.
    pub fn attach(store: &Store) -> Self {
        let last_inputs = Rc::new(Cell::new(None));
        let subscriptions = keys::LAYOUT_INPUTS
            .iter()
            .map(|&key| {
                let weak = store.downgrade();
                let last = Rc::clone(&last_inputs);
                let id = store.subscribe(key, move |_| {
                    let Some(store) = weak.upgrade() else {
                        return;
                    };
                    // Later keys of the same batch see inputs already published.
                    let current = LayoutInputs::from_store(&store);
                    if current.is_some() && current == last.get() {
                        return;
                    }
                    recompute(&store, &last);
                });
                (key, id)
            })
            .collect();
        let calculator = Self {
            store: store.clone(),
            last_inputs,
            subscriptions,
        };
        calculator.recompute();
        calculator
    }

    /// Recompute from the current inputs and publish the result.
    pub fn recompute(&self) -> Option<LayoutMetrics> {
        recompute(&self.store, &self.last_inputs)
    }

    /// Write a new viewport size; the subscriptions publish the new layout.
    pub fn resize(&self, width: f32, height: f32) {
        debug!(width, height, "Viewport resized");
        self.store.mutate(
            Patch::new()
                .with(keys::VIEWPORT_WIDTH, width)
                .with(keys::VIEWPORT_HEIGHT, height),
        );
    }

    /// Stop tracking the inputs.
    pub fn detach(self) {
        for (key, id) in self.subscriptions {
            if let Err(e) = self.store.unsubscribe(key, id) {
                warn!(error = %e, "Layout subscription already removed");
            }
        }
    }
}

fn recompute(store: &Store, last: &Cell<Option<LayoutInputs>>) -> Option<LayoutMetrics> {
    let Some(inputs) = LayoutInputs::from_store(store) else {
        debug!("Layout inputs incomplete, skipping recompute");
        return None;
    };
    last.set(Some(inputs));
    let metrics = LayoutMetrics::compute(&inputs);
    if !metrics.is_ready() {
        debug!(
            line_height = metrics.line_height,
            content_width = metrics.content_width,
            "Degenerate layout metrics"
        );
    }
    store.mutate(metrics.to_patch());
    Some(metrics)
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
