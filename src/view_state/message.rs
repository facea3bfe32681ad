//! A single transcript message as a layout item.
//!
//! A message owns its record, its shaping ticket and the geometry derived from
//! both. Its height is unknown until shaping completes; the conversation only
//! stacks messages whose height is known.

use crate::model::{MessageId, MessageRecord, Rect, SenderType, Vec2};
use crate::shaping::{CaretTable, ShapePoll, ShapeRequest, ShapeTicket, TextShaper, WrapPolicy};
use crate::view_state::layout::LayoutMetrics;
use tracing::{debug, trace};

/// Shaping parameters a result was produced for. A change means the message
/// must be reshaped.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ShapeKey {
    max_width: f32,
    font_size: f32,
    line_height: f32,
}

/// A message positioned in content space.
#[derive(Debug)]
pub struct Message {
    record: MessageRecord,
    height: Option<f32>,
    position: Vec2,
    visible: bool,
    scrollable: bool,
    caret_table: Option<CaretTable>,
    ticket: Option<ShapeTicket>,
    requested: Option<ShapeKey>,
    shaped: Option<ShapeKey>,
}

impl Message {
    /// Wrap a record. Nothing is shaped yet.
    pub fn new(record: MessageRecord) -> Self {
        Self {
            record,
            height: None,
            position: Vec2::ZERO,
            visible: true,
            scrollable: true,
            caret_table: None,
            ticket: None,
            requested: None,
            shaped: None,
        }
    }

    /// The underlying record.
    pub fn record(&self) -> &MessageRecord {
        &self.record
    }

    /// Identity of the record.
    pub fn id(&self) -> MessageId {
        self.record.id()
    }

    /// Sender of the message.
    pub fn sender(&self) -> SenderType {
        self.record.sender
    }

    /// Shaped height, `None` until the first shaping result lands.
    pub fn height(&self) -> Option<f32> {
        self.height
    }

    /// Lower-left corner.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// False once the message has scrolled out of the content box.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the message moves with the conversation scroll.
    pub fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    /// Per-character boxes from the latest shaping result.
    pub fn caret_table(&self) -> Option<&CaretTable> {
        self.caret_table.as_ref()
    }

    /// True while a shaping request is outstanding.
    pub fn is_shaping(&self) -> bool {
        self.ticket.is_some()
    }

    /// Top-left corner, where shaped geometry is anchored.
    pub fn text_anchor(&self) -> Vec2 {
        self.position.offset(0.0, self.height.unwrap_or(0.0))
    }

    /// Maximum line width for this sender.
    pub fn max_width(&self, metrics: &LayoutMetrics) -> f32 {
        match self.record.sender {
            SenderType::Input => metrics.message_width,
            SenderType::Response => metrics.counterpart_width,
        }
    }

    /// Left edge for this sender.
    ///
    /// Responses sit one counterpart offset to the right; with `trust_weighted`
    /// they move back left in proportion to their trust.
    pub fn horizontal_position(&self, metrics: &LayoutMetrics, trust_weighted: bool) -> f32 {
        let base = metrics.left_bottom.x + metrics.spacing;
        match self.record.sender {
            SenderType::Input => base,
            SenderType::Response if trust_weighted => {
                base + metrics.counterpart_offset
                    - metrics.counterpart_offset * self.record.trust.get()
            }
            SenderType::Response => base + metrics.counterpart_offset,
        }
    }

    /// Apply [`Message::horizontal_position`].
    pub fn set_horizontal_position(&mut self, metrics: &LayoutMetrics, trust_weighted: bool) {
        self.position.x = self.horizontal_position(metrics, trust_weighted);
    }

    /// Set the bottom edge.
    pub fn set_vertical_position(&mut self, y: f32) {
        self.position.y = y;
    }

    /// Rectangle of the sender indicator drawn beside the message.
    ///
    /// `None` until the height is known.
    pub fn sender_indicator(&self, metrics: &LayoutMetrics) -> Option<Rect> {
        let height = self.height?;
        let x = match self.record.sender {
            SenderType::Input => metrics.left_bottom.x + metrics.message_indicator,
            SenderType::Response => metrics.left_bottom.x + metrics.counterpart_indicator,
        };
        Some(Rect::new(
            Vec2::new(x, self.position.y),
            metrics.cursor_width,
            height,
        ))
    }

    /// Full rectangle, `None` until the height is known.
    pub fn bounds(&self, metrics: &LayoutMetrics) -> Option<Rect> {
        Some(Rect::new(self.position, self.max_width(metrics), self.height?))
    }

    fn shape_key(&self, metrics: &LayoutMetrics) -> ShapeKey {
        ShapeKey {
            max_width: self.max_width(metrics),
            font_size: metrics.font_size,
            line_height: metrics.line_height,
        }
    }

    /// True if the message has never been shaped for the current metrics and
    /// no request for them is in flight.
    pub fn needs_shape(&self, metrics: &LayoutMetrics) -> bool {
        let key = self.shape_key(metrics);
        self.shaped != Some(key) && self.requested != Some(key)
    }

    /// Ask the engine to shape the text for the current metrics.
    ///
    /// A previous height is kept until the new result lands. An earlier
    /// outstanding ticket is dropped.
    pub fn request_shape(
        &mut self,
        shaper: &mut dyn TextShaper,
        metrics: &LayoutMetrics,
        font: &str,
    ) {
        let key = self.shape_key(metrics);
        trace!(id = %self.id(), max_width = key.max_width, "Requesting shape");
        self.ticket = Some(shaper.shape(ShapeRequest {
            text: self.record.text.clone(),
            font: font.to_string(),
            font_size: key.font_size,
            line_height: key.line_height,
            max_width: key.max_width,
            wrap: WrapPolicy::BreakWord,
        }));
        self.requested = Some(key);
    }

    /// Poll the outstanding ticket.
    ///
    /// Returns `true` if a result landed this call. An empty or zero-height
    /// result gives the message one line of height. A lost ticket is forgotten
    /// so the next [`Message::needs_shape`] asks again.
    pub fn poll_shape(&mut self, line_height: f32) -> bool {
        let Some(ticket) = self.ticket.as_mut() else {
            return false;
        };
        match ticket.poll() {
            ShapePoll::Pending => false,
            ShapePoll::Ready(shaped) => {
                let measured = shaped.bounding_box.height();
                let height = if measured > 0.0 { measured } else { line_height };
                self.height = Some(height);
                self.caret_table = Some(shaped.caret_table);
                self.shaped = self.requested.take();
                self.ticket = None;
                trace!(id = %self.id(), height, "Shape complete");
                true
            }
            ShapePoll::Lost => {
                debug!(id = %self.id(), "Shape request lost, will retry");
                self.ticket = None;
                self.requested = None;
                false
            }
        }
    }

    /// Recompute visibility against the content box.
    ///
    /// Off-screen means the top edge is below the content bottom or the bottom
    /// edge is above the content top. A message without a height is visible.
    pub fn update_visibility(&mut self, metrics: &LayoutMetrics) -> bool {
        let Some(height) = self.height else {
            self.visible = true;
            return true;
        };
        let bottom = metrics.left_bottom.y;
        let top = bottom + metrics.content_height;
        self.visible = !(self.position.y + height < bottom || self.position.y > top);
        self.visible
    }
}
