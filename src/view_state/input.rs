//! The live input block and its caret.
//!
//! The input sits at the bottom of the content box in the input column. It
//! reshapes whenever `input` changes, publishes its height so the transcript
//! stacks above it, and publishes the resolved caret point for the renderer.
//! Arrow keys published under `specialKeyPressed` move `cursorPos` one visual
//! line at a time.

use crate::model::Vec2;
use crate::shaping::{CaretTable, ShapePoll, ShapeRequest, ShapeTicket, TextShaper, WrapPolicy};
use crate::state::{keys, Patch, Store, SubscriptionId};
use crate::view_state::caret::{self, Direction};
use crate::view_state::layout::LayoutMetrics;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, trace};

/// Default font when the store does not name one.
pub const DEFAULT_FONT: &str = "monospace";

/// Shaping parameters the current table was requested with.
#[derive(Debug, Clone, PartialEq)]
struct Shaped {
    text: String,
    max_width: f32,
    font_size: f32,
    line_height: f32,
}

/// Owner of the active caret.
#[derive(Debug)]
pub struct InputDisplay {
    store: Store,
    subscriptions: Vec<(&'static str, SubscriptionId)>,
    dirty: Rc<Cell<bool>>,
    caret_table: Rc<RefCell<Option<CaretTable>>>,
    ticket: Option<ShapeTicket>,
    requested: Option<Shaped>,
    current: Option<Shaped>,
    height: Option<f32>,
    caret: Option<Vec2>,
}

impl InputDisplay {
    /// Subscribe to the input keys.
    pub fn attach(store: &Store) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let caret_table: Rc<RefCell<Option<CaretTable>>> = Rc::new(RefCell::new(None));
        let mut subscriptions = Vec::new();

        for key in [keys::INPUT, keys::CURSOR_POS, keys::MAX_INPUT_LENGTH] {
            let flag = Rc::clone(&dirty);
            let id = store.subscribe(key, move |_| flag.set(true));
            subscriptions.push((key, id));
        }

        let weak = store.downgrade();
        let table = Rc::clone(&caret_table);
        let id = store.subscribe(keys::SPECIAL_KEY_PRESSED, move |value| {
            let Some(direction) = value.as_text().and_then(Direction::from_key) else {
                return;
            };
            let Some(store) = weak.upgrade() else {
                return;
            };
            let cursor = cursor_pos(&store);
            let moved = caret::move_vertically(direction, cursor, table.borrow().as_ref());
            if moved != cursor {
                trace!(?direction, from = cursor, to = moved, "Caret moved");
                store.set(keys::CURSOR_POS, moved);
            }
        });
        subscriptions.push((keys::SPECIAL_KEY_PRESSED, id));

        Self {
            store: store.clone(),
            subscriptions,
            dirty,
            caret_table,
            ticket: None,
            requested: None,
            current: None,
            height: None,
            caret: None,
        }
    }

    /// Shaped height of the input, once known.
    pub fn height(&self) -> Option<f32> {
        self.height
    }

    /// Last resolved caret point.
    pub fn caret(&self) -> Option<Vec2> {
        self.caret
    }

    /// Text as accepted by the input (truncated to `maxInputLength`).
    pub fn text(&self) -> String {
        let text = self.store.text(keys::INPUT).unwrap_or_default();
        match self.store.number(keys::MAX_INPUT_LENGTH) {
            Some(max) if max >= 0.0 => text.chars().take(max as usize).collect(),
            _ => text,
        }
    }

    /// Per-frame update: reshape if needed, poll shaping, publish height and
    /// caret. Skips the frame while the layout is not ready.
    pub fn update(&mut self, shaper: &mut dyn TextShaper) {
        let Some(metrics) = LayoutMetrics::ready_from_store(&self.store) else {
            return;
        };

        let wanted = Shaped {
            text: self.text(),
            max_width: metrics.message_width,
            font_size: metrics.font_size,
            line_height: metrics.line_height,
        };
        let stale =
            self.requested.as_ref() != Some(&wanted) && self.current.as_ref() != Some(&wanted);
        if stale {
            let font = self
                .store
                .text(keys::FONT)
                .unwrap_or_else(|| DEFAULT_FONT.to_string());
            trace!(chars = wanted.text.chars().count(), "Reshaping input");
            self.ticket = Some(shaper.shape(ShapeRequest {
                text: wanted.text.clone(),
                font,
                font_size: wanted.font_size,
                line_height: wanted.line_height,
                max_width: wanted.max_width,
                wrap: WrapPolicy::BreakWord,
            }));
            self.requested = Some(wanted);
        }

        let mut patch = Patch::new();
        if self.poll(metrics.line_height) {
            if let Some(height) = self.height {
                patch.set(keys::INPUT_HEIGHT, height);
            }
            self.dirty.set(true);
        }

        if self.dirty.replace(false) {
            let anchor = self.anchor(&metrics);
            let resolved = caret::resolve(
                cursor_pos(&self.store),
                self.caret_table.borrow().as_ref(),
                anchor,
            );
            match resolved {
                Ok(point) if Some(point) != self.caret => {
                    self.caret = Some(point);
                    patch.set(keys::CARET_POSITION, point);
                }
                Ok(_) => {}
                // Keep the previous point until shaping lands.
                Err(_) => self.dirty.set(true),
            }
        }

        self.store.mutate(patch);
    }

    fn poll(&mut self, line_height: f32) -> bool {
        let Some(ticket) = self.ticket.as_mut() else {
            return false;
        };
        match ticket.poll() {
            ShapePoll::Pending => false,
            ShapePoll::Ready(shaped) => {
                let measured = shaped.bounding_box.height();
                self.height = Some(if measured > 0.0 { measured } else { line_height });
                *self.caret_table.borrow_mut() = Some(shaped.caret_table);
                self.current = self.requested.take();
                self.ticket = None;
                true
            }
            ShapePoll::Lost => {
                debug!("Input shape request lost, will retry");
                self.ticket = None;
                self.requested = None;
                false
            }
        }
    }

    /// Top-left corner of the input text.
    fn anchor(&self, metrics: &LayoutMetrics) -> Vec2 {
        metrics
            .left_bottom
            .offset(metrics.spacing, self.height.unwrap_or(metrics.line_height))
    }

    /// Stop listening to the store.
    pub fn detach(self) {
        for (key, id) in self.subscriptions {
            if let Err(e) = self.store.unsubscribe(key, id) {
                debug!(error = %e, "Input subscription already removed");
            }
        }
    }
}

fn cursor_pos(store: &Store) -> usize {
    store
        .number(keys::CURSOR_POS)
        .filter(|n| *n >= 0.0)
        .map_or(0, |n| n as usize)
}
