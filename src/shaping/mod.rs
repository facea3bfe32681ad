//! Text-shaping adapter boundary.
//!
//! Shaping (glyph layout, wrapping, measuring) is owned by an external engine.
//! The layout core only needs two things back: the bounding box of the shaped
//! block and a caret table describing every character's box. Requests are
//! asynchronous; each returns a [`ShapeTicket`] that the caller polls once per
//! frame until it resolves.
//!
//! # Coordinates
//!
//! Shaped geometry is relative to the text anchor, which is the top-left corner
//! of the block. Content space is y-up, so the first line spans
//! `[-line_height, 0]` and later lines sit below it.

use crate::model::BoundingBox;
use std::sync::mpsc::{self, Receiver, TryRecvError};

pub mod monospace;
pub mod queued;

pub use monospace::MonospaceShaper;
pub use queued::QueuedShaper;

/// How text that exceeds `max_width` is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapPolicy {
    /// Break between words; break inside a word only when it does not fit a
    /// line on its own.
    #[default]
    BreakWord,
    /// Never wrap; only explicit newlines start a line.
    NoWrap,
}

/// A request to shape one block of text.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRequest {
    /// Text to shape.
    pub text: String,
    /// Font family name, passed through to the engine.
    pub font: String,
    /// Font size in content units.
    pub font_size: f32,
    /// Height of one line in content units.
    pub line_height: f32,
    /// Maximum line width.
    pub max_width: f32,
    /// Wrapping policy.
    pub wrap: WrapPolicy,
}

/// Box of one character, relative to the text anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaretBox {
    /// Left edge.
    pub left: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
    /// Top edge.
    pub top: f32,
}

impl CaretBox {
    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

/// Flat caret table: four floats `left, right, bottom, top` per character.
///
/// # Examples
///
/// ```
/// use transcript_layout::shaping::CaretTable;
///
/// let table = CaretTable::from_flat(vec![0.0, 6.0, -10.0, 0.0, 6.0, 12.0, -10.0, 0.0]);
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.entry(1).map(|b| b.right), Some(12.0));
/// assert!(table.entry(2).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaretTable {
    values: Vec<f32>,
}

impl CaretTable {
    /// Wrap a flat table. Trailing floats that do not form a full entry are
    /// ignored.
    pub fn from_flat(mut values: Vec<f32>) -> Self {
        let whole = values.len() - values.len() % 4;
        values.truncate(whole);
        Self { values }
    }

    /// Build from boxes.
    pub fn from_boxes(boxes: impl IntoIterator<Item = CaretBox>) -> Self {
        let values = boxes
            .into_iter()
            .flat_map(|b| [b.left, b.right, b.bottom, b.top])
            .collect();
        Self { values }
    }

    /// Number of characters described.
    pub fn len(&self) -> usize {
        self.values.len() / 4
    }

    /// True if no character is described.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Box of character `index`.
    pub fn entry(&self, index: usize) -> Option<CaretBox> {
        let chunk = self.values.get(index * 4..index * 4 + 4)?;
        Some(CaretBox {
            left: chunk[0],
            right: chunk[1],
            bottom: chunk[2],
            top: chunk[3],
        })
    }

    /// Iterate boxes in character order.
    pub fn boxes(&self) -> impl Iterator<Item = CaretBox> + '_ {
        self.values.chunks_exact(4).map(|c| CaretBox {
            left: c[0],
            right: c[1],
            bottom: c[2],
            top: c[3],
        })
    }

    /// The raw flat table.
    pub fn as_flat(&self) -> &[f32] {
        &self.values
    }
}

/// Result of a completed shaping request.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedText {
    /// Extents of the shaped block.
    pub bounding_box: BoundingBox,
    /// Per-character boxes.
    pub caret_table: CaretTable,
}

/// State of a ticket after a poll.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapePoll {
    /// Still shaping. Not an error; poll again next frame.
    Pending,
    /// Shaping finished.
    Ready(ShapedText),
    /// The engine dropped the request. The caller may re-request.
    Lost,
}

/// Handle to one in-flight shaping request. Resolves exactly once.
#[derive(Debug)]
pub struct ShapeTicket {
    rx: Receiver<ShapedText>,
    resolved: bool,
}

/// Producer side of a [`ShapeTicket`], held by shaper implementations.
#[derive(Debug)]
pub struct ShapeResolver {
    tx: mpsc::Sender<ShapedText>,
}

impl ShapeResolver {
    /// Deliver the result. Returns `false` if the ticket was already dropped.
    pub fn resolve(self, shaped: ShapedText) -> bool {
        self.tx.send(shaped).is_ok()
    }
}

impl ShapeTicket {
    /// A ticket and the resolver that completes it.
    pub fn channel() -> (ShapeResolver, ShapeTicket) {
        let (tx, rx) = mpsc::channel();
        (
            ShapeResolver { tx },
            ShapeTicket {
                rx,
                resolved: false,
            },
        )
    }

    /// A ticket that is already resolved, for synchronous engines.
    pub fn ready(shaped: ShapedText) -> Self {
        let (resolver, ticket) = Self::channel();
        resolver.resolve(shaped);
        ticket
    }

    /// Check for a result without blocking.
    ///
    /// After `Ready` has been returned once, every later poll returns `Lost`.
    pub fn poll(&mut self) -> ShapePoll {
        if self.resolved {
            return ShapePoll::Lost;
        }
        match self.rx.try_recv() {
            Ok(shaped) => {
                self.resolved = true;
                ShapePoll::Ready(shaped)
            }
            Err(TryRecvError::Empty) => ShapePoll::Pending,
            Err(TryRecvError::Disconnected) => {
                self.resolved = true;
                ShapePoll::Lost
            }
        }
    }
}

/// A text-shaping engine.
pub trait TextShaper {
    /// Start shaping `request`. Must not block on the result.
    fn shape(&mut self, request: ShapeRequest) -> ShapeTicket;
}

impl<S: TextShaper + ?Sized> TextShaper for Box<S> {
    fn shape(&mut self, request: ShapeRequest) -> ShapeTicket {
        (**self).shape(request)
    }
}
