//! Domain model: messages, lifecycle states, geometry and errors.

pub mod app_state;
pub mod error;
pub mod geometry;
pub mod identifiers;
pub mod message;

pub use app_state::{AppState, UnknownAppState};
pub use error::{AppError, CaretError, HistoryError, InvalidTrust, StoreError};
pub use geometry::{BoundingBox, Rect, Vec2};
pub use identifiers::MessageId;
pub use message::{MessageRecord, SenderType, Trust};
