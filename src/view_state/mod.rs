//! View-state layer - layout, shaping state and placement of the transcript.
//!
//! Everything here is headless: components read their inputs from the
//! [`Store`](crate::state::Store), keep derived geometry in content space
//! (y grows upward) and publish the results back to the store for whatever
//! renders them.
//!
//! # Module Structure
//!
//! - `layout`: LayoutMetrics and the LayoutCalculator that keeps them current
//! - `message`: Message - one transcript entry with its shaped height and position
//! - `caret`: caret-table lookups and vertical caret movement
//! - `input`: InputDisplay - the text being typed and its caret
//! - `timer`: PaginationTimer - idle tick scheduling on an explicit clock
//! - `conversation`: Conversation - virtualized, paginated transcript

pub mod caret;
pub mod conversation;
pub mod input;
pub mod layout;
pub mod message;
pub mod timer;
