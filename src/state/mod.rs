//! Shared reactive state.
//!
//! A flat, schemaless snapshot of named values plus a subscription registry.
//! Every layout consumer reads from and writes to the same [`Store`].

pub mod keys;
pub mod store;
pub mod value;

pub use store::{Patch, Store, SubscriptionId, SubscriptionMode, WeakStore};
pub use value::StateValue;
