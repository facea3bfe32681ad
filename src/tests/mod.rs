//! Internal test modules - whitebox scenarios with crate access
//!
//! Scenarios here drive several components together through the shared
//! store, the way a frame loop would.
