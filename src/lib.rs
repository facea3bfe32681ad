//! transcript-layout
//!
//! Reactive layout and virtualization engine for a spatially laid-out
//! conversation transcript: a shared key/value store with subscriptions,
//! viewport-derived layout metrics, asynchronous text shaping, caret geometry
//! and a paginated, scrolling conversation that keeps only what is near the
//! screen in memory.
//!
//! The crate is headless. Rendering is left to whoever reads the geometry the
//! components publish to the [`state::Store`].

pub mod config;
pub mod logging;
pub mod model;
pub mod shaping;
pub mod source;
pub mod state;
pub mod view_state;

// Frame loop wiring
pub mod integration;

#[cfg(test)]
mod test_harness;

#[cfg(test)]
mod tests;
