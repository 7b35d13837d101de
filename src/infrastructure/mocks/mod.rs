//! Test helpers for observing the engine.
//!
//! The engine logs through `tracing`; [`CaptureLayer`] lets tests assert on
//! what it logged.

pub mod layer;

pub use layer::{CaptureLayer, CapturedEvent};
