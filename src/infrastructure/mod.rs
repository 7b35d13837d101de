//! Infrastructure layer - concrete adapters.
//!
//! This layer provides:
//! - Storage implementation (sharded maps)
//! - The generic `Double<T>` handle and the `double!` macro
//! - Failure capture for stubbed and real panics

pub mod double;
pub mod failure;
mod macros;
pub mod storage;

/// Test helpers for observing the engine's logs.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds.
///
/// To use these helpers in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// test-doubles = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
