//! Domain layer - pure types with no knowledge of how doubles are wired.
//!
//! This layer contains the core concepts of the test double engine:
//! - Recorded invocations and type-erased argument values
//! - Call signatures for grouping identical calls
//! - Argument and call matchers
//! - Stub actions and expected call counts
//! - Usage and verification errors
//!
//! All types in this layer are pure and easily testable.

pub mod action;
pub mod error;
pub mod invocation;
pub mod kind;
pub mod matcher;
pub mod signature;
pub mod times;
