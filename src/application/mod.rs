//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain types at runtime:
//! - Interceptor (the engine every call on a double passes through)
//! - Stub registry and invocation recorder (the interceptor's state)
//! - Stubbing and verification APIs
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod interceptor;
pub mod metrics;
pub mod ports;
pub mod recorder;
pub mod registry;
pub mod settings;
pub mod stubbing;
pub mod verification;
