//! # test-doubles
//!
//! Mocks, spies, stubbing and call verification for trait-based Rust code.
//!
//! A double stands in for an implementation of a trait. Every call on it is
//! routed through an interceptor that records the call, answers it from a stub
//! rule when one matches, and otherwise falls back to the method's default
//! value (mocks) or to a wrapped real instance (spies).
//!
//! ## Quick Start
//!
//! ```rust
//! use test_doubles::{capture_failure, double, verify, verify_times, when, Times};
//!
//! pub trait List {
//!     fn add(&self, item: String);
//!     fn get(&self, index: usize) -> Option<String>;
//!     fn size(&self) -> usize;
//! }
//!
//! double! {
//!     pub struct ListDouble for List {
//!         fn add(&self, item: String) => ();
//!         fn get(&self, index: usize) -> Option<String> => None;
//!         fn size(&self) -> usize => 0;
//!     }
//! }
//!
//! let list = ListDouble::mock();
//!
//! // Unstubbed calls return the declared default
//! assert_eq!(list.get(999), None);
//!
//! // Stub a call
//! when(&list, |l| l.get(0)).unwrap().then_return(Some("first".to_string()));
//! assert_eq!(list.get(0), Some("first".to_string()));
//!
//! // Stub a failure
//! when(&list, |l| l.get(1)).unwrap().then_throw("broken".to_string());
//! let failure = capture_failure(|| list.get(1)).unwrap_err();
//! assert_eq!(failure.message(), Some("broken"));
//!
//! // Verify interactions
//! list.add("one".to_string());
//! assert!(verify(&list, |l| l.add("one".to_string())).is_ok());
//! assert!(verify_times(&list, Times::never(), |l| l.size()).is_ok());
//! ```
//!
//! ## Mocks and spies
//!
//! - **Mock**: no real backing. Unstubbed calls return the default written
//!   next to each method in [`double!`].
//! - **Spy**: wraps a real instance. Unstubbed calls run the real method and
//!   return its result, failures included.
//!
//! ## Stubbing styles
//!
//! - [`when`] runs the probe call normally, then attaches actions to it.
//!   On a spy this runs the real method, which fails if the real method
//!   cannot handle the probed arguments.
//! - [`do_return`], [`do_throw`], [`do_answer`], [`do_nothing`] and
//!   [`do_call_real_method`] build a [`Stubber`] whose `when` captures the
//!   probe call without executing it. Prefer this form on spies.
//! - [`Stubber::for_call`] registers against an explicit [`CallMatcher`],
//!   with [`matchers::any`] and [`matchers::arg_that`] for loose matching.
//!
//! Actions chain: `then_return(a).then_return(b)` answers `a` once, then `b`
//! forever.
//!
//! ## Verification
//!
//! [`verify`], [`verify_times`], [`verify_call`] and [`verify_no_interactions`]
//! read the invocation record without changing it. [`InOrder`] checks ordering
//! across doubles. Failures come back as [`VerifyError`] values listing the
//! recorded calls.
//!
//! ## Failures
//!
//! Stubbed throws and failing real methods unwind with a typed panic payload.
//! [`capture_failure`] converts the unwind into a [`Failure`] so a test can
//! assert on it. API misuse detected while a call is being answered (for
//! example a stub of the wrong type) unwinds with a [`UsageError`] payload;
//! misuse detected during setup is returned as `Err`.
//!
//! ## Observability
//!
//! The engine logs through `tracing`: `trace` per intercepted call, `debug`
//! per registered stub, `warn` per failed verification. Per-double counters
//! are available through [`Double::metrics`].

// Domain layer - pure types
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - concrete adapters
pub mod infrastructure;

/// Argument matchers for [`CallMatcher::with`].
pub mod matchers {
    pub use crate::domain::matcher::{any, arg_that, eq};
}

// Re-export commonly used types for convenience
pub use domain::{
    action::StubAction,
    error::{Mismatch, RecordedCall, UsageError, VerificationFailure, VerifyError},
    invocation::{ArgValue, Invocation, MethodName},
    kind::{DefaultAnswer, DoubleKind},
    matcher::{ArgMatcher, CallMatcher},
    signature::CallSignature,
    times::Times,
};

pub use application::{
    interceptor::Interceptor,
    metrics::{Metrics, MetricsSnapshot},
    ports::{AsDouble, Storage},
    registry::{RuleId, StubRegistry, StubRule, StubSet},
    settings::{BuildError, DoubleSettings, DoubleSettingsBuilder},
    stubbing::{
        do_answer, do_call_real_method, do_nothing, do_return, do_throw, when, OngoingStubbing,
        Stubber,
    },
    verification::{verify, verify_call, verify_no_interactions, verify_times, InOrder},
};

pub use infrastructure::{
    double::{Double, StubStorage},
    failure::{capture_failure, Failure},
    storage::ShardedStorage,
};
