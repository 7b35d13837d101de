//! Scoped capture of failures raised through doubles.
//!
//! Stubbed throws, real-method failures and usage errors detected during
//! interception all unwind with a typed payload. [`capture_failure`] turns
//! such an unwind back into a value a test can inspect.

use crate::domain::error::UsageError;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Run `f`, converting a panic into a [`Failure`].
///
/// # Example
/// ```
/// use test_doubles::capture_failure;
///
/// let failure = capture_failure(|| -> u32 { std::panic::panic_any(404_u16) }).unwrap_err();
/// assert_eq!(failure.downcast_ref::<u16>(), Some(&404));
///
/// assert_eq!(capture_failure(|| 7).ok(), Some(7));
/// ```
pub fn capture_failure<R, F>(f: F) -> Result<R, Failure>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| Failure { payload })
}

/// A captured panic payload.
pub struct Failure {
    payload: Box<dyn Any + Send>,
}

impl Failure {
    /// Check the payload type.
    pub fn is<E: Any>(&self) -> bool {
        self.payload.is::<E>()
    }

    /// Borrow the payload as `E`.
    pub fn downcast_ref<E: Any>(&self) -> Option<&E> {
        self.payload.downcast_ref::<E>()
    }

    /// Text of a `panic!` message payload.
    pub fn message(&self) -> Option<&str> {
        self.payload
            .downcast_ref::<&'static str>()
            .copied()
            .or_else(|| self.payload.downcast_ref::<String>().map(String::as_str))
    }

    /// The usage error, if the engine raised one.
    pub fn usage_error(&self) -> Option<&UsageError> {
        self.downcast_ref::<UsageError>()
    }

    /// Take the raw payload.
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload
    }

    /// Continue unwinding with the original payload.
    pub fn resume(self) -> ! {
        panic::resume_unwind(self.payload)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = self.message() {
            write!(f, "{}", message)
        } else if let Some(error) = self.usage_error() {
            write!(f, "{}", error)
        } else {
            write!(f, "panic with a non-text payload")
        }
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure").field("message", &self.to_string()).finish()
    }
}
