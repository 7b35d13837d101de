//! Errors raised by stubbing and verification.

use crate::domain::times::Times;
use std::fmt;

/// The double API was used incorrectly.
///
/// Returned from setup calls (`when`, `do_*`, `verify*`). When detected during
/// interception, where the method signature leaves no error channel, it is
/// raised as a panic carrying this value as its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// A probe closure returned without calling the double
    NoInvocationCaptured {
        /// Name of the double
        double: String,
    },
    /// A stubbing or verification was started while another was pending
    OperationPending {
        /// Name of the double
        double: String,
    },
    /// A stub produces a type the method cannot return
    ReturnTypeMismatch {
        /// The stubbed call
        call: String,
        /// Result type declared by the method
        expected: &'static str,
        /// Type produced by the stub
        found: &'static str,
    },
    /// Real-method delegation was requested on a mock
    RealMethodOnMock {
        /// The offending call
        call: String,
    },
    /// A strict double received a call with no matching stub
    UnstubbedCall {
        /// Name of the double
        double: String,
        /// The offending call
        call: String,
    },
    /// Verification was requested on a double that records nothing
    StubOnlyVerification {
        /// Name of the double
        double: String,
    },
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::NoInvocationCaptured { double } => write!(
                f,
                "no call on {} was made inside the probe; the probe must invoke exactly one method on the double",
                double
            ),
            UsageError::OperationPending { double } => write!(
                f,
                "a stubbing or verification on {} is still pending",
                double
            ),
            UsageError::ReturnTypeMismatch {
                call,
                expected,
                found,
            } => write!(
                f,
                "{} cannot return {}; its declared result type is {}",
                call, found, expected
            ),
            UsageError::RealMethodOnMock { call } => write!(
                f,
                "cannot call the real method for {} on a mock; only spies wrap a real instance",
                call
            ),
            UsageError::UnstubbedCall { double, call } => {
                write!(f, "strict {} received unstubbed call {}", double, call)
            }
            UsageError::StubOnlyVerification { double } => write!(
                f,
                "{} was created stub-only and does not record calls",
                double
            ),
        }
    }
}

impl std::error::Error for UsageError {}

/// A group of identical recorded calls, as shown in failure reports.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RecordedCall {
    pub call: String,
    pub count: usize,
}

/// Why a verification did not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The number of matching calls was wrong
    Count {
        /// Expected cardinality
        expected: Times,
        /// Observed matching calls
        actual: usize,
    },
    /// Calls occurred on a double expected to have none
    Unwanted {
        /// Observed calls
        actual: usize,
    },
    /// Enough matching calls exist, but not after the previously verified one
    OutOfOrder {
        /// Expected cardinality
        expected: Times,
        /// Matching calls after the previous verification
        actual: usize,
    },
}

/// An expected interaction did not match the recorded calls.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct VerificationFailure {
    /// Name of the verified double
    pub double: String,
    /// Rendering of the wanted call
    pub wanted: String,
    /// What went wrong
    pub mismatch: Mismatch,
    /// Recorded calls, grouped, in first-seen order
    pub recorded: Vec<RecordedCall>,
    /// Groups left out of `recorded` by the report limit
    pub omitted: usize,
}

impl VerificationFailure {
    /// Number of matching calls observed.
    pub fn actual(&self) -> usize {
        match self.mismatch {
            Mismatch::Count { actual, .. }
            | Mismatch::Unwanted { actual }
            | Mismatch::OutOfOrder { actual, .. } => actual,
        }
    }

    /// Expected cardinality.
    pub fn expected(&self) -> Times {
        match self.mismatch {
            Mismatch::Count { expected, .. } | Mismatch::OutOfOrder { expected, .. } => expected,
            Mismatch::Unwanted { .. } => Times::never(),
        }
    }
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mismatch {
            Mismatch::Count { expected, actual } => write!(
                f,
                "{}.{}: wanted {} but was invoked {} {}",
                self.double,
                self.wanted,
                expected,
                actual,
                if *actual == 1 { "time" } else { "times" }
            )?,
            Mismatch::Unwanted { actual } => write!(
                f,
                "{}: wanted no interactions but found {}",
                self.double, actual
            )?,
            Mismatch::OutOfOrder { expected, actual } => write!(
                f,
                "{}.{}: wanted {} in order but found {} after the previous verification",
                self.double, self.wanted, expected, actual
            )?,
        }

        if self.recorded.is_empty() {
            return write!(f, "\nno interactions were recorded");
        }

        write!(f, "\nrecorded interactions:")?;
        for entry in &self.recorded {
            write!(f, "\n  {}", entry.call)?;
            if entry.count > 1 {
                write!(f, " x{}", entry.count)?;
            }
        }
        if self.omitted > 0 {
            write!(f, "\n  ... and {} more", self.omitted)?;
        }
        Ok(())
    }
}

impl std::error::Error for VerificationFailure {}

/// Error returned by the verification API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The verification could not be performed
    Usage(UsageError),
    /// The verification was performed and did not hold
    Failed(VerificationFailure),
}

impl VerifyError {
    /// The verification failure, if the check ran.
    pub fn failure(&self) -> Option<&VerificationFailure> {
        match self {
            VerifyError::Failed(failure) => Some(failure),
            VerifyError::Usage(_) => None,
        }
    }
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::Usage(e) => write!(f, "invalid verification: {}", e),
            VerifyError::Failed(e) => write!(f, "verification failed: {}", e),
        }
    }
}

impl std::error::Error for VerifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VerifyError::Usage(e) => Some(e),
            VerifyError::Failed(e) => Some(e),
        }
    }
}

impl From<UsageError> for VerifyError {
    fn from(e: UsageError) -> Self {
        VerifyError::Usage(e)
    }
}

impl From<VerificationFailure> for VerifyError {
    fn from(e: VerificationFailure) -> Self {
        VerifyError::Failed(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(mismatch: Mismatch, recorded: Vec<RecordedCall>, omitted: usize) -> VerificationFailure {
        VerificationFailure {
            double: "List".to_string(),
            wanted: "add(\"one\")".to_string(),
            mismatch,
            recorded,
            omitted,
        }
    }

    #[test]
    fn test_count_mismatch_display() {
        let failure = failure(
            Mismatch::Count {
                expected: Times::once(),
                actual: 0,
            },
            vec![],
            0,
        );

        assert_eq!(
            failure.to_string(),
            "List.add(\"one\"): wanted exactly 1 time but was invoked 0 times\nno interactions were recorded"
        );
        assert_eq!(failure.actual(), 0);
        assert_eq!(failure.expected(), Times::once());
    }

    #[test]
    fn test_report_lists_grouped_calls() {
        let failure = failure(
            Mismatch::Count {
                expected: Times::once(),
                actual: 2,
            },
            vec![
                RecordedCall {
                    call: "add(\"one\")".to_string(),
                    count: 2,
                },
                RecordedCall {
                    call: "clear()".to_string(),
                    count: 1,
                },
            ],
            3,
        );

        let text = failure.to_string();
        assert!(text.contains("invoked 2 times"));
        assert!(text.contains("\n  add(\"one\") x2"));
        assert!(text.contains("\n  clear()"));
        assert!(!text.contains("clear() x1"));
        assert!(text.ends_with("... and 3 more"));
    }

    #[test]
    fn test_unwanted_expects_never() {
        let failure = failure(Mismatch::Unwanted { actual: 4 }, vec![], 0);

        assert_eq!(failure.expected(), Times::never());
        assert_eq!(failure.actual(), 4);
        assert!(failure.to_string().starts_with("List: wanted no interactions but found 4"));
    }

    #[test]
    fn test_verify_error_conversions() {
        let usage: VerifyError = UsageError::NoInvocationCaptured {
            double: "List".to_string(),
        }
        .into();
        assert!(usage.failure().is_none());
        assert!(usage.to_string().starts_with("invalid verification: no call on List"));

        let failed: VerifyError = failure(Mismatch::Unwanted { actual: 1 }, vec![], 0).into();
        assert_eq!(failed.failure().map(VerificationFailure::actual), Some(1));
        assert!(std::error::Error::source(&failed).is_some());
    }

    #[test]
    fn test_usage_error_display() {
        let error = UsageError::ReturnTypeMismatch {
            call: "size()".to_string(),
            expected: "usize",
            found: "alloc::string::String",
        };
        assert_eq!(
            error.to_string(),
            "size() cannot return alloc::string::String; its declared result type is usize"
        );
    }
}
