//! Double kinds and the behavior of unstubbed calls.

use std::fmt;

/// Whether a double has a real instance behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoubleKind {
    /// No real backing; unstubbed calls return the method default
    Mock,
    /// Wraps a real instance; unstubbed calls delegate to it
    Spy,
}

impl DoubleKind {
    /// Answer used for unstubbed calls unless configured otherwise.
    pub fn default_answer(&self) -> DefaultAnswer {
        match self {
            DoubleKind::Mock => DefaultAnswer::ReturnDefaults,
            DoubleKind::Spy => DefaultAnswer::CallRealMethods,
        }
    }
}

impl fmt::Display for DoubleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoubleKind::Mock => write!(f, "mock"),
            DoubleKind::Spy => write!(f, "spy"),
        }
    }
}

/// What an unstubbed call does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultAnswer {
    /// Return the method's declared default value
    ReturnDefaults,
    /// Delegate to the real instance
    CallRealMethods,
    /// Treat the call as a usage error
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_answers_per_kind() {
        assert_eq!(DoubleKind::Mock.default_answer(), DefaultAnswer::ReturnDefaults);
        assert_eq!(DoubleKind::Spy.default_answer(), DefaultAnswer::CallRealMethods);
    }

    #[test]
    fn test_display() {
        assert_eq!(DoubleKind::Mock.to_string(), "mock");
        assert_eq!(DoubleKind::Spy.to_string(), "spy");
    }
}
