//! Expected call counts for verification.

use std::fmt;

/// How many matching calls a verification expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    /// Exactly `n` calls
    Exactly(usize),
    /// `n` or more calls
    AtLeast(usize),
    /// `n` or fewer calls
    AtMost(usize),
}

impl Times {
    /// Exactly `n` calls.
    pub fn exactly(n: usize) -> Self {
        Times::Exactly(n)
    }

    /// Exactly one call.
    pub fn once() -> Self {
        Times::Exactly(1)
    }

    /// No calls at all.
    pub fn never() -> Self {
        Times::Exactly(0)
    }

    /// `n` or more calls.
    pub fn at_least(n: usize) -> Self {
        Times::AtLeast(n)
    }

    /// One or more calls.
    pub fn at_least_once() -> Self {
        Times::AtLeast(1)
    }

    /// `n` or fewer calls.
    pub fn at_most(n: usize) -> Self {
        Times::AtMost(n)
    }

    /// Check an observed count against this expectation.
    pub fn matches(&self, count: usize) -> bool {
        match *self {
            Times::Exactly(n) => count == n,
            Times::AtLeast(n) => count >= n,
            Times::AtMost(n) => count <= n,
        }
    }
}

impl Default for Times {
    fn default() -> Self {
        Times::once()
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "time"
    } else {
        "times"
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Times::Exactly(0) => write!(f, "never"),
            Times::Exactly(n) => write!(f, "exactly {} {}", n, plural(n)),
            Times::AtLeast(n) => write!(f, "at least {} {}", n, plural(n)),
            Times::AtMost(n) => write!(f, "at most {} {}", n, plural(n)),
        }
    }
}
