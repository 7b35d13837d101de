//! Call signature computation for grouping recorded calls.
//!
//! A call signature identifies a class of identical calls based on:
//! - Method identifier
//! - Argument count
//! - Rendered argument values, in order
//!
//! Calls with the same signature are folded together in verification reports,
//! so a log of `add("one")`, `add("one")`, `clear()` is shown as two lines.

use crate::domain::invocation::Invocation;
use ahash::AHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A hash identifying a method plus its rendered arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallSignature(u64);

impl CallSignature {
    /// Compute a signature from call components.
    ///
    /// # Arguments
    /// * `method` - Method identifier
    /// * `rendered_args` - `Debug` renderings of each argument, in order
    pub fn new<I, A>(method: &str, rendered_args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
    {
        let mut hasher = AHasher::default();

        method.hash(&mut hasher);

        // Length prefix keeps ("a", "b") and ("ab") apart
        let mut count = 0usize;
        for arg in rendered_args {
            let arg = arg.as_ref();
            arg.len().hash(&mut hasher);
            arg.hash(&mut hasher);
            count += 1;
        }
        count.hash(&mut hasher);

        CallSignature(hasher.finish())
    }

    /// Signature of a recorded invocation.
    pub fn of(invocation: &Invocation) -> Self {
        Self::new(
            invocation.method(),
            invocation.args().iter().map(|arg| format!("{:?}", arg)),
        )
    }

    /// Get the raw hash value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
