//! Argument and call matchers.
//!
//! Stub rules and verifications select invocations with a [`CallMatcher`]:
//! a method identifier plus one [`ArgMatcher`] per argument. Probe-based APIs
//! build exact matchers from the probed call; the explicit forms accept any
//! mix of exact, wildcard and predicate matchers.

use crate::domain::invocation::{ArgValue, Invocation, MethodName};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

type ArgPredicate = Arc<dyn Fn(&ArgValue) -> bool + Send + Sync>;

/// Matches a single argument.
#[derive(Clone)]
pub enum ArgMatcher {
    /// Matches any value of any type
    Any,
    /// Matches a value equal to the captured one
    Eq(ArgValue),
    /// Matches when the predicate holds
    Predicate {
        /// Rendered in reports in place of the value
        description: Cow<'static, str>,
        /// The test itself
        test: ArgPredicate,
    },
}

impl ArgMatcher {
    /// Check an argument against this matcher.
    pub fn matches(&self, arg: &ArgValue) -> bool {
        match self {
            ArgMatcher::Any => true,
            ArgMatcher::Eq(expected) => expected == arg,
            ArgMatcher::Predicate { test, .. } => test(arg),
        }
    }
}

impl fmt::Debug for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgMatcher::Any => write!(f, "<any>"),
            ArgMatcher::Eq(value) => write!(f, "{:?}", value),
            ArgMatcher::Predicate { description, .. } => write!(f, "<{}>", description),
        }
    }
}

/// Matches every argument.
pub fn any() -> ArgMatcher {
    ArgMatcher::Any
}

/// Matches arguments equal to `value`.
pub fn eq<T>(value: T) -> ArgMatcher
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    ArgMatcher::Eq(ArgValue::new(value))
}

/// Matches arguments of type `T` satisfying `test`.
///
/// Arguments of any other type never match.
///
/// # Example
/// ```
/// use test_doubles::matchers::arg_that;
/// use test_doubles::ArgValue;
///
/// let large = arg_that("index > 100", |index: &usize| *index > 100);
/// assert!(large.matches(&ArgValue::new(999_usize)));
/// assert!(!large.matches(&ArgValue::new(0_usize)));
/// assert!(!large.matches(&ArgValue::new(999_u32)));
/// ```
pub fn arg_that<T, F>(description: impl Into<Cow<'static, str>>, test: F) -> ArgMatcher
where
    T: Any,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    ArgMatcher::Predicate {
        description: description.into(),
        test: Arc::new(move |arg: &ArgValue| arg.downcast_ref::<T>().is_some_and(&test)),
    }
}

/// Matches invocations of one method with the given arguments.
#[derive(Debug, Clone)]
pub struct CallMatcher {
    method: MethodName,
    args: Vec<ArgMatcher>,
}

impl CallMatcher {
    /// Start a matcher for `method` with no arguments.
    pub fn new(method: MethodName) -> Self {
        Self {
            method,
            args: Vec::new(),
        }
    }

    /// Append an exact-equality matcher for the next argument.
    pub fn arg<T>(self, value: T) -> Self
    where
        T: Any + fmt::Debug + PartialEq + Send + Sync,
    {
        self.with(eq(value))
    }

    /// Append an arbitrary matcher for the next argument.
    pub fn with(mut self, matcher: ArgMatcher) -> Self {
        self.args.push(matcher);
        self
    }

    /// Matcher selecting calls identical to `invocation`.
    pub fn exact(invocation: &Invocation) -> Self {
        Self {
            method: invocation.method(),
            args: invocation
                .args()
                .iter()
                .cloned()
                .map(ArgMatcher::Eq)
                .collect(),
        }
    }

    /// The matched method.
    pub fn method(&self) -> MethodName {
        self.method
    }

    /// Check whether `invocation` is selected by this matcher.
    pub fn matches(&self, invocation: &Invocation) -> bool {
        self.method == invocation.method()
            && self.args.len() == invocation.args().len()
            && self
                .args
                .iter()
                .zip(invocation.args())
                .all(|(matcher, arg)| matcher.matches(arg))
    }
}

impl fmt::Display for CallMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", arg)?;
        }
        write!(f, ")")
    }
}
