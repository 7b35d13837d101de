//! Recorded calls and type-erased argument values.
//!
//! An [`Invocation`] is one call made on a double: the method identifier,
//! the argument list, and a process-wide sequence number. Arguments are held
//! as [`ArgValue`]s so that calls with heterogeneous argument types can live in
//! the same ordered log while still supporting exact-equality matching.

use std::any::{self, Any};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of a method on a mocked trait.
pub type MethodName = &'static str;

/// Sequence numbers are shared by every double in the process so that call
/// ordering can be compared across doubles.
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

trait ArgObject: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_object(&self, other: &dyn ArgObject) -> bool;
    fn type_name(&self) -> &'static str;
}

impl<T> ArgObject for T
where
    T: Any + fmt::Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_object(&self, other: &dyn ArgObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// A single argument value captured at call time.
///
/// Two values are equal only when they hold the same concrete type and that
/// type's `PartialEq` says so; an `i32` never equals an `i64`.
#[derive(Clone)]
pub struct ArgValue {
    inner: Arc<dyn ArgObject>,
}

impl ArgValue {
    /// Capture an argument.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + PartialEq + Send + Sync,
    {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Borrow the captured value as `T`, if that is its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Check whether the captured value is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.as_any().is::<T>()
    }

    /// Name of the captured value's type.
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        self.inner.eq_object(&*other.inner)
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

/// One call made on a double.
#[derive(Debug, Clone)]
pub struct Invocation {
    method: MethodName,
    args: Vec<ArgValue>,
    sequence: u64,
}

impl Invocation {
    /// Create an invocation and stamp it with the next sequence number.
    pub fn new(method: MethodName, args: Vec<ArgValue>) -> Self {
        Self {
            method,
            args,
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The invoked method.
    pub fn method(&self) -> MethodName {
        self.method
    }

    /// All captured arguments, in declaration order.
    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    /// Borrow the argument at `index` as `T`.
    ///
    /// Returns `None` when the index is out of range or the type differs.
    /// Useful inside stub answers.
    pub fn arg<T: Any>(&self, index: usize) -> Option<&T> {
        self.args.get(index).and_then(ArgValue::downcast_ref)
    }

    /// Process-wide position of this call.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for Invocation {
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
