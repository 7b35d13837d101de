//! Actions attached to stub rules.
//!
//! Return values are type-erased so that rules for methods with different
//! result types can share one registry. Each returning action remembers the
//! `TypeId` of what it produces; the interceptor checks it against the
//! method's declared result type before handing the value back.

use crate::domain::invocation::Invocation;
use std::any::{self, Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A value produced by a stub, not yet downcast to the method's result type.
pub type Produced = Box<dyn Any + Send>;

type Producer = Arc<dyn Fn(&Invocation) -> Produced + Send + Sync>;
type Raiser = Arc<dyn Fn() -> Produced + Send + Sync>;

/// What a matching call does.
#[derive(Clone)]
pub enum StubAction {
    /// Produce a value of a fixed type.
    Return {
        /// Builds the value for each call
        produce: Producer,
        /// Type of the produced value
        type_id: TypeId,
        /// Readable type name, for diagnostics
        type_name: &'static str,
    },
    /// Unwind with a payload, as the real method would when failing.
    Throw {
        /// Builds the panic payload for each call
        raise: Raiser,
        /// Readable payload type name, for diagnostics
        type_name: &'static str,
    },
    /// Delegate to the wrapped real instance.
    CallRealMethod,
}

impl StubAction {
    /// Return a clone of `value` on every call.
    pub fn returning<R>(value: R) -> Self
    where
        R: Any + Clone + Send + Sync,
    {
        Self::answering(move |_| value.clone())
    }

    /// Compute the result from the invocation on every call.
    pub fn answering<R, F>(answer: F) -> Self
    where
        R: Any + Send,
        F: Fn(&Invocation) -> R + Send + Sync + 'static,
    {
        StubAction::Return {
            produce: Arc::new(move |invocation: &Invocation| {
                Box::new(answer(invocation)) as Produced
            }),
            type_id: TypeId::of::<R>(),
            type_name: any::type_name::<R>(),
        }
    }

    /// Unwind with a clone of `error` on every call.
    pub fn throwing<E>(error: E) -> Self
    where
        E: Any + Clone + Send + Sync,
    {
        StubAction::Throw {
            raise: Arc::new(move || Box::new(error.clone()) as Produced),
            type_name: any::type_name::<E>(),
        }
    }

    /// Return `()`, for methods without a result.
    pub fn nothing() -> Self {
        Self::returning(())
    }

    /// Delegate to the real instance.
    pub fn call_real() -> Self {
        StubAction::CallRealMethod
    }

    /// Type produced by this action, if it returns a value.
    pub fn produces(&self) -> Option<(TypeId, &'static str)> {
        match self {
            StubAction::Return {
                type_id, type_name, ..
            } => Some((*type_id, *type_name)),
            StubAction::Throw { .. } | StubAction::CallRealMethod => None,
        }
    }
}

impl fmt::Debug for StubAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StubAction::Return { type_name, .. } => write!(f, "Return<{}>", type_name),
            StubAction::Throw { type_name, .. } => write!(f, "Throw<{}>", type_name),
            StubAction::CallRealMethod => write!(f, "CallRealMethod"),
        }
    }
}
