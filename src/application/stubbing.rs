//! Stubbing API.
//!
//! Three ways to register a stub rule:
//!
//! - Result-first: [`when`] runs the probe call for real, then
//!   [`OngoingStubbing`] attaches actions to it.
//! - Action-first: [`do_return`] and friends build a [`Stubber`] whose
//!   [`when`](Stubber::when) captures the probe call without executing it.
//!   Use this form on spies whose real method would fail for the probed
//!   arguments.
//! - Direct: [`Stubber::for_call`] registers against an explicit
//!   [`CallMatcher`], with no probe call at all.
//!
//! # Example
//! ```
//! use test_doubles::{do_throw, double, matchers::any, when, CallMatcher};
//!
//! pub trait Inventory {
//!     fn stock(&self, sku: String) -> u32;
//! }
//!
//! double! {
//!     pub struct InventoryDouble for Inventory {
//!         fn stock(&self, sku: String) -> u32 => 0;
//!     }
//! }
//!
//! let inventory = InventoryDouble::mock();
//! when(&inventory, |d| d.stock("apple".to_string()))
//!     .unwrap()
//!     .then_return(3)
//!     .then_return(2);
//!
//! assert_eq!(inventory.stock("apple".to_string()), 3);
//! assert_eq!(inventory.stock("apple".to_string()), 2);
//! assert_eq!(inventory.stock("apple".to_string()), 2);
//! assert_eq!(inventory.stock("pear".to_string()), 0);
//!
//! do_throw("out of service".to_string())
//!     .for_call(&inventory, CallMatcher::new("stock").with(any()))
//!     .unwrap();
//! ```

use crate::application::interceptor::Interceptor;
use crate::application::ports::{AsDouble, Storage};
use crate::application::registry::{RuleId, StubSet};
use crate::domain::{
    action::StubAction,
    error::UsageError,
    invocation::{Invocation, MethodName},
    kind::DoubleKind,
    matcher::CallMatcher,
};
use std::any::{self, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

/// Start a result-first stubbing.
///
/// `probe` is run through normal interception: the call is recorded (but
/// ignored by verification) and, on a spy, the real method runs. If the real
/// method panics, the panic propagates and no rule is registered.
///
/// # Errors
///
/// - `NoInvocationCaptured` if the probe never called the double
/// - `OperationPending` if the double is armed by another operation
/// - `ReturnTypeMismatch` if the probe's result is not the called method's
///   result type
pub fn when<'a, D, R, P>(double: &'a D, probe: P) -> Result<OngoingStubbing<'a, D::Storage, R>, UsageError>
where
    D: AsDouble + ?Sized,
    R: Any + Send,
    P: FnOnce(&D) -> R,
{
    let interceptor = double.interceptor();
    let call = interceptor.observe(|| probe(double))?;

    if call.result_type != TypeId::of::<R>() {
        return Err(UsageError::ReturnTypeMismatch {
            call: call.invocation.to_string(),
            expected: call.result_type_name,
            found: any::type_name::<R>(),
        });
    }

    Ok(OngoingStubbing {
        interceptor,
        matcher: CallMatcher::exact(&call.invocation),
        rule: None,
        has_real: call.has_real,
        _result: PhantomData,
    })
}

/// A captured call awaiting its actions.
///
/// Every `then_*` call registers immediately: the first creates the rule, later
/// ones append consecutive actions to it.
pub struct OngoingStubbing<'a, S, R>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    interceptor: &'a Interceptor<S>,
    matcher: CallMatcher,
    rule: Option<RuleId>,
    has_real: bool,
    _result: PhantomData<fn() -> R>,
}

impl<'a, S, R> OngoingStubbing<'a, S, R>
where
    S: Storage<MethodName, StubSet> + Clone,
    R: Any + Send,
{
    fn push(mut self, action: StubAction) -> Self {
        match self.rule {
            Some(rule) => {
                let appended = self
                    .interceptor
                    .append_stub_action(self.matcher.method(), rule, action);
                // Rules are never removed, so the rule just added is still there
                debug_assert!(appended, "stub rule {} disappeared", rule);
            }
            None => {
                self.rule = Some(self.interceptor.add_stub(self.matcher.clone(), vec![action]));
            }
        }
        self
    }

    /// Return `value` (cloned per call).
    pub fn then_return(self, value: R) -> Self
    where
        R: Clone + Sync,
    {
        self.push(StubAction::returning(value))
    }

    /// Unwind with `error` as the panic payload.
    pub fn then_throw<E>(self, error: E) -> Self
    where
        E: Any + Clone + Send + Sync,
    {
        self.push(StubAction::throwing(error))
    }

    /// Compute the result from the call.
    pub fn then_answer<F>(self, answer: F) -> Self
    where
        F: Fn(&Invocation) -> R + Send + Sync + 'static,
    {
        self.push(StubAction::answering(answer))
    }

    /// Delegate to the real instance.
    ///
    /// # Errors
    ///
    /// Returns `RealMethodOnMock` if the double wraps no real instance.
    pub fn then_call_real_method(self) -> Result<Self, UsageError> {
        if !self.has_real {
            return Err(UsageError::RealMethodOnMock {
                call: self.matcher.to_string(),
            });
        }
        Ok(self.push(StubAction::call_real()))
    }

    /// The calls this stubbing answers.
    pub fn matcher(&self) -> &CallMatcher {
        &self.matcher
    }

    /// The registered rule, once an action was configured.
    pub fn rule(&self) -> Option<RuleId> {
        self.rule
    }
}

impl<'a, S, R> fmt::Debug for OngoingStubbing<'a, S, R>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OngoingStubbing")
            .field("double", &self.interceptor.name())
            .field("matcher", &self.matcher)
            .field("rule", &self.rule)
            .finish()
    }
}

/// Actions waiting for the call they answer.
#[derive(Debug, Clone)]
#[must_use = "a stubber registers nothing until `when` or `for_call` is called"]
pub struct Stubber {
    actions: Vec<StubAction>,
}

/// Stub a call to return `value`.
pub fn do_return<R>(value: R) -> Stubber
where
    R: Any + Clone + Send + Sync,
{
    Stubber::new(StubAction::returning(value))
}

/// Stub a call to unwind with `error`.
pub fn do_throw<E>(error: E) -> Stubber
where
    E: Any + Clone + Send + Sync,
{
    Stubber::new(StubAction::throwing(error))
}

/// Stub a call to compute its result.
pub fn do_answer<R, F>(answer: F) -> Stubber
where
    R: Any + Send,
    F: Fn(&Invocation) -> R + Send + Sync + 'static,
{
    Stubber::new(StubAction::answering(answer))
}

/// Stub a call without a result to do nothing.
pub fn do_nothing() -> Stubber {
    Stubber::new(StubAction::nothing())
}

/// Stub a call to run the real method.
pub fn do_call_real_method() -> Stubber {
    Stubber::new(StubAction::call_real())
}

impl Stubber {
    fn new(action: StubAction) -> Self {
        Self {
            actions: vec![action],
        }
    }

    /// Then return `value`.
    pub fn do_return<R>(mut self, value: R) -> Self
    where
        R: Any + Clone + Send + Sync,
    {
        self.actions.push(StubAction::returning(value));
        self
    }

    /// Then unwind with `error`.
    pub fn do_throw<E>(mut self, error: E) -> Self
    where
        E: Any + Clone + Send + Sync,
    {
        self.actions.push(StubAction::throwing(error));
        self
    }

    /// Then compute the result.
    pub fn do_answer<R, F>(mut self, answer: F) -> Self
    where
        R: Any + Send,
        F: Fn(&Invocation) -> R + Send + Sync + 'static,
    {
        self.actions.push(StubAction::answering(answer));
        self
    }

    /// Then do nothing.
    pub fn do_nothing(mut self) -> Self {
        self.actions.push(StubAction::nothing());
        self
    }

    /// Then run the real method.
    pub fn do_call_real_method(mut self) -> Self {
        self.actions.push(StubAction::call_real());
        self
    }

    /// Register the actions for the call `probe` makes.
    ///
    /// The probe call is captured, not executed: it is not recorded and no
    /// stub or real method runs.
    ///
    /// # Errors
    ///
    /// - `NoInvocationCaptured` if the probe never called the double
    /// - `OperationPending` if the double is already armed
    /// - `ReturnTypeMismatch` if a returned value is not the method's result type
    /// - `RealMethodOnMock` if delegation is requested on a mock
    pub fn when<D, R, P>(self, double: &D, probe: P) -> Result<RuleId, UsageError>
    where
        D: AsDouble + ?Sized,
        P: FnOnce(&D) -> R,
    {
        let interceptor = double.interceptor();
        let call = interceptor.capture(|| probe(double))?;
        let call_text = call.invocation.to_string();

        self.validate(&call_text, Some((call.result_type, call.result_type_name)), call.has_real)?;
        Ok(interceptor.add_stub(CallMatcher::exact(&call.invocation), self.actions))
    }

    /// Register the actions for every call selected by `matcher`.
    ///
    /// No result type is known here, so a returned value of the wrong type is
    /// reported when a matching call happens, as a panic with a
    /// `ReturnTypeMismatch` payload.
    ///
    /// # Errors
    ///
    /// Returns `RealMethodOnMock` if delegation is requested on a mock.
    pub fn for_call<D>(self, double: &D, matcher: CallMatcher) -> Result<RuleId, UsageError>
    where
        D: AsDouble + ?Sized,
    {
        let interceptor = double.interceptor();
        let has_real = interceptor.kind() == DoubleKind::Spy;

        self.validate(&matcher.to_string(), None, has_real)?;
        Ok(interceptor.add_stub(matcher, self.actions))
    }

    fn validate(
        &self,
        call: &str,
        result: Option<(TypeId, &'static str)>,
        has_real: bool,
    ) -> Result<(), UsageError> {
        for action in &self.actions {
            match action {
                StubAction::Return {
                    type_id, type_name, ..
                } => {
                    if let Some((expected_id, expected_name)) = result {
                        if *type_id != expected_id {
                            return Err(UsageError::ReturnTypeMismatch {
                                call: call.to_string(),
                                expected: expected_name,
                                found: *type_name,
                            });
                        }
                    }
                }
                StubAction::CallRealMethod if !has_real => {
                    return Err(UsageError::RealMethodOnMock {
                        call: call.to_string(),
                    });
                }
                StubAction::CallRealMethod | StubAction::Throw { .. } => {}
            }
        }
        Ok(())
    }
}
