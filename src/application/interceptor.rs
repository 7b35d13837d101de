//! Call interception for doubles.
//!
//! Every method on a double funnels into [`Interceptor::intercept`], which:
//! 1. Records the call (unless the double is stub-only)
//! 2. Answers from the most recent matching stub rule, if any
//! 3. Otherwise falls back to the method default or the real instance
//!
//! The interceptor can also be *armed* by the action-first stubbing API and by
//! closure-based verification. While armed, the next call is captured instead
//! of executed: it is not recorded, no stub or real method runs, and the
//! method default is handed back to the probe.

use crate::application::metrics::Metrics;
use crate::application::ports::Storage;
use crate::application::recorder::InvocationRecorder;
use crate::application::registry::{RuleId, StubRegistry, StubSet};
use crate::application::settings::{BuildError, DoubleSettings};
use crate::domain::{
    action::StubAction,
    error::{Mismatch, RecordedCall, UsageError, VerificationFailure, VerifyError},
    invocation::{Invocation, MethodName},
    kind::{DefaultAnswer, DoubleKind},
    matcher::CallMatcher,
    signature::CallSignature,
    times::Times,
};
use std::any::{self, Any, TypeId};
use std::collections::HashMap;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call consumed by an armed interceptor.
#[derive(Debug, Clone)]
pub(crate) struct CapturedCall {
    pub invocation: Invocation,
    pub result_type: TypeId,
    pub result_type_name: &'static str,
    pub has_real: bool,
}

impl CapturedCall {
    fn of<R: Any>(invocation: &Invocation, has_real: bool) -> Self {
        Self {
            invocation: invocation.clone(),
            result_type: TypeId::of::<R>(),
            result_type_name: any::type_name::<R>(),
            has_real,
        }
    }
}

#[derive(Debug)]
enum CaptureSlot {
    Idle,
    Armed,
    Captured(CapturedCall),
}

/// Routes calls on one double and holds all of its state.
#[derive(Debug)]
pub struct Interceptor<S>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    name: String,
    kind: DoubleKind,
    default_answer: DefaultAnswer,
    stub_only: bool,
    report_limit: usize,
    recorder: InvocationRecorder,
    registry: StubRegistry<S>,
    capture: Mutex<CaptureSlot>,
    last_call: Mutex<Option<CapturedCall>>,
    probing: AtomicBool,
    metrics: Metrics,
}

impl<S> Interceptor<S>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    /// Create an interceptor for a double of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::RealMethodsWithoutInstance` when a mock is
    /// configured to call real methods.
    pub fn new(storage: S, kind: DoubleKind, settings: DoubleSettings) -> Result<Self, BuildError> {
        let default_answer = settings
            .default_answer()
            .unwrap_or_else(|| kind.default_answer());
        if kind == DoubleKind::Mock && default_answer == DefaultAnswer::CallRealMethods {
            return Err(BuildError::RealMethodsWithoutInstance);
        }

        let name = settings.name().unwrap_or("double").to_string();
        Ok(Self::assemble(storage, kind, name, default_answer, &settings))
    }

    /// Create an interceptor with the kind's default behavior.
    pub fn named(storage: S, kind: DoubleKind, name: impl Into<String>) -> Self {
        Self::assemble(
            storage,
            kind,
            name.into(),
            kind.default_answer(),
            &DoubleSettings::default(),
        )
    }

    fn assemble(
        storage: S,
        kind: DoubleKind,
        name: String,
        default_answer: DefaultAnswer,
        settings: &DoubleSettings,
    ) -> Self {
        debug!(double = %name, kind = %kind, ?default_answer, "created double");

        Self {
            name,
            kind,
            default_answer,
            stub_only: settings.stub_only(),
            report_limit: settings.report_limit(),
            recorder: InvocationRecorder::new(),
            registry: StubRegistry::new(storage),
            capture: Mutex::new(CaptureSlot::Idle),
            last_call: Mutex::new(None),
            probing: AtomicBool::new(false),
            metrics: Metrics::new(),
        }
    }

    /// Handle one call on the double.
    ///
    /// # Arguments
    /// * `invocation` - The call being made
    /// * `default` - Produces the method's declared default value
    /// * `real` - Runs the real method, when the double wraps an instance
    ///
    /// # Panics
    /// Unwinds with the stub's payload when a throw action fires, propagates
    /// real-method panics unchanged, and panics with a [`UsageError`] payload
    /// on misconfigured stubs or unstubbed calls on a strict double.
    pub fn intercept<R, D, F>(&self, invocation: Invocation, default: D, real: Option<F>) -> R
    where
        R: Any + Send,
        D: FnOnce() -> R,
        F: FnOnce() -> R,
    {
        let call = CapturedCall::of::<R>(&invocation, real.is_some());
        if self.try_capture(&call) {
            trace!(double = %self.name, call = %invocation, "captured call");
            return default();
        }

        trace!(double = %self.name, call = %invocation, "intercepted call");

        if !self.stub_only {
            self.recorder.record(invocation.clone());
            self.metrics.record_invocation();
        }
        *lock(&self.last_call) = Some(call);

        match self.registry.resolve(&invocation) {
            Some((rule, action)) => self.answer(rule, action, &invocation, real),
            None => self.fall_back(&invocation, default, real),
        }
    }

    fn try_capture(&self, call: &CapturedCall) -> bool {
        let mut slot = lock(&self.capture);
        if !matches!(*slot, CaptureSlot::Armed) {
            return false;
        }
        *slot = CaptureSlot::Captured(call.clone());
        true
    }

    fn answer<R, F>(&self, rule: RuleId, action: StubAction, invocation: &Invocation, real: Option<F>) -> R
    where
        R: Any + Send,
        F: FnOnce() -> R,
    {
        match action {
            StubAction::Return {
                produce, type_name, ..
            } => match produce(invocation).downcast::<R>() {
                Ok(value) => {
                    self.metrics.record_stubbed();
                    trace!(double = %self.name, call = %invocation, %rule, "answered from stub");
                    *value
                }
                Err(_) => panic::panic_any(UsageError::ReturnTypeMismatch {
                    call: invocation.to_string(),
                    expected: any::type_name::<R>(),
                    found: type_name,
                }),
            },
            StubAction::Throw { raise, type_name } => {
                self.metrics.record_stubbed();
                debug!(
                    double = %self.name,
                    call = %invocation,
                    %rule,
                    payload = type_name,
                    "throwing stubbed failure"
                );
                panic::resume_unwind(raise())
            }
            StubAction::CallRealMethod => self.delegate(invocation, real),
        }
    }

    fn fall_back<R, D, F>(&self, invocation: &Invocation, default: D, real: Option<F>) -> R
    where
        D: FnOnce() -> R,
        F: FnOnce() -> R,
    {
        match self.default_answer {
            DefaultAnswer::ReturnDefaults => {
                self.metrics.record_default();
                default()
            }
            DefaultAnswer::CallRealMethods => self.delegate(invocation, real),
            // A result-first probe is setting up the stub this call lacks
            DefaultAnswer::Strict if self.probing.load(Ordering::Acquire) => {
                self.metrics.record_default();
                default()
            }
            DefaultAnswer::Strict => panic::panic_any(UsageError::UnstubbedCall {
                double: self.name.clone(),
                call: invocation.to_string(),
            }),
        }
    }

    fn delegate<R, F>(&self, invocation: &Invocation, real: Option<F>) -> R
    where
        F: FnOnce() -> R,
    {
        match real {
            Some(real) => {
                self.metrics.record_delegated();
                trace!(double = %self.name, call = %invocation, "delegating to real instance");
                real()
            }
            None => panic::panic_any(UsageError::RealMethodOnMock {
                call: invocation.to_string(),
            }),
        }
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mock or spy.
    pub fn kind(&self) -> DoubleKind {
        self.kind
    }

    /// Answer used for unstubbed calls.
    pub fn default_answer(&self) -> DefaultAnswer {
        self.default_answer
    }

    /// Every recorded call in order, stubbing probes included.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.recorder.snapshot()
    }

    /// Recorded calls that count for verification.
    pub fn verifiable_invocations(&self) -> Vec<Invocation> {
        self.recorder.verifiable()
    }

    /// Number of registered stub rules.
    pub fn stub_count(&self) -> usize {
        self.registry.rule_count()
    }

    /// Resolution counters for this double.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn ensure_idle(&self) -> Result<(), UsageError> {
        match *lock(&self.capture) {
            CaptureSlot::Idle => Ok(()),
            CaptureSlot::Armed | CaptureSlot::Captured(_) => Err(UsageError::OperationPending {
                double: self.name.clone(),
            }),
        }
    }

    /// Run `probe` with the interceptor armed and return the call it made.
    ///
    /// The call is neither recorded nor executed.
    pub(crate) fn capture<R>(&self, probe: impl FnOnce() -> R) -> Result<CapturedCall, UsageError> {
        let armed = self.arm()?;
        let _ = probe();
        armed.finish()
    }

    /// Run `probe` through normal interception and return the last call it
    /// made, flagged so verification skips it.
    ///
    /// A panic from the probe (such as a spy's real method failing)
    /// propagates before anything is flagged.
    pub(crate) fn observe<R>(&self, probe: impl FnOnce() -> R) -> Result<CapturedCall, UsageError> {
        self.begin_probe()?;
        let window = ProbeWindow { interceptor: self };
        let _ = probe();
        drop(window);
        self.finish_probe()
    }

    fn arm(&self) -> Result<ArmedCapture<'_, S>, UsageError> {
        let mut slot = lock(&self.capture);
        if !matches!(*slot, CaptureSlot::Idle) {
            return Err(UsageError::OperationPending {
                double: self.name.clone(),
            });
        }
        *slot = CaptureSlot::Armed;
        Ok(ArmedCapture { interceptor: self })
    }

    fn begin_probe(&self) -> Result<(), UsageError> {
        self.ensure_idle()?;
        *lock(&self.last_call) = None;
        self.probing.store(true, Ordering::Release);
        Ok(())
    }

    fn finish_probe(&self) -> Result<CapturedCall, UsageError> {
        self.probing.store(false, Ordering::Release);
        let call = lock(&self.last_call)
            .take()
            .ok_or_else(|| UsageError::NoInvocationCaptured {
                double: self.name.clone(),
            })?;
        if !self.stub_only {
            self.recorder.mark_probe(call.invocation.sequence());
            self.metrics.record_probe();
        }
        Ok(call)
    }

    /// Register a stub rule.
    pub(crate) fn add_stub(&self, matcher: CallMatcher, actions: Vec<StubAction>) -> RuleId {
        debug!(double = %self.name, call = %matcher, ?actions, "registering stub");
        self.registry.add_rule(matcher, actions)
    }

    /// Append a consecutive action to a rule.
    pub(crate) fn append_stub_action(&self, method: MethodName, rule: RuleId, action: StubAction) -> bool {
        debug!(double = %self.name, %rule, ?action, "appending stub action");
        self.registry.append_action(method, rule, action)
    }

    fn ensure_recording(&self) -> Result<(), UsageError> {
        if self.stub_only {
            return Err(UsageError::StubOnlyVerification {
                double: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Check that `matcher` selects a number of recorded calls allowed by `times`.
    pub(crate) fn check(&self, matcher: &CallMatcher, times: Times) -> Result<(), VerifyError> {
        self.ensure_recording()?;
        let recorded = self.recorder.verifiable();
        let actual = recorded.iter().filter(|call| matcher.matches(call)).count();

        if times.matches(actual) {
            trace!(double = %self.name, wanted = %matcher, %times, "verified");
            return Ok(());
        }

        Err(self
            .failure(matcher.to_string(), Mismatch::Count { expected: times, actual }, &recorded)
            .into())
    }

    /// Check that no call was recorded.
    pub(crate) fn check_no_interactions(&self) -> Result<(), VerifyError> {
        self.ensure_recording()?;
        let recorded = self.recorder.verifiable();
        if recorded.is_empty() {
            return Ok(());
        }

        Err(self
            .failure(
                "<no interactions>".to_string(),
                Mismatch::Unwanted {
                    actual: recorded.len(),
                },
                &recorded,
            )
            .into())
    }

    /// Check `times` against matching calls made after sequence `after`.
    ///
    /// For an exact count the next run of consecutive matching calls is
    /// tried first, so a call repeated later in the sequence can be verified
    /// once per occurrence.
    ///
    /// # Returns
    /// The sequence number later in-order checks must come after.
    pub(crate) fn check_in_order(
        &self,
        matcher: &CallMatcher,
        times: Times,
        after: u64,
    ) -> Result<u64, VerifyError> {
        self.ensure_recording()?;
        let recorded = self.recorder.verifiable();
        let matching: Vec<&Invocation> = recorded.iter().filter(|call| matcher.matches(call)).collect();
        let following: Vec<&Invocation> = matching
            .iter()
            .copied()
            .filter(|call| call.sequence() > after)
            .collect();

        // An exact count consumes the next unbroken run of matching calls,
        // leaving later repeats for later in-order checks
        let next_run: Vec<&Invocation> = recorded
            .iter()
            .filter(|call| call.sequence() > after)
            .skip_while(|call| !matcher.matches(call))
            .take_while(|call| matcher.matches(call))
            .collect();
        let following = match times {
            Times::Exactly(n) if n == next_run.len() => next_run,
            _ => following,
        };

        if times.matches(following.len()) {
            trace!(double = %self.name, wanted = %matcher, %times, "verified in order");
            return Ok(following.last().map_or(after, |call| call.sequence()));
        }

        let mismatch = if times.matches(matching.len()) {
            Mismatch::OutOfOrder {
                expected: times,
                actual: following.len(),
            }
        } else {
            Mismatch::Count {
                expected: times,
                actual: matching.len(),
            }
        };
        Err(self.failure(matcher.to_string(), mismatch, &recorded).into())
    }

    fn failure(&self, wanted: String, mismatch: Mismatch, recorded: &[Invocation]) -> VerificationFailure {
        let mut groups: Vec<RecordedCall> = Vec::new();
        let mut positions: HashMap<CallSignature, usize> = HashMap::new();
        for invocation in recorded {
            let signature = CallSignature::of(invocation);
            match positions.get(&signature) {
                Some(&position) => groups[position].count += 1,
                None => {
                    positions.insert(signature, groups.len());
                    groups.push(RecordedCall {
                        call: invocation.to_string(),
                        count: 1,
                    });
                }
            }
        }

        let omitted = groups.len().saturating_sub(self.report_limit);
        groups.truncate(self.report_limit);

        warn!(
            double = %self.name,
            %wanted,
            ?mismatch,
            recorded = recorded.len(),
            "verification failed"
        );

        VerificationFailure {
            double: self.name.clone(),
            wanted,
            mismatch,
            recorded: groups,
            omitted,
        }
    }
}

/// Pending capture. Dropping it without [`finish`](Self::finish), as happens
/// when the probe panics, returns the interceptor to normal operation.
struct ArmedCapture<'a, S>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    interceptor: &'a Interceptor<S>,
}

impl<'a, S> ArmedCapture<'a, S>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    /// Take the captured call and disarm.
    fn finish(self) -> Result<CapturedCall, UsageError> {
        let slot = std::mem::replace(&mut *lock(&self.interceptor.capture), CaptureSlot::Idle);
        match slot {
            CaptureSlot::Captured(call) => Ok(call),
            CaptureSlot::Idle | CaptureSlot::Armed => Err(UsageError::NoInvocationCaptured {
                double: self.interceptor.name.clone(),
            }),
        }
    }
}

impl<'a, S> Drop for ArmedCapture<'a, S>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    fn drop(&mut self) {
        *lock(&self.interceptor.capture) = CaptureSlot::Idle;
    }
}

/// Open while a result-first probe runs; closed on drop, also when the
/// probe panics.
struct ProbeWindow<'a, S>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    interceptor: &'a Interceptor<S>,
}

impl<'a, S> Drop for ProbeWindow<'a, S>
where
    S: Storage<MethodName, StubSet> + Clone,
{
    fn drop(&mut self) {
        self.interceptor.probing.store(false, Ordering::Release);
    }
}
