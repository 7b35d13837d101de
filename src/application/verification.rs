//! Verification API.
//!
//! Verification reads the invocation record and never changes it, so the same
//! check can be repeated. Closure forms capture the wanted call the way the
//! action-first stubbing API does: the probe call is not executed and not
//! recorded.

use crate::application::ports::AsDouble;
use crate::domain::{error::VerifyError, matcher::CallMatcher, times::Times};

/// Verify the call made by `probe` happened exactly once.
///
/// # Example
/// ```
/// use test_doubles::{double, verify, verify_times, Times};
///
/// pub trait Bell {
///     fn ring(&self, times: u8);
/// }
///
/// double! {
///     pub struct BellDouble for Bell {
///         fn ring(&self, times: u8) -> () => ();
///     }
/// }
///
/// let bell = BellDouble::mock();
/// bell.ring(2);
///
/// assert!(verify(&bell, |b| b.ring(2)).is_ok());
/// assert!(verify_times(&bell, Times::never(), |b| b.ring(3)).is_ok());
/// assert!(verify(&bell, |b| b.ring(3)).is_err());
/// ```
pub fn verify<D, R, P>(double: &D, probe: P) -> Result<(), VerifyError>
where
    D: AsDouble + ?Sized,
    P: FnOnce(&D) -> R,
{
    verify_times(double, Times::once(), probe)
}

/// Verify the call made by `probe` happened a number of times allowed by `times`.
pub fn verify_times<D, R, P>(double: &D, times: Times, probe: P) -> Result<(), VerifyError>
where
    D: AsDouble + ?Sized,
    P: FnOnce(&D) -> R,
{
    let interceptor = double.interceptor();
    let call = interceptor.capture(|| probe(double))?;
    interceptor.check(&CallMatcher::exact(&call.invocation), times)
}

/// Verify calls selected by `matcher` happened a number of times allowed by `times`.
pub fn verify_call<D>(double: &D, matcher: &CallMatcher, times: Times) -> Result<(), VerifyError>
where
    D: AsDouble + ?Sized,
{
    double.interceptor().check(matcher, times)
}

/// Verify nothing was called on `double`.
pub fn verify_no_interactions<D>(double: &D) -> Result<(), VerifyError>
where
    D: AsDouble + ?Sized,
{
    double.interceptor().check_no_interactions()
}

/// Ordered verification across any number of doubles.
///
/// Each successful check moves a cursor to the last call it matched; the next
/// check only considers calls made after it. A failed check leaves the cursor
/// where it was.
#[derive(Debug, Default, Clone)]
pub struct InOrder {
    after: u64,
}

impl InOrder {
    /// Start an ordered verification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify the call made by `probe` happened once after the previously
    /// verified call.
    pub fn verify<D, R, P>(&mut self, double: &D, probe: P) -> Result<(), VerifyError>
    where
        D: AsDouble + ?Sized,
        P: FnOnce(&D) -> R,
    {
        self.verify_times(double, Times::once(), probe)
    }

    /// Like [`verify`](Self::verify) with an explicit cardinality.
    pub fn verify_times<D, R, P>(&mut self, double: &D, times: Times, probe: P) -> Result<(), VerifyError>
    where
        D: AsDouble + ?Sized,
        P: FnOnce(&D) -> R,
    {
        let interceptor = double.interceptor();
        let call = interceptor.capture(|| probe(double))?;
        self.verify_call(double, &CallMatcher::exact(&call.invocation), times)
    }

    /// Verify calls selected by `matcher`, after the previously verified call.
    pub fn verify_call<D>(&mut self, double: &D, matcher: &CallMatcher, times: Times) -> Result<(), VerifyError>
    where
        D: AsDouble + ?Sized,
    {
        self.after = double.interceptor().check_in_order(matcher, times, self.after)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{Mismatch, UsageError};
    use crate::domain::invocation::{ArgValue, Invocation};
    use crate::domain::matcher::any;
    use crate::infrastructure::double::Double;
    use crate::DoubleSettings;

    trait Ledger: Send + Sync {
        fn post(&self, amount: i64);
        fn balance(&self) -> i64;
    }

    impl Ledger for Double<dyn Ledger> {
        fn post(&self, amount: i64) {
            self.invoke(
                Invocation::new("post", vec![ArgValue::new(amount)]),
                || (),
                |real| real.post(amount),
            )
        }

        fn balance(&self) -> i64 {
            self.invoke(Invocation::new("balance", vec![]), || 0, |real| real.balance())
        }
    }

    fn ledger() -> Double<dyn Ledger> {
        Double::<dyn Ledger>::mock_named("Ledger")
    }

    #[test]
    fn test_verify_once() {
        let ledger = ledger();
        assert!(verify(&ledger, |l| l.post(10)).is_err());

        ledger.post(10);
        assert!(verify(&ledger, |l| l.post(10)).is_ok());
        // Verification is a pure read
        assert!(verify(&ledger, |l| l.post(10)).is_ok());
        assert_eq!(ledger.invocations().len(), 1);
    }

    #[test]
    fn test_verify_times() {
        let ledger = ledger();
        ledger.post(5);
        ledger.post(5);

        assert!(verify_times(&ledger, Times::exactly(2), |l| l.post(5)).is_ok());
        assert!(verify_times(&ledger, Times::at_least(1), |l| l.post(5)).is_ok());
        assert!(verify_times(&ledger, Times::at_most(1), |l| l.post(5)).is_err());
        assert!(verify_times(&ledger, Times::never(), |l| l.post(6)).is_ok());
    }

    #[test]
    fn test_failure_reports_counts_and_calls() {
        let ledger = ledger();
        ledger.post(1);
        ledger.balance();

        let error = verify(&ledger, |l| l.post(2)).unwrap_err();
        let failure = error.failure().unwrap();

        assert_eq!(failure.wanted, "post(2)");
        assert_eq!(failure.expected(), Times::once());
        assert_eq!(failure.actual(), 0);
        assert_eq!(failure.recorded.len(), 2);
        assert!(error.to_string().contains("recorded interactions:"));
    }

    #[test]
    fn test_verify_call_with_matchers() {
        let ledger = ledger();
        ledger.post(1);
        ledger.post(2);

        let any_post = CallMatcher::new("post").with(any());
        assert!(verify_call(&ledger, &any_post, Times::exactly(2)).is_ok());
        assert!(verify_call(&ledger, &CallMatcher::new("balance"), Times::never()).is_ok());
    }

    #[test]
    fn test_verify_no_interactions() {
        let ledger = ledger();
        assert!(verify_no_interactions(&ledger).is_ok());

        ledger.balance();
        let error = verify_no_interactions(&ledger).unwrap_err();
        assert!(matches!(
            error.failure().map(|f| &f.mismatch),
            Some(Mismatch::Unwanted { actual: 1 })
        ));
    }

    #[test]
    fn test_verify_without_call_is_usage_error() {
        let ledger = ledger();
        let error = verify(&ledger, |_| ()).unwrap_err();

        assert!(matches!(
            error,
            VerifyError::Usage(UsageError::NoInvocationCaptured { .. })
        ));
    }

    #[test]
    fn test_stub_only_double_refuses_verification() {
        let settings = DoubleSettings::builder().with_stub_only(true).build().unwrap();
        let ledger = Double::<dyn Ledger>::mock_with(settings).unwrap();
        ledger.post(1);

        assert!(matches!(
            verify(&ledger, |l| l.post(1)),
            Err(VerifyError::Usage(UsageError::StubOnlyVerification { .. }))
        ));
    }

    #[test]
    fn test_in_order_across_doubles() {
        let first = ledger();
        let second = ledger();
        first.post(1);
        second.post(2);
        first.post(3);

        let mut in_order = InOrder::new();
        assert!(in_order.verify(&first, |l| l.post(1)).is_ok());
        assert!(in_order.verify(&second, |l| l.post(2)).is_ok());
        assert!(in_order.verify(&first, |l| l.post(3)).is_ok());

        let mut wrong_order = InOrder::new();
        assert!(wrong_order.verify(&second, |l| l.post(2)).is_ok());
        let error = wrong_order.verify(&first, |l| l.post(1)).unwrap_err();
        assert!(matches!(
            error.failure().map(|f| &f.mismatch),
            Some(Mismatch::OutOfOrder { .. })
        ));
        // The failed check did not move the cursor
        assert!(wrong_order.verify(&first, |l| l.post(3)).is_ok());
    }

    #[test]
    fn test_in_order_missing_call_is_count_mismatch() {
        let ledger = ledger();
        ledger.post(1);

        let mut in_order = InOrder::new();
        let error = in_order.verify(&ledger, |l| l.post(9)).unwrap_err();
        assert!(matches!(
            error.failure().map(|f| &f.mismatch),
            Some(Mismatch::Count { actual: 0, .. })
        ));
    }
}
