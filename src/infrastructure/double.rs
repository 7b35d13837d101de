//! Generic double handle.
//!
//! [`Double<T>`] pairs an [`Interceptor`] with an optional real instance of
//! `T` (usually a trait object). A double for a trait is an implementation of
//! that trait whose methods call [`Double::invoke`]; the
//! [`double!`](crate::double) macro writes those implementations.

use crate::application::interceptor::Interceptor;
use crate::application::metrics::Metrics;
use crate::application::ports::AsDouble;
use crate::application::registry::StubSet;
use crate::application::settings::{BuildError, DoubleSettings};
use crate::domain::invocation::{Invocation, MethodName};
use crate::domain::kind::DoubleKind;
use crate::infrastructure::storage::ShardedStorage;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Stub storage used by every [`Double`].
pub type StubStorage = Arc<ShardedStorage<MethodName, StubSet>>;

/// A mock or spy standing in for a `T`.
///
/// # Example
/// ```
/// use test_doubles::{ArgValue, Double, Invocation};
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// impl Clock for Double<dyn Clock> {
///     fn now(&self) -> u64 {
///         self.invoke(Invocation::new("now", vec![]), || 0, |real| real.now())
///     }
/// }
///
/// let clock = Double::<dyn Clock>::mock();
/// assert_eq!(clock.now(), 0);
/// assert_eq!(clock.invocations().len(), 1);
/// ```
pub struct Double<T: ?Sized> {
    interceptor: Interceptor<StubStorage>,
    real: Option<Box<T>>,
}

impl<T: ?Sized> Double<T> {
    fn short_type_name() -> &'static str {
        let full = std::any::type_name::<T>();
        let trimmed = full.strip_prefix("dyn ").unwrap_or(full);
        // Generic arguments and auto-trait bounds are left out
        let path = trimmed.split([' ', '<']).next().unwrap_or(trimmed);
        path.rsplit("::").next().unwrap_or(path)
    }

    fn build(kind: DoubleKind, settings: DoubleSettings, real: Option<Box<T>>) -> Result<Self, BuildError> {
        let settings = settings.or_named(Self::short_type_name());
        let interceptor = Interceptor::new(Arc::new(ShardedStorage::new()), kind, settings)?;
        Ok(Self { interceptor, real })
    }

    /// Create a mock: unstubbed calls return each method's default.
    pub fn mock() -> Self {
        Self::mock_named(Self::short_type_name())
    }

    /// Create a mock with a diagnostic name.
    pub fn mock_named(name: impl Into<String>) -> Self {
        Self {
            interceptor: Self::named_interceptor(DoubleKind::Mock, name.into()),
            real: None,
        }
    }

    /// Create a mock from settings.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::RealMethodsWithoutInstance` if the settings ask
    /// for real-method delegation.
    pub fn mock_with(settings: DoubleSettings) -> Result<Self, BuildError> {
        Self::build(DoubleKind::Mock, settings, None)
    }

    /// Create a spy: unstubbed calls run on `real`.
    pub fn spy(real: Box<T>) -> Self {
        Self::spy_named(Self::short_type_name(), real)
    }

    /// Create a spy with a diagnostic name.
    pub fn spy_named(name: impl Into<String>, real: Box<T>) -> Self {
        Self {
            interceptor: Self::named_interceptor(DoubleKind::Spy, name.into()),
            real: Some(real),
        }
    }

    /// Create a spy from settings.
    ///
    /// # Errors
    ///
    /// Currently infallible for spies; the `Result` mirrors
    /// [`mock_with`](Self::mock_with).
    pub fn spy_with(settings: DoubleSettings, real: Box<T>) -> Result<Self, BuildError> {
        Self::build(DoubleKind::Spy, settings, Some(real))
    }

    fn named_interceptor(kind: DoubleKind, name: String) -> Interceptor<StubStorage> {
        let name = if name.is_empty() {
            Self::short_type_name().to_string()
        } else {
            name
        };
        Interceptor::named(Arc::new(ShardedStorage::new()), kind, name)
    }

    /// Route one call through the interceptor.
    ///
    /// # Arguments
    /// * `invocation` - Method name and arguments
    /// * `default` - The method's default result, used by mocks
    /// * `real` - Runs the method on the real instance, used by spies
    pub fn invoke<R, D, F>(&self, invocation: Invocation, default: D, real: F) -> R
    where
        R: Any + Send,
        D: FnOnce() -> R,
        F: FnOnce(&T) -> R,
    {
        let real = self.real.as_deref().map(|instance| move || real(instance));
        self.interceptor.intercept(invocation, default, real)
    }

    /// Mock or spy.
    pub fn kind(&self) -> DoubleKind {
        self.interceptor.kind()
    }

    /// Name used in diagnostics.
    pub fn name(&self) -> &str {
        self.interceptor.name()
    }

    /// Every recorded call, stubbing probes included.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.interceptor.invocations()
    }

    /// Resolution counters.
    pub fn metrics(&self) -> &Metrics {
        self.interceptor.metrics()
    }

    /// The wrapped real instance, for spies.
    pub fn real(&self) -> Option<&T> {
        self.real.as_deref()
    }
}

impl<T: ?Sized> AsDouble for Double<T> {
    type Storage = StubStorage;

    fn interceptor(&self) -> &Interceptor<StubStorage> {
        &self.interceptor
    }
}

impl<T: ?Sized> fmt::Debug for Double<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Double")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("recorded", &self.interceptor.invocations().len())
            .field("stubs", &self.interceptor.stub_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kind::DefaultAnswer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Counter: Send + Sync {
        fn increment(&self) -> usize;
    }

    #[derive(Default)]
    struct RealCounter(AtomicUsize);

    impl Counter for RealCounter {
        fn increment(&self) -> usize {
            self.0.fetch_add(1, Ordering::SeqCst) + 1
        }
    }

    impl Counter for Double<dyn Counter> {
        fn increment(&self) -> usize {
            self.invoke(Invocation::new("increment", vec![]), || 0, |real| real.increment())
        }
    }

    #[test]
    fn test_default_name_is_trait_name() {
        let mock = Double::<dyn Counter>::mock();

        assert_eq!(mock.name(), "Counter");
        assert_eq!(mock.kind(), DoubleKind::Mock);
        assert!(mock.real().is_none());
    }

    #[test]
    fn test_named_and_settings() {
        let mock = Double::<dyn Counter>::mock_named("counter");
        assert_eq!(mock.name(), "counter");

        let settings = DoubleSettings::builder().with_name("strict").build().unwrap();
        let spy = Double::<dyn Counter>::spy_with(settings, Box::<RealCounter>::default()).unwrap();
        assert_eq!(spy.name(), "strict");
        assert_eq!(spy.kind(), DoubleKind::Spy);
    }

    #[test]
    fn test_mock_with_real_methods_rejected() {
        let settings = DoubleSettings::builder()
            .with_default_answer(DefaultAnswer::CallRealMethods)
            .build()
            .unwrap();

        assert_eq!(
            Double::<dyn Counter>::mock_with(settings).err(),
            Some(BuildError::RealMethodsWithoutInstance)
        );
    }

    #[test]
    fn test_spy_keeps_real_state() {
        let spy = Double::<dyn Counter>::spy(Box::<RealCounter>::default());

        assert_eq!(spy.increment(), 1);
        assert_eq!(spy.increment(), 2);
        assert_eq!(spy.invocations().len(), 2);
        assert_eq!(spy.metrics().delegated_calls(), 2);
        assert_eq!(spy.real().map(|real| real.increment()), Some(3));
    }

    #[test]
    fn test_debug_output() {
        let mock = Double::<dyn Counter>::mock();
        mock.increment();

        let rendered = format!("{:?}", mock);
        assert!(rendered.contains("name: \"Counter\""));
        assert!(rendered.contains("recorded: 1"));
    }
}
