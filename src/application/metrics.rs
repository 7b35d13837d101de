//! Observability metrics for a double.
//!
//! Counts how each intercepted call was resolved, for debugging tests that
//! behave unexpectedly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking how a double answered its calls.
///
/// All metrics use atomic operations for thread-safe updates and reads.
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    /// Calls appended to the invocation record
    invocations_recorded: AtomicU64,
    /// Recorded calls made by result-first stubbing probes
    probe_calls: AtomicU64,
    /// Calls answered by a stub rule
    stubbed_responses: AtomicU64,
    /// Calls answered with the method default
    default_responses: AtomicU64,
    /// Calls delegated to the real instance
    delegated_calls: AtomicU64,
}

impl Metrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                invocations_recorded: AtomicU64::new(0),
                probe_calls: AtomicU64::new(0),
                stubbed_responses: AtomicU64::new(0),
                default_responses: AtomicU64::new(0),
                delegated_calls: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn record_invocation(&self) {
        self.inner
            .invocations_recorded
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_probe(&self) {
        self.inner.probe_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stubbed(&self) {
        self.inner.stubbed_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_default(&self) {
        self.inner.default_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delegated(&self) {
        self.inner.delegated_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the number of recorded invocations.
    ///
    /// Stubbing probes are included; subtract [`probe_calls`](Self::probe_calls)
    /// for the calls verification sees.
    pub fn invocations_recorded(&self) -> u64 {
        self.inner.invocations_recorded.load(Ordering::Relaxed)
    }

    /// Get the number of recorded calls made by result-first stubbing probes.
    pub fn probe_calls(&self) -> u64 {
        self.inner.probe_calls.load(Ordering::Relaxed)
    }

    /// Get the number of calls answered by stubs.
    pub fn stubbed_responses(&self) -> u64 {
        self.inner.stubbed_responses.load(Ordering::Relaxed)
    }

    /// Get the number of calls answered with method defaults.
    pub fn default_responses(&self) -> u64 {
        self.inner.default_responses.load(Ordering::Relaxed)
    }

    /// Get the number of calls delegated to the real instance.
    pub fn delegated_calls(&self) -> u64 {
        self.inner.delegated_calls.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invocations_recorded: self.invocations_recorded(),
            probe_calls: self.probe_calls(),
            stubbed_responses: self.stubbed_responses(),
            default_responses: self.default_responses(),
            delegated_calls: self.delegated_calls(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Calls appended to the invocation record, probes included
    pub invocations_recorded: u64,
    /// Recorded calls made by result-first stubbing probes
    pub probe_calls: u64,
    /// Calls answered by a stub rule
    pub stubbed_responses: u64,
    /// Calls answered with the method default
    pub default_responses: u64,
    /// Calls delegated to the real instance
    pub delegated_calls: u64,
}

impl MetricsSnapshot {
    /// Recorded calls visible to verification.
    pub fn verifiable_invocations(&self) -> u64 {
        self.invocations_recorded.saturating_sub(self.probe_calls)
    }

    /// Total number of calls that were answered (stubbed, defaulted, or delegated).
    ///
    /// Calls that unwound from a stubbed throw count as stubbed.
    pub fn total_answered(&self) -> u64 {
        self.stubbed_responses
            .saturating_add(self.default_responses)
            .saturating_add(self.delegated_calls)
    }
}
