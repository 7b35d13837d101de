//! Ordered log of calls made on a double.
//!
//! Entries are appended and never removed for the lifetime of the double.
//! Calls made only to capture a stubbing target (result-first probes) stay in
//! the log but are flagged so verification does not count them.

use crate::domain::{invocation::Invocation, matcher::CallMatcher};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append-only invocation record.
#[derive(Debug, Default)]
pub struct InvocationRecorder {
    entries: Mutex<Vec<Invocation>>,
    /// Sequence numbers of probe calls
    probes: Mutex<BTreeSet<u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Stubbed throws and real-method panics never unwind while a guard is held
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InvocationRecorder {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call.
    pub fn record(&self, invocation: Invocation) {
        lock(&self.entries).push(invocation);
    }

    /// Flag a recorded call as a stubbing probe.
    pub fn mark_probe(&self, sequence: u64) {
        lock(&self.probes).insert(sequence);
    }

    /// Check whether a call was flagged as a probe.
    pub fn is_probe(&self, sequence: u64) -> bool {
        lock(&self.probes).contains(&sequence)
    }

    /// Every recorded call, probes included, in call order.
    pub fn snapshot(&self) -> Vec<Invocation> {
        lock(&self.entries).clone()
    }

    /// Recorded calls that count for verification, in call order.
    pub fn verifiable(&self) -> Vec<Invocation> {
        let probes = lock(&self.probes).clone();
        lock(&self.entries)
            .iter()
            .filter(|invocation| !probes.contains(&invocation.sequence()))
            .cloned()
            .collect()
    }

    /// Count verifiable calls selected by `matcher`.
    pub fn count_matching(&self, matcher: &CallMatcher) -> usize {
        self.verifiable()
            .iter()
            .filter(|invocation| matcher.matches(invocation))
            .count()
    }

    /// Number of recorded calls, probes included.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::invocation::ArgValue;

    fn add(item: &str) -> Invocation {
        Invocation::new("add", vec![ArgValue::new(item.to_string())])
    }

    #[test]
    fn test_records_in_order() {
        let recorder = InvocationRecorder::new();
        recorder.record(add("one"));
        recorder.record(Invocation::new("clear", vec![]));
        recorder.record(add("two"));

        let rendered: Vec<String> = recorder.snapshot().iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["add(\"one\")", "clear()", "add(\"two\")"]);
        assert_eq!(recorder.len(), 3);
        assert!(!recorder.is_empty());
    }

    #[test]
    fn test_count_matching() {
        let recorder = InvocationRecorder::new();
        recorder.record(add("one"));
        recorder.record(add("one"));
        recorder.record(add("two"));

        assert_eq!(recorder.count_matching(&CallMatcher::new("add").arg("one".to_string())), 2);
        assert_eq!(recorder.count_matching(&CallMatcher::new("add").arg("three".to_string())), 0);
        assert_eq!(recorder.count_matching(&CallMatcher::new("clear")), 0);
    }

    #[test]
    fn test_probes_stay_recorded_but_do_not_count() {
        let recorder = InvocationRecorder::new();
        let probe = Invocation::new("get", vec![ArgValue::new(0_usize)]);
        let probe_sequence = probe.sequence();
        recorder.record(probe);
        recorder.mark_probe(probe_sequence);
        recorder.record(Invocation::new("get", vec![ArgValue::new(0_usize)]));

        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.verifiable().len(), 1);
        assert!(recorder.is_probe(probe_sequence));
        assert_eq!(recorder.count_matching(&CallMatcher::new("get").arg(0_usize)), 1);
    }

    #[test]
    fn test_concurrent_recording() {
        use std::sync::Arc;
        use std::thread;

        let recorder = Arc::new(InvocationRecorder::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let recorder = Arc::clone(&recorder);
                thread::spawn(move || {
                    for _ in 0..50 {
                        recorder.record(Invocation::new("size", vec![]));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(recorder.len(), 400);
    }
}
