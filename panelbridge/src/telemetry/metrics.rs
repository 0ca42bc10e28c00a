//! Atomic dispatch counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::snapshot::DispatchSnapshot;

/// Counters for the dispatch and refresh paths.
///
/// All updates use relaxed ordering; counters are independent and only read
/// for reporting.
#[derive(Debug)]
pub struct DispatchMetrics {
    started: Instant,
    events_received: AtomicU64,
    events_ignored: AtomicU64,
    noop_updates: AtomicU64,
    values_changed: AtomicU64,
    formulas_evaluated: AtomicU64,
    formula_errors: AtomicU64,
    bindings_dirtied: AtomicU64,
    frames: AtomicU64,
    renders: AtomicU64,
    render_failures: AtomicU64,
}

impl Default for DispatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            events_received: AtomicU64::new(0),
            events_ignored: AtomicU64::new(0),
            noop_updates: AtomicU64::new(0),
            values_changed: AtomicU64::new(0),
            formulas_evaluated: AtomicU64::new(0),
            formula_errors: AtomicU64::new(0),
            bindings_dirtied: AtomicU64::new(0),
            frames: AtomicU64::new(0),
            renders: AtomicU64::new(0),
            render_failures: AtomicU64::new(0),
        }
    }

    pub fn event_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// An event arrived for an address nobody watches.
    pub fn event_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// A subscriber saw identical raw data and did nothing.
    pub fn noop_update(&self) {
        self.noop_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn value_changed(&self) {
        self.values_changed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn formula_evaluated(&self, ok: bool) {
        self.formulas_evaluated.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.formula_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn binding_dirtied(&self) {
        self.bindings_dirtied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_completed(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_completed(&self, ok: bool) {
        if ok {
            self.renders.fetch_add(1, Ordering::Relaxed);
        } else {
            self.render_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            uptime: self.started.elapsed(),
            events_received: self.events_received.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            noop_updates: self.noop_updates.load(Ordering::Relaxed),
            values_changed: self.values_changed.load(Ordering::Relaxed),
            formulas_evaluated: self.formulas_evaluated.load(Ordering::Relaxed),
            formula_errors: self.formula_errors.load(Ordering::Relaxed),
            bindings_dirtied: self.bindings_dirtied.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
            render_failures: self.render_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_metrics_start_at_zero() {
        let snapshot = DispatchMetrics::new().snapshot();
        assert_eq!(snapshot.events_received, 0);
        assert_eq!(snapshot.values_changed, 0);
        assert_eq!(snapshot.render_failures, 0);
    }

    #[test]
    fn test_formula_errors_count_as_evaluations() {
        let metrics = DispatchMetrics::new();
        metrics.formula_evaluated(true);
        metrics.formula_evaluated(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.formulas_evaluated, 2);
        assert_eq!(snapshot.formula_errors, 1);
    }

    #[test]
    fn test_render_outcomes() {
        let metrics = DispatchMetrics::new();
        metrics.render_completed(true);
        metrics.render_completed(false);
        metrics.render_completed(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.renders, 1);
        assert_eq!(snapshot.render_failures, 2);
    }

    #[test]
    fn test_thread_safe_counting() {
        let metrics = Arc::new(DispatchMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..125 {
                        m.event_received();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().events_received, 1000);
    }
}
