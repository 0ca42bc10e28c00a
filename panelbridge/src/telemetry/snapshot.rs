//! Point-in-time view of the dispatch counters.

use std::fmt;
use std::time::Duration;

/// Copy of [`DispatchMetrics`](super::DispatchMetrics) at one moment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub uptime: Duration,
    pub events_received: u64,
    pub events_ignored: u64,
    pub noop_updates: u64,
    pub values_changed: u64,
    pub formulas_evaluated: u64,
    pub formula_errors: u64,
    pub bindings_dirtied: u64,
    pub frames: u64,
    pub renders: u64,
    pub render_failures: u64,
}

impl DispatchSnapshot {
    /// Fraction of received events that changed nothing.
    pub fn noop_rate(&self) -> f64 {
        if self.events_received == 0 {
            0.0
        } else {
            self.noop_updates as f64 / self.events_received as f64
        }
    }

    /// Events per second since the metrics were created.
    pub fn events_per_second(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.events_received as f64 / secs
        } else {
            0.0
        }
    }

    /// Uptime formatted as `HH:MM:SS`.
    pub fn uptime_human(&self) -> String {
        let secs = self.uptime.as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
    }
}

impl fmt::Display for DispatchSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] events: {} ({:.0}% no-op, {} ignored) | changes: {} | formulas: {} ({} failed) | renders: {} ({} failed)",
            self.uptime_human(),
            self.events_received,
            self.noop_rate() * 100.0,
            self.events_ignored,
            self.values_changed,
            self.formulas_evaluated,
            self.formula_errors,
            self.renders,
            self.render_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_rate_with_no_events() {
        assert_eq!(DispatchSnapshot::default().noop_rate(), 0.0);
    }

    #[test]
    fn test_uptime_human() {
        let snapshot = DispatchSnapshot {
            uptime: Duration::from_secs(3 * 3600 + 25 * 60 + 7),
            ..Default::default()
        };
        assert_eq!(snapshot.uptime_human(), "03:25:07");
    }

    #[test]
    fn test_display_contains_counts() {
        let snapshot = DispatchSnapshot {
            events_received: 10,
            noop_updates: 9,
            values_changed: 1,
            ..Default::default()
        };
        let text = snapshot.to_string();
        assert!(text.contains("events: 10 (90% no-op"));
        assert!(text.contains("changes: 1"));
    }
}
