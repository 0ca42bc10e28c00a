//! Dispatch telemetry.
//!
//! Lock-free counters updated on the dispatch path and read from anywhere.
//!
//! # Architecture
//!
//! ```text
//! StreamDispatcher ─────► DispatchMetrics ─────► DispatchSnapshot ─────► Views
//! RefreshScheduler        (atomic counters)     (point-in-time copy)    (CLI, logs)
//! ```
//!
//! # Example
//!
//! ```
//! use panelbridge::telemetry::DispatchMetrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(DispatchMetrics::new());
//!
//! metrics.event_received();
//! metrics.event_received();
//! metrics.noop_update();
//! metrics.value_changed();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.events_received, 2);
//! assert_eq!(snapshot.noop_rate(), 0.5);
//! ```

mod metrics;
mod snapshot;

pub use metrics::DispatchMetrics;
pub use snapshot::DispatchSnapshot;
