//! Refresh scheduler implementation.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::surface::Surface;
use crate::telemetry::DispatchMetrics;

/// Default interval between refresh passes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(50);

/// Configuration for the refresh scheduler.
#[derive(Clone, Debug)]
pub struct RefreshConfig {
    /// Upper bound on the time between passes. Failed renders are retried
    /// at this cadence.
    pub interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl RefreshConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub rendered: usize,
    pub failed: usize,
    /// Hidden surfaces passed over.
    pub skipped_hidden: usize,
}

/// Single cooperative loop that refreshes every registered surface.
///
/// Wakes when the dispatcher signals new dirty bindings and otherwise every
/// `interval`, so shutdown latency and retry latency are both bounded by one
/// interval.
pub struct RefreshScheduler {
    config: RefreshConfig,
    surfaces: Mutex<Vec<Arc<Surface>>>,
    refresh: Arc<Notify>,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl RefreshScheduler {
    /// Create a scheduler woken by `refresh`.
    pub fn new(config: RefreshConfig, refresh: Arc<Notify>) -> Self {
        Self {
            config,
            surfaces: Mutex::new(Vec::new()),
            refresh,
            metrics: None,
        }
    }

    /// Count renders in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn register_surface(&self, surface: Arc<Surface>) {
        debug!(surface = surface.name(), "Registered surface");
        self.surfaces.lock().push(surface);
    }

    /// Remove a surface by name and tear it down.
    pub fn remove_surface(&self, name: &str) -> Option<Arc<Surface>> {
        let removed = {
            let mut surfaces = self.surfaces.lock();
            let index = surfaces.iter().position(|s| s.name() == name)?;
            surfaces.remove(index)
        };
        removed.teardown();
        debug!(surface = name, "Removed surface");
        Some(removed)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.lock().len()
    }

    /// Run one pass over every surface.
    ///
    /// For each dirty binding on a visible surface the dirty flag is cleared
    /// with an atomic swap before rendering. A failed render sets it again.
    pub fn tick(&self) -> RefreshStats {
        let surfaces = self.surfaces.lock().clone();
        let mut stats = RefreshStats::default();

        for surface in &surfaces {
            if !surface.is_visible() {
                stats.skipped_hidden += 1;
                continue;
            }

            for state in surface.bindings() {
                if state.is_detached() || !state.take_dirty() {
                    continue;
                }
                let Some(snapshot) = state.pending() else {
                    continue;
                };

                match surface.renderer().render(state.target(), &snapshot.value) {
                    Ok(()) => {
                        state.record_rendered(snapshot);
                        stats.rendered += 1;
                    }
                    Err(e) => {
                        warn!(
                            surface = surface.name(),
                            binding = %state.target(),
                            error = %e,
                            "Render failed, will retry"
                        );
                        state.mark_dirty();
                        stats.failed += 1;
                    }
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            for _ in 0..stats.rendered {
                metrics.render_completed(true);
            }
            for _ in 0..stats.failed {
                metrics.render_completed(false);
            }
        }

        stats
    }

    /// Refresh until shutdown is signalled.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            surfaces = self.surface_count(),
            "Refresh scheduler starting"
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !shutdown.is_cancelled() {
            self.tick();

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,
                _ = self.refresh.notified() => {}
                _ = ticker.tick() => {}
            }
        }

        info!("Refresh scheduler stopped");
    }
}
