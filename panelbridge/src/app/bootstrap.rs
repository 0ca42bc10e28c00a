//! Application bootstrap implementation.
//!
//! `PanelBridgeApp` wires the pipeline in dependency order and owns the
//! spawned tasks:
//!
//! 1. Control registry (loaded from the configured catalogs, or injected)
//! 2. Dispatcher, with every binding attached before any event flows
//! 3. Refresh scheduler, woken by the dispatcher's refresh signal
//! 4. Stream receiver feeding the dispatcher channel
//!
//! All three tasks share one `CancellationToken`.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::AppConfig;
use super::error::AppError;
use crate::binding::BindingSet;
use crate::control::{loader, ControlRegistry};
use crate::dispatcher::{DispatchListener, StreamDispatcher};
use crate::protocol::StreamEvent;
use crate::refresh::{LogRenderer, RefreshScheduler, Renderer, Surface};
use crate::telemetry::{DispatchMetrics, DispatchSnapshot};
use crate::transport::{TransportError, UdpStreamReceiver};

/// Name of the surface holding the configured bindings.
pub const DEFAULT_SURFACE: &str = "bindings";

/// Collects optional collaborators before starting the app.
pub struct AppBuilder {
    config: AppConfig,
    registry: Option<Arc<ControlRegistry>>,
    bindings: Option<BindingSet>,
    renderer: Arc<dyn Renderer>,
    listeners: Vec<Arc<dyn DispatchListener>>,
}

impl AppBuilder {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            registry: None,
            bindings: None,
            renderer: Arc::new(LogRenderer),
            listeners: Vec::new(),
        }
    }

    /// Use this registry instead of loading the configured catalogs.
    pub fn registry(mut self, registry: Arc<ControlRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use these bindings instead of reading the configured file.
    pub fn bindings(mut self, bindings: BindingSet) -> Self {
        self.bindings = Some(bindings);
        self
    }

    /// Draw bindings with `renderer`. Defaults to [`LogRenderer`].
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn listener(mut self, listener: Arc<dyn DispatchListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Start the session.
    ///
    /// # Errors
    ///
    /// Fails if the catalog or binding file cannot be read, a binding names
    /// an unknown control, or the socket cannot be bound. Individual binding
    /// lines that fail to parse are logged and skipped.
    pub async fn start(self) -> Result<PanelBridgeApp, AppError> {
        info!("Starting PanelBridgeApp");

        // 1. Registry
        let registry = match self.registry {
            Some(registry) => registry,
            None => {
                if self.config.definitions.is_empty() {
                    return Err(AppError::Config(
                        "no control definitions configured".to_string(),
                    ));
                }
                Arc::new(loader::load_from_paths(&self.config.definitions)?)
            }
        };

        let bindings = match self.bindings {
            Some(bindings) => bindings,
            None => load_bindings(&self.config, &registry)?,
        };

        // 2. Dispatcher with bindings attached
        let metrics = Arc::new(DispatchMetrics::new());
        let mut dispatcher =
            StreamDispatcher::new(Arc::clone(&registry)).with_metrics(Arc::clone(&metrics));
        for listener in self.listeners {
            dispatcher.add_listener(listener);
        }

        let surface = Arc::new(Surface::new(DEFAULT_SURFACE, self.renderer));
        for binding in bindings.iter() {
            surface.add_binding(dispatcher.attach_binding(binding)?);
        }
        info!(
            controls = registry.len(),
            bindings = bindings.len(),
            "Bindings attached"
        );

        // 3. Scheduler
        let scheduler = Arc::new(
            RefreshScheduler::new(self.config.refresh.clone(), dispatcher.refresh_signal())
                .with_metrics(Arc::clone(&metrics)),
        );
        scheduler.register_surface(Arc::clone(&surface));

        // 4. Receiver
        let (events, events_rx) = mpsc::channel(self.config.channel_capacity);
        let receiver = UdpStreamReceiver::bind(&self.config.stream, events.clone()).await?;
        let local_addr = receiver.local_addr()?;

        let cancellation = CancellationToken::new();
        let dispatcher_task = tokio::spawn(dispatcher.run(events_rx, cancellation.clone()));
        let scheduler_task = tokio::spawn(Arc::clone(&scheduler).run(cancellation.clone()));
        let receiver_task = tokio::spawn(receiver.run(cancellation.clone()));

        info!(address = %local_addr, "PanelBridgeApp started");

        Ok(PanelBridgeApp {
            registry,
            metrics,
            surface,
            scheduler,
            events,
            local_addr,
            cancellation,
            dispatcher_task,
            scheduler_task,
            receiver_task,
        })
    }
}

fn load_bindings(config: &AppConfig, registry: &ControlRegistry) -> Result<BindingSet, AppError> {
    let mut bindings = BindingSet::new();
    let Some(path) = &config.bindings_file else {
        return Ok(bindings);
    };

    let report = bindings
        .import_file(path, registry)
        .map_err(|source| AppError::Bindings {
            path: path.clone(),
            source,
        })?;
    for error in &report.errors {
        warn!(path = %path.display(), error = %error, "Skipping binding");
    }
    info!(
        path = %path.display(),
        imported = report.imported,
        skipped = report.errors.len(),
        "Bindings loaded"
    );
    Ok(bindings)
}

/// A running decode-and-refresh session.
pub struct PanelBridgeApp {
    registry: Arc<ControlRegistry>,
    metrics: Arc<DispatchMetrics>,
    surface: Arc<Surface>,
    scheduler: Arc<RefreshScheduler>,
    events: mpsc::Sender<StreamEvent>,
    local_addr: SocketAddr,
    cancellation: CancellationToken,
    dispatcher_task: JoinHandle<StreamDispatcher>,
    scheduler_task: JoinHandle<()>,
    receiver_task: JoinHandle<Result<(), TransportError>>,
}

impl PanelBridgeApp {
    /// Begin configuring an app.
    pub fn builder(config: AppConfig) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// Start with the configured catalogs, bindings and a [`LogRenderer`].
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        Self::builder(config).start().await
    }

    pub fn registry(&self) -> &Arc<ControlRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn snapshot(&self) -> DispatchSnapshot {
        self.metrics.snapshot()
    }

    /// The surface holding the configured bindings.
    pub fn surface(&self) -> &Arc<Surface> {
        &self.surface
    }

    pub fn scheduler(&self) -> &Arc<RefreshScheduler> {
        &self.scheduler
    }

    /// Address the stream receiver is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Inject events alongside the network stream.
    pub fn event_sender(&self) -> mpsc::Sender<StreamEvent> {
        self.events.clone()
    }

    /// Token shared by every task; cancelling it stops the session.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Stop all tasks and return the final counters.
    ///
    /// Tasks stop in pipeline order: receiver, dispatcher, scheduler. A last
    /// refresh pass then draws anything the dispatcher published before it
    /// stopped.
    pub async fn shutdown(self) -> DispatchSnapshot {
        info!("Shutting down PanelBridgeApp");
        self.cancellation.cancel();
        drop(self.events);

        match self.receiver_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Stream receiver error"),
            Err(e) => warn!(error = %e, "Stream receiver task failed"),
        }

        if let Err(e) = self.dispatcher_task.await {
            warn!(error = %e, "Dispatcher task failed");
        }

        if let Err(e) = self.scheduler_task.await {
            warn!(error = %e, "Refresh scheduler task failed");
        }

        self.scheduler.tick();
        self.scheduler.remove_surface(self.surface.name());

        let snapshot = self.metrics.snapshot();
        info!(summary = %snapshot, "PanelBridgeApp shutdown complete");
        snapshot
    }
}
