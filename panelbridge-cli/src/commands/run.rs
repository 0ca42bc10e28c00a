//! Run command - receive the export stream and drive bindings until Ctrl+C.

use std::path::PathBuf;
use std::time::Duration;

use panelbridge::app::{AppConfig, PanelBridgeApp};
use panelbridge::binding::BindingSet;
use panelbridge::telemetry::DispatchSnapshot;
use tokio_util::sync::CancellationToken;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Interval between status lines while running.
const STATUS_INTERVAL: Duration = Duration::from_secs(30);

/// Arguments for the run command.
pub struct RunArgs {
    pub definitions: Vec<PathBuf>,
    pub bindings: Option<PathBuf>,
    pub port: Option<u16>,
    pub no_multicast: bool,
}

/// Run the run command.
pub fn run(mut runner: CliRunner, args: RunArgs) -> Result<(), CliError> {
    runner.log_startup("run");

    if let Some(port) = args.port {
        runner.config_mut().stream.port = port;
    }
    if args.no_multicast {
        runner.config_mut().stream.multicast_group = None;
    }
    if let Some(bindings) = args.bindings {
        runner.config_mut().bindings.file = Some(bindings);
    }

    let registry = runner.load_registry(&args.definitions)?;
    let config = runner.config();
    let app_config = AppConfig::from_config_file(config);

    let mut bindings = BindingSet::new();
    if let Some(path) = &app_config.bindings_file {
        let report = bindings
            .import_file(path, &registry)
            .map_err(|e| CliError::Bindings(format!("{}: {}", path.display(), e)))?;
        for error in &report.errors {
            eprintln!("  Skipped: {}", error);
        }
    }

    // Print banner
    println!("PanelBridge v{}", panelbridge::VERSION);
    println!("================");
    println!();
    println!("Controls:  {}", registry.len());
    println!("Bindings:  {}", bindings.len());
    let stream = &config.stream;
    match stream.multicast_group {
        Some(group) => println!(
            "Stream:    {}:{} (multicast {})",
            stream.bind_address, stream.port, group
        ),
        None => println!("Stream:    {}:{}", stream.bind_address, stream.port),
    }
    println!("Refresh:   {} ms", config.refresh.interval_ms);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Set up signal handler for graceful shutdown
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping...");
        signal.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = tokio::runtime::Runtime::new().map_err(CliError::Runtime)?;
    let summary = runtime.block_on(async move {
        let app = PanelBridgeApp::builder(app_config)
            .registry(std::sync::Arc::new(registry))
            .bindings(bindings)
            .start()
            .await?;

        let mut status = tokio::time::interval(STATUS_INTERVAL);
        status.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = status.tick() => {
                    let snapshot = app.snapshot();
                    if snapshot.events_received > 0 {
                        println!("{}", snapshot);
                    }
                }
            }
        }

        Ok::<_, CliError>(app.shutdown().await)
    })?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(snapshot: &DispatchSnapshot) {
    if snapshot.events_received == 0 {
        println!();
        println!("No stream data received.");
        return;
    }

    println!();
    println!("Session Summary");
    println!("───────────────");
    println!(
        "  Events:          {} ({:.0}% no-op, {} ignored)",
        snapshot.events_received,
        snapshot.noop_rate() * 100.0,
        snapshot.events_ignored
    );
    println!("  Frames:          {}", snapshot.frames);
    println!("  Value changes:   {}", snapshot.values_changed);
    println!(
        "  Formulas:        {} evaluated ({} failed)",
        snapshot.formulas_evaluated, snapshot.formula_errors
    );
    println!(
        "  Renders:         {} ({} failed)",
        snapshot.renders, snapshot.render_failures
    );
    println!("  Event rate:      {:.1}/s", snapshot.events_per_second());
    println!("  Uptime: {}", snapshot.uptime_human());
}
