mod config;

use anyhow::{anyhow, bail, Context, Result};
use busitem_registry::{describe, Capabilities, PathTree, PointRegistry, DEFAULT_KEYMAP};
use busitem_service::MetricsHub;
use clap::{Parser, Subcommand, ValueEnum};
use config::{BusChoice, DaemonConfig};
use pv_bridge::PollScheduler;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use telemetry_provider::MockProvider;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pvinverter-bridge",
    version,
    about = "Publish PV inverter telemetry as bus items"
)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Message bus to attach to (overrides the config file)
    #[arg(long, value_enum, global = true)]
    bus: Option<BusChoice>,

    /// Well-known bus name to claim (overrides the config file)
    #[arg(long, global = true)]
    service_name: Option<String>,

    /// Telemetry source
    #[arg(long, value_enum, default_value_t = ProviderKind::Mock, global = true)]
    provider: ProviderKind,

    /// Log filter, e.g. `info` or `pv_bridge=debug` (defaults to RUST_LOG, then info)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Serve the object model and poll devices until interrupted (default)
    Run,
    /// Print the point schema and channel key map as JSON
    Schema,
    /// Print the introspection document for one node
    Introspect {
        /// Node path, e.g. `/Ac`
        #[arg(default_value = "/")]
        path: String,
    },
    /// Run the first poll passes offline and print the resulting metrics
    Metrics,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    /// Scripted single-inverter plant
    Mock,
}

fn setup_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.log_level.as_deref());

    let mut cfg = match &cli.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(bus) = cli.bus {
        cfg.bus = bus;
    }
    if let Some(name) = &cli.service_name {
        cfg.service_name = name.clone();
    }

    match cli.command.clone().unwrap_or(Commands::Run) {
        Commands::Run => run(cfg, cli.provider).await,
        Commands::Schema => print_schema(&cfg),
        Commands::Introspect { path } => print_introspection(&cfg, &path),
        Commands::Metrics => print_metrics(&cfg, cli.provider),
    }
}

fn build_registry(cfg: &DaemonConfig) -> Result<PointRegistry> {
    let mut registry = PointRegistry::with_default_schema().context("building point registry")?;
    cfg.apply_overrides(&mut registry)?;
    Ok(registry)
}

fn build_provider(kind: ProviderKind) -> MockProvider {
    match kind {
        ProviderKind::Mock => MockProvider::sma_inverter(),
    }
}

#[cfg(feature = "dbus")]
fn connect(cfg: &DaemonConfig) -> Result<busitem_service::DbusTransport> {
    use busitem_service::{BusKind, DbusTransport};
    let kind = match cfg.bus {
        BusChoice::System => BusKind::System,
        BusChoice::Session => BusKind::Session,
    };
    DbusTransport::connect(kind, &cfg.service_name)
        .with_context(|| format!("claiming {} on the {:?} bus", cfg.service_name, cfg.bus))
}

#[cfg(not(feature = "dbus"))]
fn connect(cfg: &DaemonConfig) -> Result<busitem_service::MemoryBus> {
    warn!(
        bus = ?cfg.bus,
        "built without the dbus feature; serving an in-process bus only"
    );
    Ok(busitem_service::MemoryBus::new(&cfg.service_name))
}

async fn run(cfg: DaemonConfig, provider: ProviderKind) -> Result<()> {
    let registry = build_registry(&cfg)?;
    let transport = connect(&cfg)?;
    let hub = MetricsHub::new().map_err(|e| anyhow!(e))?;
    let bridge_cfg = cfg.bridge_config();
    info!(service = %cfg.service_name, bus = ?cfg.bus, "starting bridge");

    let stop = Arc::new(AtomicBool::new(false));
    let worker_stop = stop.clone();
    let worker = tokio::task::spawn_blocking(move || -> Result<String> {
        let mut sched =
            PollScheduler::new(registry, build_provider(provider), transport, bridge_cfg)?
                .with_metrics(hub);
        sched.start()?;
        let outcome = sched.run(&worker_stop);
        sched.shutdown();
        let text = sched
            .metrics()
            .map(MetricsHub::encode_text)
            .unwrap_or_default();
        outcome?;
        Ok(text)
    });

    tokio::spawn(async move {
        wait_for_shutdown().await;
        info!("shutdown requested");
        stop.store(true, Ordering::SeqCst);
    });

    let text = worker.await.context("poll loop task failed")??;
    info!("final metrics:\n{text}");
    Ok(())
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn print_schema(cfg: &DaemonConfig) -> Result<()> {
    let registry = build_registry(cfg)?;
    let keymap: Vec<_> = DEFAULT_KEYMAP
        .iter()
        .map(|e| json!({ "channel": e.channel, "path": e.path }))
        .collect();
    let doc = json!({
        "service_name": cfg.service_name,
        "points": registry.points(),
        "keymap": keymap,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn print_introspection(cfg: &DaemonConfig, path: &str) -> Result<()> {
    let registry = build_registry(cfg)?;
    let tree = PathTree::build(&registry)?;
    let Some(node) = tree.find(path) else {
        bail!("no object at {path}");
    };
    println!("{}", describe(path, node, Capabilities::READ_ONLY)?);
    Ok(())
}

fn print_metrics(cfg: &DaemonConfig, provider: ProviderKind) -> Result<()> {
    let registry = build_registry(cfg)?;
    let hub = MetricsHub::new().map_err(|e| anyhow!(e))?;
    let bridge_cfg = pv_bridge::BridgeConfig {
        pump_wait: Duration::ZERO,
        ..cfg.bridge_config()
    };
    let transport = busitem_service::MemoryBus::new(&cfg.service_name);
    let mut sched = PollScheduler::new(registry, build_provider(provider), transport, bridge_cfg)?
        .with_metrics(hub.clone());
    sched.start()?;
    // Parameters on the first pass, spot values on the second.
    for _ in 0..2 {
        let report = sched.poll_pass()?;
        info!(changed = report.changed, notified = report.notified, "offline pass complete");
    }
    sched.shutdown();
    print!("{}", hub.encode_text());
    Ok(())
}
