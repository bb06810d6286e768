use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use buffer_sim::{
    SimulationId, SimulationRegistry,
    actors::StatusSnapshot,
    config::{BufferKind, Config, Preset, SimulationConfig, SimulationEntry, read_config_file},
    util::{get_log_level, get_poll_interval},
};
use clap::Parser;
use tracing::{debug, error, info, instrument, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(about = "Run bounded-buffer producer-consumer simulations")]
struct Args {
    /// Config file
    #[arg(short)]
    file: Option<String>,

    /// Start from a named preset (classic, balanced, consumer-heavy)
    #[arg(long)]
    preset: Option<Preset>,

    /// Producer interval in milliseconds
    #[arg(long)]
    producer_ms: Option<u64>,

    /// Consumer interval in milliseconds
    #[arg(long)]
    consumer_ms: Option<u64>,

    /// Buffer capacity
    #[arg(long)]
    capacity: Option<usize>,

    /// Buffer kind (in-memory, external-store)
    #[arg(long)]
    kind: Option<BufferKind>,

    /// Status poll interval in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Print every snapshot as a JSON line on stdout
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Simulation given directly on the command line
    fn entry(&self) -> SimulationEntry {
        SimulationEntry {
            preset: self.preset,
            producer_interval_ms: self.producer_ms,
            consumer_interval_ms: self.consumer_ms,
            buffer_capacity: self.capacity,
            buffer_kind: self.kind,
        }
    }
}

fn init() {
    dotenv::dotenv().ok();

    let level = get_log_level()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);

    let filter = filter::Targets::new().with_targets(vec![
        ("buffer_sim", level),
        ("simulator", level),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(path) => read_config_file(path).with_context(|| format!("failed to load {path}"))?,
        None => Config {
            simulations: None,
            poll_interval_ms: None,
        },
    };

    let configs = simulation_configs(&args, &config);

    let poll_interval = args
        .poll_ms
        .or(config.poll_interval_ms)
        .unwrap_or_else(get_poll_interval);

    let registry = Arc::new(SimulationRegistry::new());

    let mut ids = vec![];
    for sim_config in configs {
        match registry.start(sim_config).await {
            Ok(id) => ids.push(id),
            Err(e) => error!("{e}"),
        }
    }

    if ids.is_empty() {
        anyhow::bail!("no simulation could be started");
    }

    let poller = tokio::spawn(poll_status(
        registry.clone(),
        ids,
        Duration::from_millis(poll_interval),
        args.json,
    ));

    match args.duration_secs {
        Some(secs) => {
            debug!("running for {secs}s");
            tokio::time::sleep(Duration::from_secs(secs)).await;
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            info!("received Ctrl-C");
        }
    }

    poller.abort();
    registry.shutdown().await;

    Ok(())
}

/// Command-line flags win over the config file; without either, one default simulation runs
fn simulation_configs(args: &Args, config: &Config) -> Vec<SimulationConfig> {
    let has_cli_entry = args.preset.is_some()
        || args.producer_ms.is_some()
        || args.consumer_ms.is_some()
        || args.capacity.is_some()
        || args.kind.is_some();

    match &config.simulations {
        Some(entries) if !has_cli_entry => entries.iter().map(SimulationEntry::resolve).collect(),
        Some(entries) => {
            warn!(
                "simulation flags given, ignoring {} simulation(s) from the config file",
                entries.len()
            );
            vec![args.entry().resolve()]
        }
        None => vec![args.entry().resolve()],
    }
}

#[instrument(skip_all)]
async fn poll_status(
    registry: Arc<SimulationRegistry>,
    ids: Vec<SimulationId>,
    interval: Duration,
    json: bool,
) {
    debug!("polling {} simulations every {interval:?}", ids.len());

    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;

        for id in &ids {
            match registry.status(*id).await {
                Ok(snapshot) => report(&snapshot, json),
                Err(e) => warn!("{e}"),
            }
        }
    }
}

fn report(snapshot: &StatusSnapshot, json: bool) {
    if json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("failed to serialize snapshot: {e}"),
        }
        return;
    }

    info!(
        "{}: produced={} consumed={} lost={} buffer={}/{} ({:?}) throughput={:.1}/s efficiency={:.1}%",
        snapshot.id,
        snapshot.counters.produced,
        snapshot.counters.consumed,
        snapshot.counters.lost,
        snapshot.buffer_size,
        snapshot.buffer_capacity,
        snapshot.metrics.fill_level,
        snapshot.metrics.throughput,
        snapshot.metrics.efficiency,
    );
}
