use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod config;

use config::{load_config, RidestreamConfig};
use ridestream_alerts::{Notifier, WebhookNotifier};
use ridestream_bus::{BusMessage, EventBus, Topic};
use ridestream_ingest::{spawn_trip_listener, IngestionHandler};
use ridestream_schema::TIMESTAMP_FORMAT;
use ridestream_sim::{run, EventGenerator, RunOptions};
use ridestream_store::{SqliteTripStore, TripStore};

#[derive(Parser)]
#[command(name = "ridestream", version, about = "Ride-hailing trip stream simulator and ingestion pipeline")]
struct Cli {
    #[arg(
        long,
        default_value = "config",
        help = "Config root directory (contains main.yaml and logs/)"
    )]
    config_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generate trips and feed them through ingestion until Ctrl-C")]
    Simulate {
        #[arg(long, help = "Stop after this many ticks")]
        count: Option<u64>,
        #[arg(long, help = "Seed for a reproducible stream (overrides config)")]
        seed: Option<u64>,
        #[arg(long, help = "Publish only; do not persist or alert")]
        no_ingest: bool,
    },
    #[command(about = "Ingest newline-delimited payloads from a file, or - for stdin")]
    Ingest {
        #[arg(help = "Input file")]
        file: PathBuf,
    },
    #[command(about = "Show the most recently stored trips")]
    Trips {
        #[arg(long, default_value = "20", help = "Number of rows")]
        limit: usize,
    },
    #[command(about = "Validate config file")]
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.config_root.join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "ridestream.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking),
        )
        .init();

    match cli.command {
        Commands::Validate => {
            let config = load_config(&cli.config_root)?;
            println!(
                "Config valid. topic {}, table {} in {}, notifications {}.",
                config.transport.topic,
                config.storage.table,
                config.storage.db_path,
                if config.notify.webhook().is_some() { "enabled" } else { "disabled" }
            );
        }
        Commands::Simulate {
            count,
            seed,
            no_ingest,
        } => {
            let config = load_config(&cli.config_root)?;
            simulate(&config, count, seed, no_ingest).await?;
        }
        Commands::Ingest { file } => {
            let config = load_config(&cli.config_root)?;
            ingest_file(&config, &file).await?;
        }
        Commands::Trips { limit } => {
            let config = load_config(&cli.config_root)?;
            let store = open_store(&config)?;
            print_trips(&store.recent(limit).await?);
        }
    }

    Ok(())
}

fn open_store(config: &RidestreamConfig) -> Result<SqliteTripStore> {
    SqliteTripStore::open(Path::new(&config.storage.db_path), &config.storage.table)
}

fn build_handler(config: &RidestreamConfig) -> Result<IngestionHandler> {
    let store = Arc::new(open_store(config)?);
    let notifier: Option<Arc<dyn Notifier>> = match config.notify.webhook() {
        Some(url) => Some(Arc::new(WebhookNotifier::new(url))),
        None => {
            tracing::info!("notify.webhook_url is empty, alerts will not be delivered");
            None
        }
    };
    Ok(IngestionHandler::new(store, notifier))
}

async fn simulate(
    config: &RidestreamConfig,
    count: Option<u64>,
    seed: Option<u64>,
    no_ingest: bool,
) -> Result<()> {
    let bus = EventBus::new(config.transport.capacity);
    let topic = Topic::new(&config.transport.topic);
    let dlq = topic.dead_letter();

    let consumers = if no_ingest {
        None
    } else {
        let handler = Arc::new(build_handler(config)?);
        let dead_letters = spawn_dead_letter_logger(&bus, dlq.clone()).await;
        let listener = spawn_trip_listener(handler, &bus, topic.clone()).await;
        Some((listener, dead_letters))
    };

    let sim = &config.simulation;
    let mut generator =
        EventGenerator::from_config(sim.generator_config(), sim.clock(), seed.or(sim.seed))?;
    let publisher = bus.publisher().for_topic(topic.clone());
    let options = RunOptions {
        pace: Duration::from_millis(sim.pace_ms),
        max_ticks: count,
        echo: true,
    };

    tracing::info!(app = %config.app.name, env = %config.app.env, topic = %topic, "simulation started");
    let summary = run(&mut generator, &publisher, options, shutdown_signal()).await;

    println!();
    println!(
        "Simulation stopped. {} ticks, {} published, {} malformed, {} publish failures.",
        summary.ticks, summary.published, summary.malformed, summary.publish_failures
    );

    if let Some((listener, dead_letters)) = consumers {
        bus.close(&topic).await;
        let stats = listener.await.context("trip listener panicked")?;
        bus.close(&dlq).await;
        dead_letters.await.context("dead-letter logger panicked")?;
        println!(
            "Ingestion: {} received, {} stored, {} alerts ({} delivered), {} dead-lettered.",
            stats.received, stats.stored, stats.alerts, stats.notified, stats.dead_lettered
        );
    }

    Ok(())
}

async fn spawn_dead_letter_logger(bus: &EventBus, topic: Topic) -> JoinHandle<()> {
    let mut rx = bus.subscribe(&topic).await;
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let BusMessage::DeadLetter {
                message_id, error, ..
            } = msg
            else {
                continue;
            };
            tracing::warn!(topic = %topic, %message_id, "dead letter: {error}");
        }
    })
}

async fn ingest_file(config: &RidestreamConfig, file: &Path) -> Result<()> {
    let input = if file == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?
    };

    let handler = build_handler(config)?;
    let (mut total, mut failed, mut alerts) = (0usize, 0usize, 0usize);

    for (idx, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        total += 1;
        match handler.handle(line.as_bytes()).await {
            Ok(ack) => {
                if let Some(category) = ack.alert {
                    alerts += 1;
                    println!("line {}: {} stored, alert {category}", idx + 1, ack.ride_id);
                }
            }
            Err(e) => {
                failed += 1;
                println!("line {}: {e}", idx + 1);
            }
        }
    }

    println!(
        "Ingested {} of {total} payloads, {alerts} alerts, {failed} failed.",
        total - failed
    );
    if failed > 0 {
        anyhow::bail!("{failed} payload(s) failed");
    }
    Ok(())
}

fn print_trips(trips: &[ridestream_schema::TripRow]) {
    if trips.is_empty() {
        println!("No trips stored.");
        return;
    }

    println!(
        "{:<19}  {:<8}  {:<14}  {:<6}  {:<9}  {:<45}  ALERTS",
        "TIMESTAMP", "RIDE", "CAR TYPE", "SURGE", "DIST", "ROUTE"
    );
    for trip in trips {
        let surge = trip
            .surge_multiplier
            .map_or_else(|| "N/A".to_string(), |s| format!("x{s:.2}"));
        let dist = trip
            .distance
            .map_or_else(|| "N/A".to_string(), |d| format!("{d:.2} mi"));
        let ride: String = trip.ride_id.chars().take(8).collect();
        let route = format!("{} -> {}", trip.source, trip.destination);
        println!(
            "{:<19}  {:<8}  {:<14}  {:<6}  {:<9}  {:<45}  {}",
            trip.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            ride,
            trip.name,
            surge,
            dist,
            route,
            trip.alert_trigger.as_deref().unwrap_or("")
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {e}");
                ctrl_c.await.ok();
                tracing::info!("Received SIGINT, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        tracing::info!("Received SIGINT, shutting down...");
    }
}
