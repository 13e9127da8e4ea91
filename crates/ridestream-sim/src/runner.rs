use std::future::Future;
use std::time::Duration;

use rand::Rng;
use ridestream_bus::EventPublisher;
use serde::Serialize;

use crate::{console, EventGenerator, Tick};

pub const DEFAULT_PACE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub pace: Duration,
    /// Stop after this many ticks; `None` runs until shutdown.
    pub max_ticks: Option<u64>,
    /// Print the per-tick table to stdout.
    pub echo: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pace: DEFAULT_PACE,
            max_ticks: None,
            echo: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub published: u64,
    pub malformed: u64,
    pub publish_failures: u64,
}

/// Drives the generator until `shutdown` resolves or the tick limit is hit.
///
/// Publishing never blocks the loop and failed publishes are not retried.
pub async fn run<R, P, F>(
    generator: &mut EventGenerator<R>,
    publisher: &P,
    options: RunOptions,
    shutdown: F,
) -> RunSummary
where
    R: Rng,
    P: EventPublisher + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut summary = RunSummary::default();

    if options.echo {
        println!("{}", console::header());
    }

    loop {
        if options.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }

        let tick = generator.tick();
        summary.ticks += 1;
        if matches!(tick, Tick::Malformed { .. }) {
            summary.malformed += 1;
        }

        match publisher.publish(tick.payload()).await {
            Ok(()) => summary.published += 1,
            Err(e) => {
                summary.publish_failures += 1;
                tracing::warn!(tick = summary.ticks, "publish failed: {e}");
            }
        }

        if options.echo {
            println!("{}", console::row(&tick));
        }

        if options.max_ticks.is_some_and(|max| summary.ticks >= max) {
            break;
        }

        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(ticks = summary.ticks, "simulation stopped");
                break;
            }
            _ = tokio::time::sleep(options.pace) => {}
        }
    }

    summary
}
