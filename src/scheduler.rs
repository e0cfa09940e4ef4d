//! Periodic fetch-all runs inside the process.
//!
//! Replaces reloading a page on a timer: the interval fires as long as the
//! process runs, whether or not anyone is watching. A failed tick is logged
//! and the loop keeps going.

use crate::scraper::{Deliver, Scraper};
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// What each tick does besides fetching.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleOptions {
    /// Regenerate today's summary after each run and deliver it.
    pub summary: Option<Deliver>,
}

/// Longest accepted interval: one year.
pub const MAX_INTERVAL_HOURS: u64 = 24 * 365;

/// Tick period for an interval given in hours, clamped to `1..=MAX_INTERVAL_HOURS`.
pub fn interval_from_hours(hours: u64) -> Duration {
    Duration::from_secs(hours.clamp(1, MAX_INTERVAL_HOURS) * 60 * 60)
}

/// Run fetch-all every `interval` until `shutdown` flips to `true`.
///
/// The first run starts immediately. Returns the number of completed ticks.
pub async fn run(
    scraper: Arc<Scraper>,
    interval: Duration,
    options: ScheduleOptions,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    info!(interval_secs = interval.as_secs(), "Scheduler started");
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut ticks = 0u64;

    loop {
        tokio::select! {
            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    info!(ticks, "Scheduler stopping");
                    break;
                }
            }
            _ = ticker.tick() => {
                tick(&scraper, options).await;
                ticks += 1;
            }
        }
    }
    ticks
}

async fn tick(scraper: &Scraper, options: ScheduleOptions) {
    match scraper.fetch_all().await {
        Ok(report) => {
            info!(
                incoming = report.stats.incoming,
                added = report.stats.added,
                failed = report.errors.len(),
                "Scheduled fetch-all finished"
            );
        }
        Err(e) => {
            error!(error = %e, "Scheduled fetch-all failed");
            return;
        }
    }

    if let Some(deliver) = options.summary {
        let today = Local::now().date_naive();
        match scraper.generate_summary(today, deliver).await {
            Ok(report) => info!(path = %report.path.display(), "Scheduled summary written"),
            Err(e) => warn!(error = %e, "Scheduled summary failed"),
        }
    }
}
