//! # News Scraper
//!
//! Pulls articles from the Indonesian news JSON APIs, deduplicates them into
//! a local article store, and keeps a per-fetch log from which daily and
//! per-source statistics are reported.
//!
//! ## Usage
//!
//! ```sh
//! news_scraper fetch --source "Tempo News" --category bisnis
//! news_scraper fetch-all
//! news_scraper report daily
//! news_scraper summary --email --webhook
//! ```
//!
//! ## Data directory
//!
//! ```text
//! data/
//! ├── news.json              # article store
//! ├── logs.jsonl             # one line per fetch
//! └── daily_summary/
//!     └── 2025-05-06.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: one GET per (source, category), response normalized to a list
//! 2. **Merging**: append to the store and deduplicate by identity key
//! 3. **Logging**: one log line per fetch, one summary line per fetch-all run
//! 4. **Reporting**: rollups over the log, rendered as text or delivered

use chrono::Local;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod cli;
mod config;
mod error;
mod event_log;
mod fetcher;
mod models;
mod notify;
mod report;
mod scheduler;
mod scraper;
mod sources;
mod store;
mod utils;

use aggregate::{daily_rollup, per_source_totals, to_table};
use cli::{Cli, Command, ReportView};
use config::AppConfig;
use error::Result;
use scheduler::ScheduleOptions;
use scraper::{Deliver, Scraper};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.command, ?args.config, "Parsed CLI arguments");

    // Action boundary: every error ends up here as a message, never a panic.
    let code = match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Action failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    };

    let elapsed = start_time.elapsed();
    info!(?elapsed, "Execution complete");
    code
}

#[instrument(level = "info", skip_all)]
async fn run(args: Cli) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_cli(&args);
    config.validate()?;

    run_action(args.command, Arc::new(config)).await
}

/// Open the scraper over a data directory that is known to be writable.
async fn open_scraper(config: &Arc<AppConfig>) -> Result<Scraper> {
    ensure_writable_dir(&config.data_dir).await?;
    Scraper::new(Arc::clone(config))
}

async fn run_action(command: Command, config: Arc<AppConfig>) -> Result<()> {
    match command {
        Command::Sources => print_sources(&config.base_url),
        Command::Fetch { source, category } => {
            let scraper = open_scraper(&config).await?;
            let stats = scraper.fetch_one(&source, category.as_deref()).await?;
            println!(
                "Fetched {} items, added {}, duplicates {}. Total articles: {}",
                stats.incoming, stats.added, stats.duplicates, stats.total_after
            );
        }
        Command::FetchAll => {
            let scraper = open_scraper(&config).await?;
            let report = scraper.fetch_all().await?;
            println!(
                "Fetch All finished ({} endpoints). incoming={} added={}. Errors: {}",
                report.endpoints,
                report.stats.incoming,
                report.stats.added,
                report.errors.len()
            );
            for failure in report.errors.iter().take(5) {
                println!("  {} ({}): {}", failure.source, failure.url, failure.error);
            }
        }
        Command::Summary { date, email, webhook } => {
            let day = date.unwrap_or_else(|| Local::now().date_naive());
            let scraper = open_scraper(&config).await?;
            let report = scraper.generate_summary(day, Deliver { email, webhook }).await?;
            println!("Daily summary written: {}", report.path.display());
            println!(
                "{}",
                serde_json::to_string_pretty(&report.summary).unwrap_or_default()
            );
            for d in &report.deliveries {
                match &d.result {
                    Ok(()) => println!("{} sent.", d.channel),
                    Err(e) => println!("{} send failed: {e}", d.channel),
                }
            }
        }
        Command::Report { view, tolerant } => {
            let scraper = open_scraper(&config).await?;
            let entries = if tolerant {
                let (entries, skipped) = scraper.log().read_all_tolerant().await?;
                if skipped > 0 {
                    warn!(skipped, "Ignored malformed log lines");
                }
                entries
            } else {
                scraper.log().read_all().await?
            };
            let table = to_table(entries);
            let out = match view {
                ReportView::Logs => report::recent_logs(&table, config.report.recent_limit),
                ReportView::Daily => {
                    let rows = daily_rollup(&table);
                    format!("{}\n{}", report::daily_table(&rows), report::daily_trend(&rows))
                }
                ReportView::Sources => {
                    let window = config.report.per_source_window_days;
                    let rows = per_source_totals(&table, window, Local::now().date_naive());
                    report::source_table(&rows, window)
                }
                ReportView::Trend => report::stacked_trend(&daily_rollup(&table)),
            };
            print!("{out}");
        }
        Command::Schedule {
            interval_hours,
            summary,
            email,
            webhook,
        } => {
            let interval = scheduler::interval_from_hours(
                interval_hours.unwrap_or(config.schedule.interval_hours),
            );
            let scraper = open_scraper(&config).await?;
            let options = ScheduleOptions {
                summary: summary.then_some(Deliver { email, webhook }),
            };
            let (tx, rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received");
                    let _ = tx.send(true);
                }
            });
            scheduler::run(Arc::new(scraper), interval, options, rx).await;
        }
    }
    Ok(())
}

fn print_sources(base_url: &str) {
    for source in sources::SOURCES.iter() {
        if source.categories.is_empty() {
            println!("{}  (no categories)", source.name);
        } else {
            println!("{}  [{}]", source.name, source.categories.join(", "));
        }
    }
    println!();
    for ep in sources::bulk_endpoints(base_url) {
        println!("{:<22} {:<28} {}", ep.source, ep.category, ep.url);
    }
}
