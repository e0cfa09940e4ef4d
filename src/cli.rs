//! Command-line interface definitions.
//!
//! Global options locate the configuration and data directory; each
//! subcommand is one user-facing action.
//!
//! # Examples
//!
//! ```sh
//! # Fetch one category of one source
//! news_scraper fetch --source "CNN News" --category nasional
//!
//! # Fetch every configured source/category
//! news_scraper fetch-all
//!
//! # Write today's summary and post it to a chat webhook
//! news_scraper --webhook-url https://hooks.example.com/T000 summary --webhook
//!
//! # Keep fetching every 6 hours
//! news_scraper --config config.yaml schedule --interval-hours 6 --summary
//! ```

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding news.json, logs.jsonl and daily summaries
    #[arg(short, long, global = true, env = "NEWS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Root URL of the news API
    #[arg(long, global = true, env = "NEWS_BASE_URL")]
    pub base_url: Option<String>,

    /// SMTP password for email delivery
    #[arg(long, global = true, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// Chat webhook URL for summary notifications
    #[arg(long, global = true, env = "WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List configured sources, categories and endpoints
    Sources,
    /// Fetch one source (and optionally one category) and save new articles
    Fetch {
        #[arg(short, long)]
        source: String,
        #[arg(short = 'g', long)]
        category: Option<String>,
    },
    /// Fetch every configured source/category, one request at a time
    FetchAll,
    /// Write the daily summary and optionally deliver it
    Summary {
        /// Day to summarize (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Send the summary by email
        #[arg(long)]
        email: bool,
        /// Post the summary to the chat webhook
        #[arg(long)]
        webhook: bool,
    },
    /// Show log-derived reports
    Report {
        #[arg(value_enum)]
        view: ReportView,
        /// Skip malformed log lines instead of failing
        #[arg(long)]
        tolerant: bool,
    },
    /// Run fetch-all on a fixed interval until interrupted
    Schedule {
        #[arg(long)]
        interval_hours: Option<u64>,
        /// Regenerate and deliver today's summary after each run
        #[arg(long)]
        summary: bool,
        #[arg(long, requires = "summary")]
        email: bool,
        #[arg(long, requires = "summary")]
        webhook: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportView {
    /// Most recent log entries, newest first
    Logs,
    /// Daily totals with a trend chart
    Daily,
    /// Per-source totals over the reporting window
    Sources,
    /// New vs duplicate articles per day
    Trend,
}
