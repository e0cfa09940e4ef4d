//! User-facing actions: fetch one source, fetch everything, build the summary.
//!
//! [`Scraper`] owns the store, the log and the HTTP client. Every action that
//! mutates the store holds `write_lock` for its whole read-modify-write
//! cycle, so the scheduler and a manual action never interleave.

use crate::aggregate::to_table;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::event_log::EventLog;
use crate::fetcher::Fetcher;
use crate::models::{DailySummary, FETCH_ALL_CATEGORY, FETCH_ALL_SOURCE, LogEntry, MergeStats};
use crate::notify;
use crate::sources;
use crate::store::{ArticleStore, merge_and_dedupe};
use chrono::{Local, NaiveDate, NaiveDateTime};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

/// One failed endpoint during a fetch-all run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub source: String,
    pub url: String,
    pub error: String,
}

/// Outcome of a fetch-all run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReport {
    pub endpoints: usize,
    pub stats: MergeStats,
    pub errors: Vec<FetchFailure>,
}

/// Which delivery channels to use for a summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deliver {
    pub email: bool,
    pub webhook: bool,
}

#[derive(Debug)]
pub struct DeliveryOutcome {
    pub channel: &'static str,
    pub result: Result<()>,
}

/// Outcome of generating (and optionally delivering) a daily summary.
#[derive(Debug)]
pub struct SummaryReport {
    pub path: PathBuf,
    pub summary: DailySummary,
    pub deliveries: Vec<DeliveryOutcome>,
}

pub struct Scraper {
    config: Arc<AppConfig>,
    fetcher: Fetcher,
    store: ArticleStore,
    log: EventLog,
    write_lock: Mutex<()>,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl Scraper {
    pub fn new(config: Arc<AppConfig>) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new()?,
            store: ArticleStore::new(config.news_path()),
            log: EventLog::new(config.log_path()),
            config,
            write_lock: Mutex::new(()),
        })
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Fetch one (source, category), merge into the store, log the counts.
    ///
    /// Without a category the source's root endpoint is fetched and the
    /// entry is logged under category `all`.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_one(&self, source: &str, category: Option<&str>) -> Result<MergeStats> {
        let source = sources::find(source)?;
        let endpoint = sources::endpoint(&self.config.base_url, source, category)?;
        info!(url = %endpoint.url, "Fetching");

        let _guard = self.write_lock.lock().await;
        let articles = self
            .fetcher
            .fetch(&endpoint.url, self.config.fetch.single_timeout())
            .await?;

        let doc = self.store.load().await?;
        let (doc, stats) = merge_and_dedupe(doc, articles, now());
        self.store.save(&doc).await?;
        self.log
            .append(&LogEntry::complete(now(), endpoint.source, &endpoint.category, stats))
            .await?;

        info!(
            incoming = stats.incoming,
            added = stats.added,
            duplicates = stats.duplicates,
            total = stats.total_after,
            "Fetch complete"
        );
        Ok(stats)
    }

    /// Fetch every configured endpoint one at a time, then merge once.
    ///
    /// A failing endpoint is recorded in the report and does not stop the
    /// run. Each successful fetch appends its partial entry as soon as it
    /// returns; the run ends with a complete `FETCH_ALL_SUMMARY` entry.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_all(&self) -> Result<BulkReport> {
        let endpoints = sources::bulk_endpoints(&self.config.base_url);
        let total = endpoints.len();
        info!(endpoints = total, "Starting fetch-all run");

        let _guard = self.write_lock.lock().await;
        let doc = self.store.load().await?;

        let timeout = self.config.fetch.bulk_timeout();
        let mut results = std::pin::pin!(stream::iter(endpoints).then(|ep| async move {
            let res = self.fetcher.fetch(&ep.url, timeout).await;
            (ep, res)
        }));

        let mut fetched = Vec::new();
        let mut errors = Vec::new();
        while let Some((ep, res)) = results.next().await {
            match res {
                Ok(articles) => {
                    let entry = LogEntry::partial(now(), ep.source, &ep.category, articles.len() as u64);
                    self.log.append(&entry).await?;
                    fetched.extend(articles);
                }
                Err(e) => {
                    warn!(source = ep.source, url = %ep.url, error = %e, "Endpoint failed; continuing");
                    errors.push(FetchFailure {
                        source: ep.source.to_string(),
                        url: ep.url,
                        error: e.to_string(),
                    });
                }
            }
        }

        let (doc, stats) = merge_and_dedupe(doc, fetched, now());
        self.store.save(&doc).await?;
        self.log
            .append(&LogEntry::complete(now(), FETCH_ALL_SOURCE, FETCH_ALL_CATEGORY, stats))
            .await?;

        info!(
            incoming = stats.incoming,
            added = stats.added,
            failed = errors.len(),
            "Fetch-all run complete"
        );
        Ok(BulkReport {
            endpoints: total,
            stats,
            errors,
        })
    }

    /// Build the summary for `day`, write it, and deliver it where asked.
    ///
    /// Delivery failures are returned per channel; the summary file is kept.
    #[instrument(level = "info", skip(self))]
    pub async fn generate_summary(&self, day: NaiveDate, deliver: Deliver) -> Result<SummaryReport> {
        let table = to_table(self.log.read_all().await?);
        let summary = notify::build_daily_summary(&table, day, now());
        let path = notify::write_daily_summary(&self.config.summary_dir(), &summary).await?;
        let stored = self.store.load().await?.articles.len();

        let mut deliveries = Vec::new();
        if deliver.email {
            let result = self.deliver_email(&summary, &path, stored).await;
            deliveries.push(DeliveryOutcome { channel: "email", result });
        }
        if deliver.webhook {
            let result = match &self.config.webhook_url {
                Some(url) => {
                    let text = notify::chat_text(&summary, stored);
                    notify::send_chat_webhook(self.fetcher.client(), url, &text).await
                }
                None => Err(Error::delivery("webhook", "no webhook URL configured")),
            };
            deliveries.push(DeliveryOutcome { channel: "webhook", result });
        }
        for d in &deliveries {
            if let Err(e) = &d.result {
                error!(channel = d.channel, error = %e, "Summary delivery failed");
            }
        }

        Ok(SummaryReport {
            path,
            summary,
            deliveries,
        })
    }

    async fn deliver_email(&self, summary: &DailySummary, path: &std::path::Path, stored: usize) -> Result<()> {
        let smtp = self
            .config
            .smtp
            .as_ref()
            .ok_or_else(|| Error::delivery("email", "no SMTP settings configured"))?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::store_io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.json", summary.date));
        notify::send_email(
            smtp,
            &notify::email_subject(summary.date),
            &notify::email_body(summary, stored),
            &name,
            bytes,
        )
        .await
    }
}
