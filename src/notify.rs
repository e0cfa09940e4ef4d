//! Daily summary generation and delivery over email and chat webhook.
//!
//! # Delivery channels
//!
//! | Channel | Transport | Payload |
//! |---------|-----------|---------|
//! | email | SMTP over implicit TLS, username/password | plain-text body, summary attached as `<date>.json` |
//! | webhook | HTTP POST | `{"text": "<message>"}` |
//!
//! Neither channel retries; a failure comes back as [`Error::Delivery`].

use crate::aggregate::LogRow;
use crate::config::SmtpConfig;
use crate::error::{Error, Result};
use crate::models::{DailySummary, SourceCounts};
use chrono::{NaiveDate, NaiveDateTime};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Totals for `day` from complete log rows.
///
/// A day without entries yields zero totals and an empty `per_source` map.
pub fn build_daily_summary(table: &[LogRow], day: NaiveDate, generated_at: NaiveDateTime) -> DailySummary {
    let mut per_source: BTreeMap<String, SourceCounts> = BTreeMap::new();
    let mut totals = SourceCounts::default();
    for row in table.iter().filter(|r| r.date == day) {
        let Some(stats) = row.counts.complete() else { continue };
        totals.add(stats);
        per_source.entry(row.source.clone()).or_default().add(stats);
    }
    DailySummary {
        date: day,
        total_incoming: totals.incoming,
        total_added: totals.added,
        total_duplicates: totals.duplicates,
        per_source,
        generated_at,
    }
}

/// Write `summary` to `<dir>/<YYYY-MM-DD>.json`, replacing any earlier one.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), date = %summary.date))]
pub async fn write_daily_summary(dir: &Path, summary: &DailySummary) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::store_io(dir, e))?;
    let path = dir.join(format!("{}.json", summary.date));
    let json = serde_json::to_vec_pretty(summary).map_err(|e| {
        Error::store_io(&path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    fs::write(&path, json)
        .await
        .map_err(|e| Error::store_io(&path, e))?;
    info!(path = %path.display(), "Wrote daily summary");
    Ok(path)
}

pub fn email_subject(day: NaiveDate) -> String {
    format!("News Scraper Daily Summary {day}")
}

pub fn email_body(summary: &DailySummary, stored_articles: usize) -> String {
    format!(
        "Daily summary for {}. See attachment.\nArticles in store: {}\n",
        summary.date, stored_articles
    )
}

pub fn chat_text(summary: &DailySummary, stored_articles: usize) -> String {
    format!(
        "Daily summary for {}: incoming={}, added={}, duplicates={}, stored={}",
        summary.date,
        summary.total_incoming,
        summary.total_added,
        summary.total_duplicates,
        stored_articles
    )
}

/// Build the summary email; the sender is the SMTP username.
pub fn build_email(
    smtp: &SmtpConfig,
    subject: &str,
    body: &str,
    attachment_name: &str,
    attachment: Vec<u8>,
) -> Result<Message> {
    let from: Mailbox = smtp
        .username
        .parse()
        .map_err(|e| Error::delivery("email", format!("invalid sender {}: {e}", smtp.username)))?;
    let to: Mailbox = smtp
        .to
        .parse()
        .map_err(|e| Error::delivery("email", format!("invalid recipient {}: {e}", smtp.to)))?;
    let json_type = ContentType::parse("application/json")
        .map_err(|e| Error::delivery("email", e))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body.to_string()))
                .singlepart(Attachment::new(attachment_name.to_string()).body(attachment, json_type)),
        )
        .map_err(|e| Error::delivery("email", e))
}

/// Send the summary file as an email attachment to `smtp.to`.
#[instrument(level = "info", skip_all, fields(host = %smtp.host, port = smtp.port, to = %smtp.to))]
pub async fn send_email(
    smtp: &SmtpConfig,
    subject: &str,
    body: &str,
    attachment_name: &str,
    summary_bytes: Vec<u8>,
) -> Result<()> {
    let message = build_email(smtp, subject, body, attachment_name, summary_bytes)?;
    let password = smtp
        .password
        .clone()
        .ok_or_else(|| Error::delivery("email", "no SMTP password configured"))?;

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        .map_err(|e| Error::delivery("email", e))?
        .port(smtp.port)
        .credentials(Credentials::new(smtp.username.clone(), password))
        .build();

    mailer
        .send(message)
        .await
        .map_err(|e| Error::delivery("email", e))?;
    info!("Email sent");
    Ok(())
}

/// POST `{"text": text}` to the webhook; any non-2xx status is an error.
#[instrument(level = "info", skip_all)]
pub async fn send_chat_webhook(client: &reqwest::Client, url: &str, text: &str) -> Result<()> {
    let resp = client
        .post(url)
        .timeout(WEBHOOK_TIMEOUT)
        .json(&json!({ "text": text }))
        .send()
        .await
        .map_err(|e| Error::delivery("webhook", e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::delivery("webhook", format!("status {status}")));
    }
    info!(%status, "Webhook notification posted");
    Ok(())
}
