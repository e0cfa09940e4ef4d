//! Error taxonomy for fetch, storage, log parsing, and delivery failures.
//!
//! Every user-triggered action returns [`Result`]; the action boundary in
//! `main` (or a scheduler tick) turns an [`Error`] into a user-visible message.
//! Nothing in this crate retries automatically.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Network failure, non-2xx status, or a body that is not valid JSON.
    #[error("fetch from {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("file access failed for {}: {source}", path.display())]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("article store {} is not a valid document: {source}", path.display())]
    StoreFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed log entry on line {line}: {source}")]
    LogParse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("delivery via {channel} failed: {reason}")]
    Delivery {
        channel: &'static str,
        reason: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown news source: {0}")]
    UnknownSource(String),

    #[error("source {source_name} has no category {category}")]
    UnknownCategory {
        source_name: String,
        category: String,
    },
}

impl Error {
    pub(crate) fn store_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::StoreIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn delivery(channel: &'static str, reason: impl ToString) -> Self {
        Error::Delivery {
            channel,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_io_message_names_path() {
        let err = Error::store_io(
            "data/news.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("data/news.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_log_parse_message_names_line() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = Error::LogParse { line: 7, source };
        assert!(err.to_string().starts_with("malformed log entry on line 7"));
    }

    #[test]
    fn test_delivery_message() {
        let err = Error::delivery("webhook", "status 500");
        assert_eq!(err.to_string(), "delivery via webhook failed: status 500");
    }
}
