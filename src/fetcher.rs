//! HTTP fetching and response normalization for upstream news APIs.
//!
//! Providers wrap their article lists differently: some under `data`, some
//! under `articles`, some return a bare array. [`normalize`] flattens all of
//! them into a list of [`Article`] records without per-source branching.

use crate::error::{Error, Result};
use crate::models::Article;
use crate::utils::truncate_for_log;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Thin wrapper around a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// The shared client, for other outbound requests such as webhooks.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// GET `url` once and normalize the JSON body into articles.
    ///
    /// # Errors
    ///
    /// [`Error::Fetch`] on connection failure, timeout, a non-2xx status,
    /// or a body that does not decode as JSON. No retry is attempted.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<Article>> {
        let t0 = Instant::now();
        let fetch_err = |source| Error::Fetch {
            url: url.to_string(),
            source,
        };

        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(fetch_err)?
            .error_for_status()
            .map_err(fetch_err)?;

        let body: Value = resp.json().await.map_err(fetch_err)?;
        debug!(preview = %truncate_for_log(&body.to_string(), 300), "Upstream body");

        let articles = normalize(body);
        info!(
            count = articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched articles"
        );
        Ok(articles)
    }
}

/// Extract the article list from a decoded upstream response.
///
/// Checks, in order: a list-valued `data` field, a list-valued `articles`
/// field, the body itself being a list. Anything else yields an empty list.
/// List items that are not JSON objects are dropped.
pub fn normalize(body: Value) -> Vec<Article> {
    let items = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => match map.remove("articles") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
        },
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    let total = items.len();
    let articles: Vec<Article> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(fields) => Some(Article::new(fields)),
            _ => None,
        })
        .collect();
    if articles.len() < total {
        warn!(dropped = total - articles.len(), "Skipped non-object items in response");
    }
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample() -> Value {
        json!([
            {"link": "https://example.id/a", "title": "A"},
            {"link": "https://example.id/b", "title": "B"}
        ])
    }

    #[test]
    fn test_normalize_shapes_agree() {
        let from_data = normalize(json!({"success": true, "data": sample()}));
        let from_articles = normalize(json!({"status": "ok", "articles": sample()}));
        let from_list = normalize(sample());
        assert_eq!(from_data.len(), 2);
        assert_eq!(from_data, from_articles);
        assert_eq!(from_data, from_list);
    }

    #[test]
    fn test_normalize_data_wins_over_articles() {
        let out = normalize(json!({"data": [{"link": "d"}], "articles": [{"link": "a"}]}));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].link().as_deref(), Some("d"));
    }

    #[test]
    fn test_normalize_non_list_data_falls_through() {
        let out = normalize(json!({"data": {"posts": []}, "articles": [{"link": "a"}]}));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_normalize_unknown_shapes_are_empty() {
        assert!(normalize(json!({"message": "not found"})).is_empty());
        assert!(normalize(json!("text")).is_empty());
        assert!(normalize(Value::Null).is_empty());
    }

    #[test]
    fn test_normalize_drops_scalars() {
        let out = normalize(json!([{"link": "a"}, 3, "x"]));
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cnn-news/nasional"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": sample()})))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let url = format!("{}/api/cnn-news/nasional", server.uri());
        let articles = fetcher.fetch(&url, Duration::from_secs(5)).await.unwrap();
        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let err = fetcher
            .fetch(&server.uri(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_fetch_invalid_json_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let err = fetcher
            .fetch(&server.uri(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sample())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let err = fetcher
            .fetch(&server.uri(), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }
}
