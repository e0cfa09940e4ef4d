//! Persisted article collection with identity-key deduplication.
//!
//! The store is a single pretty-printed JSON document:
//!
//! ```text
//! { "last_update": "2025-05-06T08:00:00.123456", "articles": [ {...}, ... ] }
//! ```
//!
//! Callers run `load` → [`merge_and_dedupe`] → `save` as one read-modify-write
//! cycle; `Scraper` serializes those cycles so a process has a single writer.

use crate::error::{Error, Result};
use crate::models::{Article, MergeStats, StoreDocument};
use chrono::NaiveDateTime;
use itertools::Itertools;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone)]
pub struct ArticleStore {
    path: PathBuf,
}

impl ArticleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, or the empty document if the file does not exist.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<StoreDocument> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No article store yet; starting empty");
                return Ok(StoreDocument::default());
            }
            Err(e) => return Err(Error::store_io(&self.path, e)),
        };
        serde_json::from_slice(&raw).map_err(|source| Error::StoreFormat {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the document on disk.
    ///
    /// Writes a sibling `.tmp` file and renames it over the target, so a
    /// reader sees either the old or the new document.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), articles = doc.articles.len()))]
    pub async fn save(&self, doc: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::store_io(parent, e))?;
        }
        let json = serde_json::to_vec_pretty(doc).map_err(|source| Error::StoreFormat {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| Error::store_io(&tmp, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::store_io(&self.path, e))?;
        info!("Saved article store");
        Ok(())
    }
}

/// Drop later records whose identity key was already seen.
pub fn dedupe(articles: Vec<Article>) -> Vec<Article> {
    articles
        .into_iter()
        .unique_by(|a| a.identity_key())
        .collect()
}

/// Append `new_articles`, deduplicate the whole collection, stamp `now`.
///
/// `added` is the growth of the collection and never negative; `duplicates`
/// is `incoming - added` clamped at zero.
pub fn merge_and_dedupe(
    mut doc: StoreDocument,
    new_articles: Vec<Article>,
    now: NaiveDateTime,
) -> (StoreDocument, MergeStats) {
    let before = doc.articles.len() as u64;
    let incoming = new_articles.len() as u64;

    doc.articles.extend(new_articles);
    doc.articles = dedupe(doc.articles);
    doc.last_update = Some(now);

    let after = doc.articles.len() as u64;
    let added = after.saturating_sub(before);
    let stats = MergeStats {
        incoming,
        added,
        duplicates: incoming.saturating_sub(added),
        total_after: after,
    };
    debug!(?stats, "Merged articles");
    (doc, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn a(link: &str) -> Article {
        serde_json::from_value(json!({ "link": link })).unwrap()
    }

    fn now() -> NaiveDateTime {
        "2025-05-06T08:00:00".parse().unwrap()
    }

    fn links(doc: &StoreDocument) -> Vec<String> {
        doc.articles.iter().filter_map(|x| x.link()).collect()
    }

    #[test]
    fn test_merge_preserves_first_seen_order() {
        let (doc, stats) = merge_and_dedupe(
            StoreDocument::default(),
            vec![a("A"), a("B"), a("A"), a("C")],
            now(),
        );
        assert_eq!(links(&doc), vec!["A", "B", "C"]);
        assert_eq!(
            stats,
            MergeStats { incoming: 4, added: 3, duplicates: 1, total_after: 3 }
        );
        assert_eq!(doc.last_update, Some(now()));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let batch = vec![a("u1"), a("u2"), a("u3")];
        let (first, _) = merge_and_dedupe(StoreDocument::default(), batch.clone(), now());
        let (second, stats) = merge_and_dedupe(first.clone(), batch, now());
        assert_eq!(stats.added, 0);
        assert_eq!(stats.duplicates, 3);
        assert_eq!(first.articles, second.articles);
    }

    #[test]
    fn test_merge_existing_records_win() {
        let old: Article = serde_json::from_value(json!({"link": "u1", "title": "old"})).unwrap();
        let new: Article = serde_json::from_value(json!({"link": "u1", "title": "new"})).unwrap();
        let doc = StoreDocument { last_update: None, articles: vec![old] };
        let (doc, stats) = merge_and_dedupe(doc, vec![new], now());
        assert_eq!(doc.articles[0].title().as_deref(), Some("old"));
        assert_eq!(stats.duplicates, 1);
    }

    #[test]
    fn test_merge_clamps_when_store_had_duplicates() {
        // A hand-edited store can already hold duplicates; they collapse too.
        let doc = StoreDocument { last_update: None, articles: vec![a("x"), a("x"), a("y")] };
        let (doc, stats) = merge_and_dedupe(doc, vec![a("z")], now());
        assert_eq!(links(&doc), vec!["x", "y", "z"]);
        assert_eq!(stats.added, 0);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.total_after, 3);
    }

    #[test]
    fn test_merge_empty_batch() {
        let (doc, stats) = merge_and_dedupe(StoreDocument::default(), vec![], now());
        assert!(doc.articles.is_empty());
        assert_eq!(stats, MergeStats::default());
        assert_eq!(doc.last_update, Some(now()));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("news.json"));
        assert_eq!(store.load().await.unwrap(), StoreDocument::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArticleStore::new(tmp.path().join("nested/news.json"));
        let (doc, _) = merge_and_dedupe(StoreDocument::default(), vec![a("u1"), a("u2")], now());
        store.save(&doc).await.unwrap();

        assert_eq!(store.load().await.unwrap(), doc);
        assert!(!tmp.path().join("nested/news.json.tmp").exists());
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  \"articles\""));
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_store_format_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("news.json");
        std::fs::write(&path, "{\"articles\": [").unwrap();
        let err = ArticleStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, Error::StoreFormat { .. }));
    }
}
