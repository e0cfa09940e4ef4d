//! Registry of upstream news sources.
//!
//! Every source is served by the same API root; each one has a path and,
//! optionally, a list of categories appended as a trailing path segment.
//! Kumparan, Vice and VOA expose a single root endpoint.

use crate::error::{Error, Result};
use crate::models::ALL_CATEGORY;
use once_cell::sync::Lazy;

/// A news source and the categories it exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: &'static str,
    /// Path below the API root. `None` derives one from the name.
    pub path: Option<&'static str>,
    pub categories: &'static [&'static str],
}

impl Source {
    /// Path below the API root, deriving `/api/<slug>-news/` when none is set.
    pub fn root_path(&self) -> String {
        match self.path {
            Some(p) => p.to_string(),
            None => format!("/api/{}-news/", source_slug(self.name)),
        }
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(&category)
    }
}

/// One URL to fetch, with the labels recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub source: &'static str,
    pub category: String,
    pub url: String,
}

pub static SOURCES: Lazy<Vec<Source>> = Lazy::new(|| {
    vec![
        Source {
            name: "CNN News",
            path: Some("/api/cnn-news/"),
            categories: &[
                "nasional",
                "internasional",
                "ekonomi",
                "olahraga",
                "teknologi",
                "hiburan",
                "gaya-hidup",
            ],
        },
        Source {
            name: "CNBC News",
            path: Some("/api/cnbc-news/"),
            categories: &["market", "news", "entrepreneur", "syariah", "tech", "lifestyle"],
        },
        Source {
            name: "Republika News",
            path: Some("/api/republika-news/"),
            categories: &[
                "news",
                "nusantara",
                "khazanah",
                "islam-digest",
                "internasional",
                "ekonomi",
                "sepakbola",
                "leisure",
            ],
        },
        Source {
            name: "Tempo News",
            path: Some("/api/tempo-news/"),
            categories: &[
                "nasional", "bisnis", "metro", "dunia", "bola", "sport", "cantik", "tekno",
                "otomotif", "nusantara",
            ],
        },
        Source {
            name: "Antara News",
            path: Some("/api/antara-news/"),
            categories: &[
                "terkini",
                "top-news",
                "politik",
                "hukum",
                "ekonomi",
                "metro",
                "sepakbola",
                "olahraga",
                "humaniora",
                "lifestyle",
                "hiburan",
                "dunia",
                "infografik",
                "tekno",
                "otomotif",
                "warta-bumi",
                "rilis-pers",
            ],
        },
        Source {
            name: "Okezone News",
            path: Some("/api/okezone-news"),
            categories: &[
                "breaking",
                "sport",
                "economy",
                "lifestyle",
                "celebrity",
                "bola",
                "techno",
            ],
        },
        Source {
            name: "BBC News",
            path: Some("/api/bbc-news"),
            categories: &["dunia", "berita_indonesia", "olahraga", "majalah", "multimedia"],
        },
        Source {
            name: "Kumparan News",
            path: Some("/api/kumparan-news"),
            categories: &[],
        },
        Source {
            name: "Tribun News",
            path: Some("/api/tribun-news"),
            categories: &[
                "bisnis",
                "superskor",
                "sport",
                "seleb",
                "lifestyle",
                "travel",
                "parapuan",
                "otomotif",
                "techno",
                "ramadan",
            ],
        },
        Source {
            name: "Zetizen Jawapos News",
            path: Some("/api/zetizen-jawapos-news"),
            categories: &[
                "book",
                "movie",
                "music",
                "tv-series",
                "beauty",
                "trend",
                "food-and-traveling",
                "games",
                "otomodif",
                "sport-and-health",
                "after-school",
                "career-coach",
                "dear-you",
                "get-a-life",
                "scholarship-info",
                "science",
                "techno",
                "zetizen-national-challenge",
            ],
        },
        Source {
            name: "Vice",
            path: Some("/api/vice-news"),
            categories: &[],
        },
        Source {
            name: "Suara News",
            path: Some("/api/suara-news"),
            categories: &[
                "news",
                "bisnis",
                "lifestyle",
                "entertainment",
                "otomotif",
                "tekno",
                "health",
                "mostpopular",
                "wawancara",
                "pressrelease",
            ],
        },
        Source {
            name: "VOA Indonesia",
            path: Some("/api/voa-news"),
            categories: &[],
        },
    ]
});

/// Look up a source by name, ignoring ASCII case.
pub fn find(name: &str) -> Result<&'static Source> {
    SOURCES
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| Error::UnknownSource(name.to_string()))
}

/// Lowercase the name and replace spaces with dashes.
pub fn source_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Build the URL for one (source, category) fetch.
///
/// A `/` is inserted between the source path and the category when missing.
/// Without a category the source's root endpoint is used.
pub fn endpoint(base_url: &str, source: &'static Source, category: Option<&str>) -> Result<Endpoint> {
    let mut url = format!("{}{}", base_url.trim_end_matches('/'), source.root_path());
    let category = match category {
        Some(c) => {
            if !source.has_category(c) {
                return Err(Error::UnknownCategory {
                    source_name: source.name.to_string(),
                    category: c.to_string(),
                });
            }
            if !url.ends_with('/') {
                url.push('/');
            }
            url.push_str(c);
            c.to_string()
        }
        None => ALL_CATEGORY.to_string(),
    };
    Ok(Endpoint {
        source: source.name,
        category,
        url,
    })
}

/// Every endpoint visited by a fetch-all run, in registry order.
///
/// Sources with categories contribute one endpoint per category; the others
/// contribute their root endpoint.
pub fn bulk_endpoints(base_url: &str) -> Vec<Endpoint> {
    let mut out = Vec::new();
    for source in SOURCES.iter() {
        if source.categories.is_empty() {
            if source.path.is_some() {
                out.extend(endpoint(base_url, source, None).ok());
            }
        } else {
            out.extend(
                source
                    .categories
                    .iter()
                    .filter_map(|c| endpoint(base_url, source, Some(c)).ok()),
            );
        }
    }
    out
}
