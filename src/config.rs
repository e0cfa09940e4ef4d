//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a default, so running without `--config` works out of
//! the box. Command-line flags are applied on top with [`AppConfig::apply_cli`].
//!
//! ```yaml
//! base_url: https://berita-indo-api-next.vercel.app
//! data_dir: data
//! fetch:
//!   single_timeout_secs: 12
//!   bulk_timeout_secs: 12
//! report:
//!   recent_limit: 50
//!   per_source_window_days: 14
//! schedule:
//!   interval_hours: 6
//! smtp:
//!   host: smtp.gmail.com
//!   port: 465
//!   username: bot@example.com
//!   to: editor@example.com
//! webhook_url: https://hooks.slack.com/services/...
//! ```

use crate::cli::Cli;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub data_dir: PathBuf,
    pub fetch: FetchConfig,
    pub report: ReportConfig,
    pub schedule: ScheduleConfig,
    pub smtp: Option<SmtpConfig>,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub single_timeout_secs: u64,
    pub bulk_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub recent_limit: usize,
    pub per_source_window_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_hours: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Login name, also used as the sender address.
    pub username: String,
    /// Usually supplied through `SMTP_PASSWORD` rather than the file.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub to: String,
}

fn default_smtp_port() -> u16 {
    465
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://berita-indo-api-next.vercel.app".to_string(),
            data_dir: PathBuf::from("data"),
            fetch: FetchConfig::default(),
            report: ReportConfig::default(),
            schedule: ScheduleConfig::default(),
            smtp: None,
            webhook_url: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            single_timeout_secs: 12,
            bulk_timeout_secs: 12,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            recent_limit: 50,
            per_source_window_days: 14,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { interval_hours: 6 }
    }
}

impl FetchConfig {
    pub fn single_timeout(&self) -> Duration {
        Duration::from_secs(self.single_timeout_secs)
    }

    pub fn bulk_timeout(&self) -> Duration {
        Duration::from_secs(self.bulk_timeout_secs)
    }
}

impl AppConfig {
    /// Load from `path`, or defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| Error::store_io(path, e))?;
        let config: AppConfig = serde_yaml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        info!(config_path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Overlay command-line values onto the file configuration.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(url) = &cli.base_url {
            self.base_url = url.clone();
        }
        if let Some(url) = &cli.webhook_url {
            self.webhook_url = Some(url.clone());
        }
        if let (Some(smtp), Some(password)) = (self.smtp.as_mut(), &cli.smtp_password) {
            smtp.password = Some(password.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("base_url {:?}: {e}", self.base_url)))?;
        if let Some(hook) = &self.webhook_url {
            url::Url::parse(hook)
                .map_err(|e| Error::Config(format!("webhook_url {hook:?}: {e}")))?;
        }
        if self.fetch.single_timeout_secs == 0 || self.fetch.bulk_timeout_secs == 0 {
            return Err(Error::Config("fetch timeouts must be non-zero".to_string()));
        }
        if self.schedule.interval_hours == 0 {
            return Err(Error::Config("schedule.interval_hours must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn news_path(&self) -> PathBuf {
        self.data_dir.join("news.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("logs.jsonl")
    }

    pub fn summary_dir(&self) -> PathBuf {
        self.data_dir.join("daily_summary")
    }
}
