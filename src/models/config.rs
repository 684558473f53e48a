//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and pacing behavior
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Target site layout
    #[serde(default)]
    pub site: SiteConfig,

    /// Optional pipeline stages
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Snapshot file names
    #[serde(default)]
    pub paths: PathsConfig,

    /// Downstream recency window
    #[serde(default)]
    pub recency: RecencyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        for name in self.crawler.headers.keys() {
            if reqwest::header::HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(AppError::validation(format!(
                    "crawler.headers has invalid header name '{name}'"
                )));
            }
        }
        let base = url::Url::parse(&self.site.base_url)
            .map_err(|e| AppError::validation(format!("site.base_url is invalid: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(AppError::validation("site.base_url cannot be a base URL"));
        }
        if !self.site.listing_path.starts_with('/') {
            return Err(AppError::validation("site.listing_path must start with '/'"));
        }
        if self.paths.snapshot_file.trim().is_empty() {
            return Err(AppError::validation("paths.snapshot_file is empty"));
        }
        if self.paths.snapshot_file == self.paths.backup_file {
            return Err(AppError::validation(
                "paths.backup_file must differ from paths.snapshot_file",
            ));
        }
        if !(-12..=14).contains(&self.recency.utc_offset_hours) {
            return Err(AppError::validation(
                "recency.utc_offset_hours must be within -12..=14",
            ));
        }
        Ok(())
    }
}

/// HTTP client and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between consecutive requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            headers: BTreeMap::new(),
        }
    }
}

/// Target site layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Origin every relative link is resolved against
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// The single recognized listing path
    #[serde(default = "defaults::listing_path")]
    pub listing_path: String,

    /// Other paths the site uses for the same listing
    #[serde(default = "defaults::listing_path_aliases")]
    pub listing_path_aliases: Vec<String>,

    /// Boilerplate separator in the preview description
    #[serde(default = "defaults::description_delimiter")]
    pub description_delimiter: char,
}

impl SiteConfig {
    /// Absolute URL of the first listing page.
    pub fn start_url(&self) -> Result<String> {
        let base = url::Url::parse(&self.base_url)?;
        Ok(base.join(&self.listing_path)?.to_string())
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            listing_path: defaults::listing_path(),
            listing_path_aliases: defaults::listing_path_aliases(),
            description_delimiter: defaults::description_delimiter(),
        }
    }
}

/// Optional stages of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Mark books absent from the previous snapshot as new
    #[serde(default = "defaults::enabled")]
    pub track_novelty: bool,

    /// Fetch detail pages for books without cached detail
    #[serde(default = "defaults::enabled")]
    pub enrich_details: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            track_novelty: true,
            enrich_details: true,
        }
    }
}

/// Snapshot file names, relative to the storage directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::snapshot_file")]
    pub snapshot_file: String,

    #[serde(default = "defaults::backup_file")]
    pub backup_file: String,
}

impl PathsConfig {
    pub fn snapshot_path(&self, root: &Path) -> PathBuf {
        root.join(&self.snapshot_file)
    }

    pub fn backup_path(&self, root: &Path) -> PathBuf {
        root.join(&self.backup_file)
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            snapshot_file: defaults::snapshot_file(),
            backup_file: defaults::backup_file(),
        }
    }
}

/// Age threshold used by the renderer and notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecencyConfig {
    #[serde(default = "defaults::window_days")]
    pub window_days: u32,

    /// Offset of the site's local time from UTC
    #[serde(default = "defaults::utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self {
            window_days: defaults::window_days(),
            utc_offset_hours: defaults::utc_offset_hours(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        1000
    }

    // Site defaults
    pub fn base_url() -> String {
        "https://www.tenlong.com.tw".into()
    }
    pub fn listing_path() -> String {
        "/zh_tw/recent".into()
    }
    pub fn listing_path_aliases() -> Vec<String> {
        vec!["/tw/recent".into()]
    }
    pub fn description_delimiter() -> char {
        '|'
    }

    pub fn enabled() -> bool {
        true
    }

    // Path defaults
    pub fn snapshot_file() -> String {
        "books.json".into()
    }
    pub fn backup_file() -> String {
        "books_previous.json".into()
    }

    // Recency defaults
    pub fn window_days() -> u32 {
        7
    }
    pub fn utc_offset_hours() -> i32 {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_same_backup_and_snapshot() {
        let mut config = Config::default();
        config.paths.backup_file = config.paths.snapshot_file.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_header_name() {
        let mut config = Config::default();
        config
            .crawler
            .headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_offset() {
        let mut config = Config::default();
        config.recency.utc_offset_hours = 99;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            request_delay_ms = 0

            [pipeline]
            enrich_details = false
            "#,
        )
        .unwrap();
        assert_eq!(config.crawler.request_delay_ms, 0);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert!(!config.pipeline.enrich_details);
        assert!(config.pipeline.track_novelty);
        assert_eq!(config.site.listing_path, "/zh_tw/recent");
        assert_eq!(config.recency.window_days, 7);
    }

    #[test]
    fn test_start_url_joins_base_and_listing_path() {
        let site = SiteConfig::default();
        assert_eq!(
            site.start_url().unwrap(),
            "https://www.tenlong.com.tw/zh_tw/recent"
        );
    }
}
