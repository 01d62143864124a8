use hl_core::{Error, Result};
use hl_storage::StorageKind;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TABLE: &str = "pymes_news_headlines";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Settings for one harvester process. Every field has a default, so a TOML
/// file only needs the keys it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub storage: StorageKind,
    pub backend_url: Option<String>,
    pub table: String,
    pub webdriver_url: String,
    pub headless: bool,
    /// Wait after the first page load, before the consent dialog is dismissed.
    pub settle_ms: u64,
    /// Wait after every "load more" click.
    pub pacing_ms: u64,
    pub clickable_timeout_ms: u64,
    pub page_load_timeout_ms: u64,
    pub max_pages: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            storage: StorageKind::default(),
            backend_url: None,
            table: DEFAULT_TABLE.to_string(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            settle_ms: 5_000,
            pacing_ms: 1_000,
            clickable_timeout_ms: 10_000,
            page_load_timeout_ms: 15_000,
            max_pages: 100,
        }
    }
}

impl ScrapeConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn clickable_timeout(&self) -> Duration {
        Duration::from_millis(self.clickable_timeout_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.table, DEFAULT_TABLE);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.clickable_timeout(), Duration::from_secs(10));
        assert_eq!(config.page_load_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_toml() {
        let config = ScrapeConfig::from_toml_str(
            r#"
            storage = "sqlite"
            backend_url = "data/headlines.db"
            pacing_ms = 250
            max_pages = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.storage, StorageKind::Sqlite);
        assert_eq!(config.backend_url.as_deref(), Some("data/headlines.db"));
        assert_eq!(config.pacing_delay(), Duration::from_millis(250));
        assert_eq!(config.max_pages, 12);
        assert_eq!(config.settle_ms, 5_000);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ScrapeConfig::from_toml_str("max_pages = \"many\"").is_err());
    }
}
