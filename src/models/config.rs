//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::CourseCode;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Polling schedule and concurrency limits
    #[serde(default)]
    pub watch: WatchConfig,

    /// Course-section query endpoint settings
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Where the watch set is persisted
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification delivery settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// User-facing message templates
    #[serde(default)]
    pub messages: Messages,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.watch.interval_secs == 0 {
            return Err(AppError::validation("watch.interval_secs must be > 0"));
        }
        if self.watch.fetch_timeout_secs == 0 {
            return Err(AppError::validation("watch.fetch_timeout_secs must be > 0"));
        }
        if self.watch.notify_timeout_secs == 0 {
            return Err(AppError::validation(
                "watch.notify_timeout_secs must be > 0",
            ));
        }
        if self.watch.max_concurrent == 0 {
            return Err(AppError::validation("watch.max_concurrent must be > 0"));
        }
        if self.scraper.user_agent.trim().is_empty() {
            return Err(AppError::validation("scraper.user_agent is empty"));
        }
        url::Url::parse(&self.scraper.base_url)?;
        if let Some(webhook) = &self.notifier.webhook_url {
            url::Url::parse(webhook)?;
        }
        if self.storage.watchlist_file.trim().is_empty() {
            return Err(AppError::validation("storage.watchlist_file is empty"));
        }
        if !self.messages.seat_open.contains("{course}") {
            return Err(AppError::validation(
                "messages.seat_open must contain the {course} placeholder",
            ));
        }
        Ok(())
    }
}

/// Polling schedule and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Seconds between scheduled cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Upper bound on a single scraper call
    #[serde(default = "defaults::fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Upper bound on a single notification delivery
    #[serde(default = "defaults::notify_timeout")]
    pub notify_timeout_secs: u64,

    /// Maximum simultaneous scraper calls within a cycle
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl WatchConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            fetch_timeout_secs: defaults::fetch_timeout(),
            notify_timeout_secs: defaults::notify_timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Settings for the course-section query endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// URL the course-section form is submitted to
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Optional term selector (e.g. "2026-92"); the site picks its default term when absent
    #[serde(default)]
    pub year_term: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            year_term: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Watch set file, relative to the storage directory
    #[serde(default = "defaults::watchlist_file")]
    pub watchlist_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            watchlist_file: defaults::watchlist_file(),
        }
    }
}

/// Notification delivery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// When set, notifications are POSTed to this URL; otherwise they are logged
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Message templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Messages {
    /// Sent when a watched course opens. `{course}` is replaced by the code.
    #[serde(default = "defaults::seat_open")]
    pub seat_open: String,
}

impl Messages {
    pub fn seat_open_for(&self, course: &CourseCode) -> String {
        self.seat_open.replace("{course}", course.as_str())
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            seat_open: defaults::seat_open(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Watch defaults
    pub fn interval() -> u64 {
        600
    }
    pub fn fetch_timeout() -> u64 {
        30
    }
    pub fn notify_timeout() -> u64 {
        10
    }
    pub fn max_concurrent() -> usize {
        3
    }

    // Scraper defaults
    pub fn base_url() -> String {
        "https://www.reg.uci.edu/cgi-bin/WebSoc".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; seatwatch/0.1)".into()
    }

    pub fn watchlist_file() -> String {
        "watchlist.json".into()
    }

    pub fn seat_open() -> String {
        "Good news! Course `{course}` appears to have an open spot.".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.watch.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.watch.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_template_without_placeholder() {
        let mut config = Config::default();
        config.messages.seat_open = "A seat opened".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_webhook_url() {
        let mut config = Config::default();
        config.notifier.webhook_url = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(AppError::Url(_))));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [watch]
            interval_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.watch.interval_secs, 60);
        assert_eq!(config.watch.max_concurrent, 3);
        assert_eq!(config.storage.watchlist_file, "watchlist.json");
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = Config::load("/nonexistent/seatwatch/config.toml").unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("/nonexistent/seatwatch/config.toml"));
    }

    #[test]
    fn load_malformed_file_is_toml_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[watch\ninterval_secs = ").unwrap();
        assert!(matches!(Config::load(&path), Err(AppError::Toml(_))));
    }

    #[test]
    fn shipped_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("storage/config.toml");
        let config = Config::load(path).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn seat_open_message_substitutes_course() {
        let messages = Messages::default();
        assert_eq!(
            messages.seat_open_for(&CourseCode::from("34250")),
            "Good news! Course `34250` appears to have an open spot."
        );
    }
}
