//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ForumSelectors;

/// Shortest interval allowed between two cycles.
pub const MIN_FREQUENCY_SECS: u64 = 10;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// What to watch and how often
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// HTTP and pacing behavior
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Thread page and comment selectors
    #[serde(default)]
    pub selectors: ForumSelectors,

    /// Keyword and classifier stages
    #[serde(default)]
    pub filter: FilterConfig,

    /// Notification channel
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Thread/comment store
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load and validate in one step.
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.frequency_secs < MIN_FREQUENCY_SECS {
            return Err(AppError::validation(format!(
                "monitor.frequency_secs must be at least {MIN_FREQUENCY_SECS}"
            )));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.notifier.timeout_secs == 0 {
            return Err(AppError::validation("notifier.timeout_secs must be > 0"));
        }
        self.notifier.validate()?;
        if self.filter.use_ai {
            self.filter.ai.validate()?;
        }
        Ok(())
    }
}

/// Which comments are considered for notification.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommentFilter {
    /// Only comments written by the thread creator
    ByAuthor,
    /// Role-based selection; currently admits every comment
    #[default]
    ByRole,
    /// Every comment
    All,
}

/// Sources and cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// RSS/Atom feed URLs
    #[serde(default)]
    pub urls: Vec<String>,

    /// Thread URLs watched directly
    #[serde(default)]
    pub extra_urls: Vec<String>,

    /// Skip feeds and only watch `extra_urls`
    #[serde(default)]
    pub only_extra: bool,

    /// Seconds between cycles
    #[serde(default = "defaults::frequency")]
    pub frequency_secs: u64,

    #[serde(default)]
    pub comment_filter: CommentFilter,
}

impl MonitorConfig {
    /// Cycle interval, never below the enforced floor.
    pub fn frequency(&self) -> Duration {
        Duration::from_secs(self.frequency_secs.max(MIN_FREQUENCY_SECS))
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            extra_urls: Vec::new(),
            only_extra: false,
            frequency_secs: defaults::frequency(),
            comment_filter: CommentFilter::default(),
        }
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

    /// Newest feed items considered per feed
    #[serde(default = "defaults::feed_item_limit")]
    pub feed_item_limit: usize,

    /// Comment pages walked per thread per cycle (0 = until exhausted)
    #[serde(default = "defaults::max_pages")]
    pub max_pages_per_cycle: u32,

    /// Delay after each feed in milliseconds
    #[serde(default = "defaults::feed_delay")]
    pub feed_delay_ms: u64,

    /// Delay between threads of one feed in milliseconds
    #[serde(default = "defaults::feed_thread_delay")]
    pub feed_thread_delay_ms: u64,

    /// Delay between direct thread URLs in milliseconds
    #[serde(default = "defaults::direct_thread_delay")]
    pub direct_thread_delay_ms: u64,

    /// Delay between comment pages in milliseconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,
}

impl CrawlerConfig {
    /// Pacing settings with every delay set to zero.
    pub fn unpaced() -> Self {
        Self {
            feed_delay_ms: 0,
            feed_thread_delay_ms: 0,
            direct_thread_delay_ms: 0,
            page_delay_ms: 0,
            ..Self::default()
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            feed_item_limit: defaults::feed_item_limit(),
            max_pages_per_cycle: defaults::max_pages(),
            feed_delay_ms: defaults::feed_delay(),
            feed_thread_delay_ms: defaults::feed_thread_delay(),
            direct_thread_delay_ms: defaults::direct_thread_delay(),
            page_delay_ms: defaults::page_delay(),
        }
    }
}

/// Filter pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Enable the keyword stage for comments
    #[serde(default)]
    pub use_keywords: bool,

    /// `a+b,c` means (a AND b) OR c
    #[serde(default)]
    pub keywords_rule: String,

    /// Enable the classifier stage
    #[serde(default)]
    pub use_ai: bool,

    /// System prompt for threads
    #[serde(default = "defaults::thread_prompt")]
    pub thread_prompt: String,

    /// System prompt for comments
    #[serde(default = "defaults::comment_prompt")]
    pub comment_prompt: String,

    #[serde(default)]
    pub ai: AiConfig,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            use_keywords: false,
            keywords_rule: String::new(),
            use_ai: false,
            thread_prompt: defaults::thread_prompt(),
            comment_prompt: defaults::comment_prompt(),
            ai: AiConfig::default(),
        }
    }
}

/// Remote classifier backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    /// Cloudflare Workers AI
    #[default]
    Cloudflare,
    /// Any OpenAI-compatible chat completions endpoint
    Openai,
}

/// Classifier backend credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: AiProvider,

    #[serde(default)]
    pub cf_account_id: String,

    #[serde(default)]
    pub cf_token: String,

    /// Model name for either provider
    #[serde(default)]
    pub model: String,

    /// Full chat completions URL for the OpenAI-compatible provider
    #[serde(default = "defaults::openai_url")]
    pub api_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Classifier request timeout in seconds
    #[serde(default = "defaults::ai_timeout")]
    pub timeout_secs: u64,
}

impl AiConfig {
    fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AppError::validation("filter.ai.model is required"));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::validation("filter.ai.timeout_secs must be > 0"));
        }
        match self.provider {
            AiProvider::Cloudflare => {
                if self.cf_account_id.is_empty() || self.cf_token.is_empty() {
                    return Err(AppError::validation(
                        "cloudflare provider needs filter.ai.cf_account_id and filter.ai.cf_token",
                    ));
                }
            }
            AiProvider::Openai => {
                if self.api_url.is_empty() || self.api_key.is_empty() {
                    return Err(AppError::validation(
                        "openai provider needs filter.ai.api_url and filter.ai.api_key",
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            cf_account_id: String::new(),
            cf_token: String::new(),
            model: String::new(),
            api_url: defaults::openai_url(),
            api_key: String::new(),
            timeout_secs: defaults::ai_timeout(),
        }
    }
}

/// Notification channel kind.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    #[default]
    Telegram,
    Wechat,
    /// GET request to a user URL with a `{message}` placeholder
    Custom,
    /// Write messages to the log only
    Log,
}

/// Notification channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NoticeKind,

    #[serde(default)]
    pub telegram_bot: String,

    #[serde(default)]
    pub chat_id: String,

    #[serde(default)]
    pub wechat_key: String,

    #[serde(default)]
    pub custom_url: String,

    /// Delivery timeout in seconds
    #[serde(default = "defaults::notify_timeout")]
    pub timeout_secs: u64,
}

impl NotifierConfig {
    fn validate(&self) -> Result<()> {
        match self.kind {
            NoticeKind::Telegram if self.telegram_bot.is_empty() || self.chat_id.is_empty() => Err(
                AppError::validation("telegram notifier needs notifier.telegram_bot and notifier.chat_id"),
            ),
            NoticeKind::Wechat if self.wechat_key.is_empty() => Err(AppError::validation(
                "wechat notifier needs notifier.wechat_key",
            )),
            NoticeKind::Custom if self.custom_url.is_empty() => Err(AppError::validation(
                "custom notifier needs notifier.custom_url",
            )),
            _ => Ok(()),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NoticeKind::default(),
            telegram_bot: String::new(),
            chat_id: String::new(),
            wechat_key: String::new(),
            custom_url: String::new(),
            timeout_secs: defaults::notify_timeout(),
        }
    }
}

/// Store backend kind.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// Process-local maps; nothing survives a restart
    Memory,
}

/// Store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file for the SQLite backend
    #[serde(default = "defaults::db_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: defaults::db_path(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
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
    use std::path::PathBuf;

    // Monitor defaults
    pub fn frequency() -> u64 {
        300
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; threadwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn feed_item_limit() -> usize {
        6
    }
    pub fn max_pages() -> u32 {
        50
    }
    pub fn feed_delay() -> u64 {
        1000
    }
    pub fn feed_thread_delay() -> u64 {
        500
    }
    pub fn direct_thread_delay() -> u64 {
        2000
    }
    pub fn page_delay() -> u64 {
        1000
    }

    // Filter defaults
    pub fn thread_prompt() -> String {
        "Summarize the offer in this forum post in one or two lines (price, specs, location). \
         If it is not a hosting offer, answer FALSE. End your answer with END."
            .into()
    }
    pub fn comment_prompt() -> String {
        "If this forum comment announces a new offer, restock or discount, summarize it in one \
         line. Otherwise answer FALSE. End your answer with END."
            .into()
    }
    pub fn openai_url() -> String {
        "https://api.openai.com/v1/chat/completions".into()
    }
    pub fn ai_timeout() -> u64 {
        60
    }

    // Notifier defaults
    pub fn notify_timeout() -> u64 {
        10
    }

    // Storage defaults
    pub fn db_path() -> PathBuf {
        PathBuf::from("data/threadwatch.db")
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_config() -> Config {
        let mut config = Config::default();
        config.notifier.kind = NoticeKind::Log;
        config
    }

    #[test]
    fn validate_log_notifier_config_ok() {
        assert!(log_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_default_telegram_without_token() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn validate_rejects_low_frequency() {
        let mut config = log_config();
        config.monitor.frequency_secs = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_incomplete_ai_settings() {
        let mut config = log_config();
        config.filter.use_ai = true;
        config.filter.ai.model = "@cf/meta/llama-3-8b-instruct".to_string();
        assert!(config.validate().is_err());

        config.filter.ai.cf_account_id = "acct".to_string();
        config.filter.ai.cf_token = "token".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_ignores_ai_settings_when_disabled() {
        let mut config = log_config();
        config.filter.ai.provider = AiProvider::Openai;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn frequency_has_floor() {
        let monitor = MonitorConfig {
            frequency_secs: 3,
            ..MonitorConfig::default()
        };
        assert_eq!(monitor.frequency(), Duration::from_secs(MIN_FREQUENCY_SECS));
    }

    #[test]
    fn parses_toml_with_defaults() {
        let config = Config::from_toml(
            r#"
            [monitor]
            urls = ["https://lowendtalk.com/categories/offers/feed.rss"]
            comment_filter = "by_author"

            [filter]
            use_keywords = true
            keywords_rule = "nvme+ssd,ryzen"

            [filter.ai]
            provider = "openai"

            [notifier]
            kind = "custom"
            custom_url = "https://hooks.example.com/push?text={message}"

            [storage]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.monitor.urls.len(), 1);
        assert_eq!(config.monitor.comment_filter, CommentFilter::ByAuthor);
        assert_eq!(config.monitor.frequency_secs, 300);
        assert_eq!(config.crawler.feed_item_limit, 6);
        assert_eq!(config.filter.ai.provider, AiProvider::Openai);
        assert_eq!(config.notifier.kind, NoticeKind::Custom);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_enum_values() {
        let result = Config::from_toml(
            r#"
            [monitor]
            comment_filter = "by_mood"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn example_config_loads_and_validates() {
        let config = Config::from_toml(include_str!("../../config.example.toml")).unwrap();

        assert_eq!(config.monitor.urls.len(), 2);
        assert_eq!(config.notifier.kind, NoticeKind::Log);
        assert_eq!(config.crawler.max_pages_per_cycle, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_validated_checks_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        fs::write(&path, "[notifier]\nkind = \"log\"\n").unwrap();
        let config = Config::load_validated(&path).unwrap();
        assert_eq!(config.notifier.kind, NoticeKind::Log);

        // Parses, but the default telegram channel has no token
        fs::write(&path, "[monitor]\nfrequency_secs = 60\n").unwrap();
        assert!(matches!(
            Config::load_validated(&path),
            Err(AppError::Validation(_))
        ));

        assert!(Config::load_validated(dir.path().join("missing.toml")).is_err());
    }
}
