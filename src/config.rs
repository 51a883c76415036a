//! Configuration and settings management
//!
//! Loads settings from config files and environment variables once at
//! startup. The resulting [`Settings`] value is immutable and shared.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;

/// Default webhook listen port
pub const DEFAULT_PORT: u16 = 8443;
/// Default yt-dlp executable
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";
/// Default yt-dlp format selector (best single-file variant)
pub const DEFAULT_YTDLP_FORMAT: &str = "best";
/// Default number of concurrent extractions
pub const DEFAULT_EXTRACTOR_WORKERS: usize = 4;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Public HTTPS URL Telegram should push updates to.
    /// Without it the bot falls back to long polling.
    pub webhook_url: Option<String>,

    /// Local port the webhook listener binds to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Secret Telegram must echo in `X-Telegram-Bot-Api-Secret-Token`
    pub webhook_secret: Option<String>,

    /// Path to the yt-dlp executable
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,

    /// yt-dlp `-f` format selector
    #[serde(default = "default_ytdlp_format")]
    pub ytdlp_format: String,

    /// Maximum number of extractions running at the same time
    #[serde(default = "default_extractor_workers")]
    pub extractor_workers: usize,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_ytdlp_path() -> String {
    DEFAULT_YTDLP_PATH.to_string()
}

fn default_ytdlp_format() -> String {
    DEFAULT_YTDLP_FORMAT.to_string()
}

const fn default_extractor_workers() -> usize {
    DEFAULT_EXTRACTOR_WORKERS
}

/// Telegram only accepts secret tokens made of `[A-Za-z0-9_-]{1,256}`.
fn is_valid_secret(secret: &str) -> bool {
    (1..=256).contains(&secret.len())
        && secret
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Build the layered configuration source (files, then environment).
///
/// # Errors
///
/// Returns a `ConfigError` if a present config file cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, not checked into git
        .add_source(File::with_name("config/local").required(false))
        // Eg.. `APP_PORT=9000 ./target/app` would set the `port` key
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Plain UPPER_SNAKE_CASE variables map to snake_case keys
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Load and validate settings.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use video_link_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the token is missing or any value is invalid.
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Self = build_config()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check values that deserialization alone cannot catch.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` describing the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram_token.trim().is_empty() {
            return Err(ConfigError::Message("TELEGRAM_TOKEN is empty".to_string()));
        }
        if self.extractor_workers == 0 {
            return Err(ConfigError::Message(
                "EXTRACTOR_WORKERS must be at least 1".to_string(),
            ));
        }
        if let Some(secret) = &self.webhook_secret {
            if !is_valid_secret(secret) {
                return Err(ConfigError::Message(
                    "WEBHOOK_SECRET must be 1-256 characters of A-Z, a-z, 0-9, _ or -".to_string(),
                ));
            }
        }
        self.webhook()?;
        Ok(())
    }

    /// Parsed webhook URL, or `None` when polling should be used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` if the URL is malformed or not HTTPS.
    pub fn webhook(&self) -> Result<Option<Url>, ConfigError> {
        let Some(raw) = self.webhook_url.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }

        let url = Url::parse(raw)
            .map_err(|e| ConfigError::Message(format!("WEBHOOK_URL is invalid: {e}")))?;
        if url.scheme() != "https" {
            return Err(ConfigError::Message(format!(
                "WEBHOOK_URL must use https, got {}",
                url.scheme()
            )));
        }
        Ok(Some(url))
    }

    /// Address the webhook listener binds to (all interfaces).
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
