//! Configuration management for the bilicomments crawler
//!
//! This module handles loading and validating configuration from environment variables
//! and TOML files. Every endpoint, header, retry setting and the output path lives here
//! so components can be built against test servers and temporary files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote API endpoints
    pub api: ApiConfig,

    /// HTTP client configuration
    pub http: HttpConfig,

    /// Output file configuration
    pub output: OutputConfig,

    /// Request signing configuration
    pub signing: SigningConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote API endpoints and fixed query values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Topic index listing the pages
    pub page_list_url: String,

    /// Per-page card listing, queried with `page_id=<item_id>`
    pub page_detail_url: String,

    /// Reply listing for a video
    pub comment_url: String,

    /// Navigation endpoint that publishes the WBI keys
    pub nav_url: String,

    /// `page_id` of the topic index
    pub list_page_id: String,

    /// `web_location` sent with reply requests
    pub web_location: u64,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Total attempts per request, first try included
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,

    /// User agent string
    pub user_agent: String,

    /// Referer header
    pub referer: String,

    /// Accept header
    pub accept: String,

    /// Accept-Encoding header
    pub accept_encoding: String,
}

/// Output file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Text file receiving page headers and numbered comments
    pub path: PathBuf,
}

/// How `w_rid` is produced for reply requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigningMode {
    /// Compute the WBI signature per request
    Wbi,
    /// Send a fixed, previously captured token
    Static,
}

/// Request signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signer selection
    pub mode: SigningMode,

    /// Token used in static mode
    pub static_token: Option<String>,

    /// WBI image key; fetched from `nav_url` when unset
    pub img_key: Option<String>,

    /// WBI sub key; fetched from `nav_url` when unset
    pub sub_key: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            page_list_url: String::from("https://api.bilibili.com/x/native_page/dynamic/index"),
            page_detail_url: String::from("https://api.bilibili.com/x/native_page/dynamic/inline"),
            comment_url: String::from("https://api.bilibili.com/x/v2/reply/main"),
            nav_url: String::from("https://api.bilibili.com/x/web-interface/nav"),
            list_page_id: String::from("169153"),
            web_location: 1_315_875,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            max_attempts: 3,
            retry_delay_ms: 2000,
            user_agent: String::from(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
            ),
            referer: String::from("https://www.bilibili.com/"),
            accept: String::from("application/json"),
            accept_encoding: String::from("gzip, deflate, br"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("comments.txt"),
        }
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            mode: SigningMode::Wbi,
            static_token: None,
            img_key: None,
            sub_key: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl HttpConfig {
    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the delay between attempts as Duration
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply `BILICOMMENTS_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("BILICOMMENTS_OUTPUT") {
            self.output.path = PathBuf::from(v);
        }

        if let Ok(v) = std::env::var("BILICOMMENTS_PAGE_ID") {
            self.api.list_page_id = v;
        }

        if let Ok(v) = std::env::var("BILICOMMENTS_REQUEST_TIMEOUT") {
            self.http.request_timeout_secs = v
                .parse()
                .with_context(|| format!("Invalid BILICOMMENTS_REQUEST_TIMEOUT: {v}"))?;
        }

        if let Ok(v) = std::env::var("BILICOMMENTS_MAX_ATTEMPTS") {
            self.http.max_attempts = v
                .parse()
                .with_context(|| format!("Invalid BILICOMMENTS_MAX_ATTEMPTS: {v}"))?;
        }

        if let Ok(v) = std::env::var("BILICOMMENTS_RETRY_DELAY_MS") {
            self.http.retry_delay_ms = v
                .parse()
                .with_context(|| format!("Invalid BILICOMMENTS_RETRY_DELAY_MS: {v}"))?;
        }

        if let Ok(v) = std::env::var("BILICOMMENTS_USER_AGENT") {
            self.http.user_agent = v;
        }

        if let Ok(v) = std::env::var("BILICOMMENTS_SIGNING_MODE") {
            self.signing.mode = match v.to_lowercase().as_str() {
                "wbi" => SigningMode::Wbi,
                "static" => SigningMode::Static,
                other => anyhow::bail!("Invalid BILICOMMENTS_SIGNING_MODE: {other}"),
            };
        }

        if let Ok(v) = std::env::var("BILICOMMENTS_W_RID") {
            self.signing.static_token = Some(v);
        }

        if let Ok(v) = std::env::var("BILICOMMENTS_LOG_LEVEL") {
            self.logging.level = v;
        }

        if let Ok(v) = std::env::var("BILICOMMENTS_LOG_FORMAT") {
            self.logging.format = v;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.http.max_attempts == 0 {
            anyhow::bail!("max_attempts must be greater than 0");
        }

        if self.http.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        for (name, url) in [
            ("page_list_url", &self.api.page_list_url),
            ("page_detail_url", &self.api.page_detail_url),
            ("comment_url", &self.api.comment_url),
        ] {
            url::Url::parse(url).with_context(|| format!("Invalid {name}: {url}"))?;
        }

        if self.signing.mode == SigningMode::Static
            && self
                .signing
                .static_token
                .as_deref()
                .map_or(true, str::is_empty)
        {
            anyhow::bail!("static signing mode requires signing.static_token");
        }

        if self.output.path.as_os_str().is_empty() {
            anyhow::bail!("output.path must not be empty");
        }

        Ok(())
    }
}
