//! Service configuration
//!
//! Loaded from a YAML file with serde defaults for every field:
//!
//! ```yaml
//! api:
//!   url: https://api.github.com
//!   oauth_token_url: https://github.com/login/oauth/access_token
//! http:
//!   timeout_seconds: 30
//!   max_retries: 3
//!   retry_backoff: { type: exponential, initial_ms: 100, max_ms: 60000 }
//!   rate_limit: { requests_per_second: 10, burst_size: 10 }
//! pagination:
//!   page_size: 30
//!   contributors_page_size: 100
//!   max_concurrency: 4
//!   reuse_probe: true
//! ```
//!
//! A missing or unreadable file never aborts startup. The API base URL then
//! resolves to [`BaseUrl::Unavailable`] and every API call fails with
//! [`Error::BaseUrlUnavailable`].

use crate::auth::DEFAULT_TOKEN_URL;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::{DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_PAGES};
use crate::types::{BackoffType, ResourceKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "forgefetch.yaml";

/// Environment variable overriding `api.url`
pub const API_URL_ENV: &str = "FORGEFETCH_API_URL";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Remote API endpoints
    #[serde(default)]
    pub api: ApiConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Multi-page retrieval settings
    #[serde(default)]
    pub pagination: PaginationSettings,

    /// Why loading failed, if it did
    #[serde(skip)]
    load_error: Option<String>,
}

impl ServiceConfig {
    /// Parse from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration without ever failing.
    ///
    /// `path` defaults to [`DEFAULT_CONFIG_FILE`]. On any error the defaults
    /// are used and the failure is kept so [`Self::base_url`] can report it.
    /// [`API_URL_ENV`] is applied afterwards.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let mut config = match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Using default configuration");
                Self {
                    load_error: Some(e.to_string()),
                    ..Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply overrides from an environment-like lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.api.url = Some(url);
        }
    }

    /// Set the API base URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api.url = Some(url.into());
        self
    }

    /// Resolve the API base URL
    pub fn base_url(&self) -> BaseUrl {
        match self.api.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => match Url::parse(url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                    BaseUrl::Configured(url.trim_end_matches('/').to_string())
                }
                Ok(parsed) => BaseUrl::Unavailable {
                    reason: format!("unsupported scheme '{}' in api.url", parsed.scheme()),
                },
                Err(e) => BaseUrl::Unavailable {
                    reason: format!("invalid api.url '{url}': {e}"),
                },
            },
            _ => BaseUrl::Unavailable {
                reason: self
                    .load_error
                    .clone()
                    .unwrap_or_else(|| "api.url is not set".to_string()),
            },
        }
    }

    /// HTTP client configuration derived from the `http` section
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .max_retries(self.http.max_retries)
            .backoff(
                self.http.retry_backoff.backoff_type,
                Duration::from_millis(self.http.retry_backoff.initial_ms),
                Duration::from_millis(self.http.retry_backoff.max_ms),
            );

        builder = match &self.http.rate_limit {
            Some(limit) => builder.rate_limit(limit.clone()),
            None => builder.no_rate_limit(),
        };

        if let Some(agent) = &self.http.user_agent {
            builder = builder.user_agent(agent);
        }

        builder.build()
    }
}

// ============================================================================
// API Config
// ============================================================================

/// Remote API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://api.github.com`
    #[serde(default)]
    pub url: Option<String>,

    /// OAuth token endpoint
    #[serde(default = "default_token_url")]
    pub oauth_token_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: None,
            oauth_token_url: default_token_url(),
        }
    }
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

/// Resolved API base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseUrl {
    /// A usable base URL without trailing slash
    Configured(String),
    /// No usable base URL
    Unavailable {
        /// What went wrong
        reason: String,
    },
}

impl BaseUrl {
    /// The URL, or the error every request against it reports
    pub fn resolve(&self) -> Result<&str> {
        match self {
            Self::Configured(url) => Ok(url),
            Self::Unavailable { reason } => Err(Error::BaseUrlUnavailable {
                reason: reason.clone(),
            }),
        }
    }

    /// Join a path onto the base URL
    pub fn join(&self, path: &str) -> Result<String> {
        let base = self.resolve()?;
        Ok(format!("{base}/{}", path.trim_start_matches('/')))
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// Client-side rate limit; `null` disables it
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: BackoffConfig::default(),
            rate_limit: default_rate_limit(),
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::default())
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}

// ============================================================================
// Pagination Settings
// ============================================================================

/// Multi-page retrieval settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationSettings {
    /// Records per page for commits, contents and repositories
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Records per page for contributors
    #[serde(default = "default_contributors_page_size")]
    pub contributors_page_size: u32,

    /// Page requests in flight per retrieval
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Largest page count a `Link` header may announce
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Use the probe response as page 1 instead of fetching page 1 again
    #[serde(default = "default_reuse_probe")]
    pub reuse_probe: bool,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            contributors_page_size: default_contributors_page_size(),
            max_concurrency: default_max_concurrency(),
            max_pages: default_max_pages(),
            reuse_probe: default_reuse_probe(),
        }
    }
}

impl PaginationSettings {
    /// Page size used for a collection
    pub fn page_size_for(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Contributors => self.contributors_page_size,
            _ => self.page_size,
        }
    }
}

fn default_page_size() -> u32 {
    30
}

fn default_contributors_page_size() -> u32 {
    100
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_max_pages() -> u32 {
    DEFAULT_MAX_PAGES
}

fn default_reuse_probe() -> bool {
    true
}
