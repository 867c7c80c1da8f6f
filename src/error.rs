//! Error types for forgefetch
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for forgefetch
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("API base URL unavailable: {reason}")]
    BaseUrlUnavailable { reason: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error("Cannot determine page count from Link header '{header}': {message}")]
    LinkParse { header: String, message: String },

    #[error("Collection has {page_count} pages, more than the limit of {max_pages}")]
    PageLimitExceeded { page_count: u32, max_pages: u32 },

    #[error("Failed to fetch page {page_index}: {source}")]
    PageFetch {
        page_index: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Malformed response{}: {message}", page_suffix(.page_index))]
    MalformedResponse {
        page_index: Option<u32>,
        message: String,
    },

    // ============================================================================
    // Request Errors
    // ============================================================================
    #[error("Invalid repository identifier '{input}': {message}")]
    InvalidRepoId { input: String, message: String },

    #[error("OAuth2 error: {message}")]
    OAuth2 { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

fn page_suffix(page_index: &Option<u32>) -> String {
    page_index.map(|p| format!(" on page {p}")).unwrap_or_default()
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a link header parse error
    pub fn link_parse(header: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LinkParse {
            header: header.into(),
            message: message.into(),
        }
    }

    /// Wrap a transport error as the failure of one page
    pub fn page_fetch(page_index: u32, source: Error) -> Self {
        Self::PageFetch {
            page_index,
            source: Box::new(source),
        }
    }

    /// Create a malformed response error
    pub fn malformed(page_index: Option<u32>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            page_index,
            message: message.into(),
        }
    }

    /// Create an invalid repository identifier error
    pub fn invalid_repo(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRepoId {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create an OAuth2 error
    pub fn oauth2(message: impl Into<String>) -> Self {
        Self::OAuth2 {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Page index of a failed page fetch, if this is one
    pub fn failed_page(&self) -> Option<u32> {
        match self {
            Error::PageFetch { page_index, .. } => Some(*page_index),
            Error::MalformedResponse { page_index, .. } => *page_index,
            _ => None,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for forgefetch
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
