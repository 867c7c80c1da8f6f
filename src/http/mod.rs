//! HTTP request executor
//!
//! The single transport used by every retrieval: GET and POST with retries,
//! backoff and rate limiting.
//!
//! # Features
//!
//! - **Automatic Retries**: 429, 5xx, timeouts and connection errors
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Whole responses**: status, body and multi-valued headers in one value

mod client;
mod rate_limit;

pub(crate) use client::redact;
pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, RawResponse, RequestBody,
    RequestConfig,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
