// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # forgefetch
//!
//! Client for GitHub-compatible REST APIs: repository info, commits,
//! contributors, contents, comparisons, markdown rendering and the OAuth
//! authorization-code exchange.
//!
//! ## Features
//!
//! - **Link-header pagination**: the page count is read from `rel="last"`
//! - **Concurrent page fetch**: pages are requested in parallel and merged in
//!   page order; the first failing page fails the whole retrieval
//! - **Retry and rate limiting**: exponential backoff and a token bucket
//! - **CLI and HTTP server mode**
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forgefetch::{GitHubService, ResourceKind, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> forgefetch::Result<()> {
//!     let config = ServiceConfig::default().with_api_url("https://api.github.com");
//!     let service = GitHubService::new(&config)?;
//!
//!     let contributors = service
//!         .get_all_of_type("rust-lang/cargo", ResourceKind::Contributors, "")
//!         .await?;
//!     println!("{contributors}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        GitHubService                            │
//! │  get_all_of_type()   retrieve_*()   render_markdown()   oauth   │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────────┬───────────────────────┐
//! │  Link parser │  PageOrchestrator        │  PageFetcher          │
//! ├──────────────┼──────────────────────────┼───────────────────────┤
//! │ rel="last"   │ buffer_unordered fan-out │ page / per_page query │
//! │ page count   │ ordered merge, fail-fast │ JSON array decode     │
//! └──────────────┴──────────────────────────┴───────────────────────┘
//!                                │
//!                 HttpClient (retry, backoff, rate limit)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Document error variant fields

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Access tokens and the OAuth code exchange
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Link-header pagination, page fetch and ordered merge
pub mod pagination;

/// Repository identifiers
pub mod repo;

/// Service configuration
pub mod config;

/// Repository metadata service
pub mod service;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{AccessToken, TokenExchange};
pub use config::{BaseUrl, ServiceConfig};
pub use error::{Error, Result};
pub use pagination::{MergedCollection, PageCount};
pub use repo::RepoId;
pub use service::GitHubService;
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
