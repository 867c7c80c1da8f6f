//! CLI module
//!
//! Command-line interface over [`GitHubService`](crate::service::GitHubService).
//!
//! # Commands
//!
//! - `repo`, `org-repos`, `contents`, `commit`, `compare` - single requests
//! - `commits`, `latest-commits`, `contributors` - paged collections
//! - `all` - every page of a collection, merged in order
//! - `markdown`, `fetch`, `token` - passthroughs
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
pub use server::{router, serve};
