//! CLI commands and argument parsing

use crate::types::ResourceKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Repository metadata client for GitHub-compatible REST APIs
#[derive(Parser, Debug)]
#[command(name = "forgefetch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); defaults to ./forgefetch.yaml when present
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, overrides the configuration file
    #[arg(long, global = true, env = "FORGEFETCH_API_URL")]
    pub api_url: Option<String>,

    /// Access token sent as the access_token query parameter
    #[arg(short, long, global = true, env = "GITHUB_TOKEN", hide_env_values = true, default_value = "")]
    pub token: String,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// General repository information
    Repo {
        /// Repository (owner/name or URL)
        repo: String,
    },

    /// Repositories of the organisation owning a repository
    OrgRepos {
        /// Repository (owner/name or URL) or organisation name
        repo: String,
    },

    /// One page of commits
    Commits {
        /// Repository (owner/name or URL)
        repo: String,

        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Commits per page
        #[arg(long, default_value = "30")]
        per_page: u32,
    },

    /// The last page of the commit history (oldest commits)
    LatestCommits {
        /// Repository (owner/name or URL)
        repo: String,
    },

    /// A single commit
    Commit {
        /// Repository (owner/name or URL)
        repo: String,

        /// Commit SHA
        sha: String,
    },

    /// Top-level repository contents
    Contents {
        /// Repository (owner/name or URL)
        repo: String,
    },

    /// Contributors, all pages unless --page is given
    Contributors {
        /// Repository (owner/name or URL)
        repo: String,

        /// Fetch only this page
        #[arg(long)]
        page: Option<u32>,
    },

    /// Every record of a collection, merged across pages
    All {
        /// Repository (owner/name or URL)
        repo: String,

        /// Collection: commits, contributors, contents or repositories
        kind: ResourceKind,
    },

    /// Compare two commits
    Compare {
        /// Repository (owner/name or URL)
        repo: String,

        /// Base commit
        base: String,

        /// Head commit
        head: String,
    },

    /// Render markdown to HTML
    Markdown {
        /// Markdown text; read from stdin when omitted
        text: Option<String>,
    },

    /// GET an arbitrary URL and print the body
    Fetch {
        /// URL to fetch
        url: String,
    },

    /// Exchange an OAuth authorization code for an access token
    Token {
        /// Authorization code
        code: String,

        /// OAuth application client id
        #[arg(long, env = "GITHUB_CLIENT_ID")]
        client_id: String,

        /// OAuth application client secret
        #[arg(long, env = "GITHUB_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,
    },

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Indented JSON
    Pretty,
}
