//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ServiceConfig;
use crate::error::{Error, Result, ResultExt};
use crate::service::GitHubService;
use serde_json::{json, Value};
use std::io::Read;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let service = GitHubService::new(&self.load_config())?;
        let token = self.cli.token.as_str();

        match &self.cli.command {
            Commands::Repo { repo } => {
                let info = service.retrieve_repo_info(repo, token).await?;
                self.output(&info)
            }
            Commands::OrgRepos { repo } => {
                let repos = service.retrieve_org_repos(repo, token).await?;
                self.output(&repos)
            }
            Commands::Commits {
                repo,
                page,
                per_page,
            } => {
                let commits = service
                    .retrieve_commits_page(repo, *page, token, *per_page)
                    .await?;
                self.output(&commits)
            }
            Commands::LatestCommits { repo } => {
                let commits = service.retrieve_latest_commit_page(repo, token).await?;
                self.output(&commits)
            }
            Commands::Commit { repo, sha } => {
                let commit = service.retrieve_commit(repo, sha, token).await?;
                self.output(&commit)
            }
            Commands::Contents { repo } => {
                let contents = service.retrieve_repo_contents(repo, token).await?;
                self.output(&contents)
            }
            Commands::Contributors { repo, page } => {
                let contributors = match page {
                    Some(page) => service.retrieve_contributors_page(repo, *page, token).await?,
                    None => service.retrieve_all_contributors(repo, token).await?,
                };
                self.output(&contributors)
            }
            Commands::All { repo, kind } => {
                let merged = service.get_all_of_type(repo, *kind, token).await?;
                self.output(&merged)
            }
            Commands::Compare { repo, base, head } => {
                let comparison = service
                    .compare_commits_by_uri(repo, token, base, head)
                    .await?;
                self.output(&comparison)
            }
            Commands::Markdown { text } => {
                let text = match text {
                    Some(text) => text.clone(),
                    None => read_stdin()?,
                };
                let html = service.render_markdown(&text, token).await?;
                println!("{html}");
                Ok(())
            }
            Commands::Fetch { url } => {
                let body = service.retrieve_url(url).await?;
                println!("{body}");
                Ok(())
            }
            Commands::Token {
                code,
                client_id,
                client_secret,
            } => {
                let outcome = service
                    .exchange_code_for_token(code, client_id, client_secret)
                    .await;
                match outcome.token() {
                    Some(token) => self.output(&json!({ "access_token": token })),
                    None => Err(Error::oauth2("no access token was granted")),
                }
            }
            Commands::Serve { port } => crate::cli::serve(service, *port).await,
        }
    }

    /// Configuration file, environment, then command-line overrides
    fn load_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::load(self.cli.config.as_deref());
        if let Some(url) = &self.cli.api_url {
            config = config.with_api_url(url);
        }
        config
    }

    /// Output a JSON value
    fn output(&self, value: &Value) -> Result<()> {
        let rendered = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{rendered}");
        Ok(())
    }
}

fn read_stdin() -> Result<String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read markdown from stdin")?;
    Ok(text)
}
