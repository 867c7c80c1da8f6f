//! Repository metadata service
//!
//! [`GitHubService`] is the public entry point. Single-request operations are
//! thin wrappers over the HTTP executor; [`GitHubService::get_all_of_type`]
//! runs the probe → page count → fan-out → merge pipeline.

use crate::auth::{self, ClientCredentials, TokenExchange};
use crate::config::{BaseUrl, PaginationSettings, ServiceConfig};
use crate::error::{Error, Result};
use crate::http::{redact, HttpClient, RequestConfig};
use crate::pagination::{
    decode_object, decode_page, last_page_url, parse_page_count, PageCount, PageFetcher,
    PageOrchestrator, PaginationCursor,
};
use crate::repo::{parse_owner, RepoId};
use crate::types::{envelope, ResourceKind};
use serde_json::{json, Value};
use tracing::{debug, info};

/// Client for repository, commit, contributor and content metadata
#[derive(Debug, Clone)]
pub struct GitHubService {
    client: HttpClient,
    base_url: BaseUrl,
    oauth_token_url: String,
    pagination: PaginationSettings,
}

impl GitHubService {
    /// Build a service from configuration
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = HttpClient::with_config(config.http_client_config())?;
        Ok(Self::with_client(client, config))
    }

    /// Build a service around an existing HTTP client
    pub fn with_client(client: HttpClient, config: &ServiceConfig) -> Self {
        let base_url = config.base_url();
        if let BaseUrl::Unavailable { reason } = &base_url {
            tracing::warn!(%reason, "API base URL unavailable; API calls will fail");
        }
        Self {
            client,
            base_url,
            oauth_token_url: config.api.oauth_token_url.clone(),
            pagination: config.pagination.clone(),
        }
    }

    /// The resolved API base URL
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    // ========================================================================
    // Collections
    // ========================================================================

    /// Retrieve every record of a collection, merged across all pages, as
    /// `{ "<kind>": [...] }`.
    ///
    /// Page 1 doubles as the probe: its `Link` header gives the page count and
    /// its records are reused, so each page is fetched once. With
    /// `reuse_probe: false` page 1 is fetched again by the orchestrator.
    pub async fn get_all_of_type(
        &self,
        repo_uri: &str,
        kind: ResourceKind,
        token: &str,
    ) -> Result<Value> {
        info!("Retrieving all {kind} of {repo_uri}");
        let uri = self.collection_uri(repo_uri, kind)?;
        let page_size = self.pagination.page_size_for(kind);
        let fetcher = self.fetcher(kind, token);

        let probe = fetcher.fetch_probe(&uri, 1, page_size).await?;
        let page_count = parse_page_count(probe.cursor.as_ref().map(PaginationCursor::as_str))?;
        debug!(%page_count, "Discovered page count");

        let orchestrator = PageOrchestrator::new(fetcher)
            .with_concurrency(self.pagination.max_concurrency)
            .with_max_pages(self.pagination.max_pages);
        let merged = if self.pagination.reuse_probe {
            orchestrator
                .retrieve_remaining(probe.page, |_| uri.clone(), page_count, page_size)
                .await?
        } else {
            orchestrator
                .retrieve_all(|_| uri.clone(), page_count, page_size)
                .await?
        };

        info!(
            "Finished retrieving {} {kind} of {repo_uri} from {page_count} page(s)",
            merged.len()
        );
        Ok(merged.into_envelope(kind))
    }

    /// All contributors, anonymous ones included
    pub async fn retrieve_all_contributors(&self, repo_uri: &str, token: &str) -> Result<Value> {
        self.get_all_of_type(repo_uri, ResourceKind::Contributors, token)
            .await
    }

    /// One page of contributors (100 per page)
    pub async fn retrieve_contributors_page(
        &self,
        repo_uri: &str,
        page: u32,
        token: &str,
    ) -> Result<Value> {
        let kind = ResourceKind::Contributors;
        let page_size = self.pagination.page_size_for(kind);
        self.collection_page(repo_uri, kind, page, page_size, token)
            .await
    }

    /// One page of commits
    pub async fn retrieve_commits_page(
        &self,
        repo_uri: &str,
        page: u32,
        token: &str,
        page_size: u32,
    ) -> Result<Value> {
        self.collection_page(repo_uri, ResourceKind::Commits, page, page_size, token)
            .await
    }

    /// The last page of the commit list, i.e. the oldest commits.
    ///
    /// Without a `Link` header the history fits on page 1, which is returned
    /// as is.
    pub async fn retrieve_latest_commit_page(&self, repo_uri: &str, token: &str) -> Result<Value> {
        info!("Retrieving initial page of commits from {repo_uri}");
        let kind = ResourceKind::Commits;
        let uri = self.collection_uri(repo_uri, kind)?;
        let page_size = self.pagination.page_size_for(kind);

        let probe = self.fetcher(kind, token).fetch_probe(&uri, 1, page_size).await?;
        let Some(cursor) = probe.cursor else {
            return Ok(envelope(kind, probe.page.items));
        };

        let last_page = parse_page_count(Some(cursor.as_str()))?;
        let page = if last_page == PageCount::SINGLE {
            probe.page
        } else {
            let url = last_page_url(cursor.as_str())?;
            debug!(url = %redact(&url), "Following rel=\"last\"");
            let config = if url.contains("access_token=") {
                RequestConfig::new()
            } else {
                token_query(token)
            };
            let response = self
                .client
                .execute_get_with_config(&url, config)
                .await
                .map_err(|e| Error::page_fetch(last_page.get(), e))?;
            decode_page(last_page.get(), &response.body)?
        };

        info!("Finished retrieving initial page of commits from {repo_uri}");
        Ok(envelope(kind, page.items))
    }

    /// Top-level contents of a repository
    pub async fn retrieve_repo_contents(&self, repo_uri: &str, token: &str) -> Result<Value> {
        info!("Retrieving contents of repo {repo_uri}");
        let repo = RepoId::parse(repo_uri)?;
        let url = self.api_url(&format!("{}/contents", repo.api_path()))?;
        let items = self.get_array(&url, token).await?;
        info!("Finished retrieving contents of repo {repo_uri}");
        Ok(envelope(ResourceKind::Contents, items))
    }

    /// Repositories of the organisation that owns `repo_uri`
    pub async fn retrieve_org_repos(&self, repo_uri: &str, token: &str) -> Result<Value> {
        info!("Retrieving generic organisation info of {repo_uri}");
        let url = self.api_url(&format!("/orgs/{}/repos", parse_owner(repo_uri)?))?;
        let items = self.get_array(&url, token).await?;
        info!("Finished retrieving generic organisation info of {repo_uri}");
        Ok(envelope(ResourceKind::Repositories, items))
    }

    // ========================================================================
    // Single objects
    // ========================================================================

    /// General repository information
    pub async fn retrieve_repo_info(&self, repo_uri: &str, token: &str) -> Result<Value> {
        info!("Retrieving generic repo info of {repo_uri}");
        let repo = RepoId::parse(repo_uri)?;
        let url = self.api_url(&repo.api_path())?;
        let info = self.get_object(&url, token).await?;
        info!("Finished retrieving generic repo info of {repo_uri}");
        Ok(info)
    }

    /// A single commit
    pub async fn retrieve_commit(&self, repo_uri: &str, sha: &str, token: &str) -> Result<Value> {
        info!("Retrieving commit {sha} from {repo_uri}");
        let repo = RepoId::parse(repo_uri)?;
        let url = self.api_url(&format!("{}/commits/{sha}", repo.api_path()))?;
        self.get_object(&url, token).await
    }

    /// Compare two commits of a repository given by URI
    pub async fn compare_commits_by_uri(
        &self,
        repo_uri: &str,
        token: &str,
        base_sha: &str,
        head_sha: &str,
    ) -> Result<Value> {
        let repo = RepoId::parse(repo_uri)?;
        self.compare_commits(&repo, token, base_sha, head_sha).await
    }

    /// Compare two commits (`base...head`)
    pub async fn compare_commits(
        &self,
        repo: &RepoId,
        token: &str,
        base_sha: &str,
        head_sha: &str,
    ) -> Result<Value> {
        let url = self.api_url(&format!(
            "{}/compare/{base_sha}...{head_sha}",
            repo.api_path()
        ))?;
        self.get_object(&url, token).await
    }

    // ========================================================================
    // Raw passthroughs
    // ========================================================================

    /// GET an arbitrary URL and return the body text
    pub async fn retrieve_url(&self, url: &str) -> Result<String> {
        info!("Retrieving contents from url: {}", redact(url));
        let response = self.client.execute_get(url).await?;
        Ok(response.body)
    }

    /// Render GitHub-flavoured markdown to HTML
    pub async fn render_markdown(&self, text: &str, token: &str) -> Result<String> {
        let url = self.api_url("/markdown")?;
        let config = token_query(token).json(json!({ "text": text, "mode": "gfm" }));
        self.client.execute_post_json(&url, config).await
    }

    /// Exchange an OAuth authorization code for an access token
    pub async fn exchange_code_for_token(
        &self,
        code: &str,
        client_id: &str,
        client_secret: &str,
    ) -> TokenExchange {
        let credentials = ClientCredentials::new(client_id, client_secret);
        auth::exchange_code(&self.client, &self.oauth_token_url, &credentials, code).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn api_url(&self, path: &str) -> Result<String> {
        self.base_url.join(path)
    }

    fn collection_uri(&self, repo_uri: &str, kind: ResourceKind) -> Result<String> {
        let path = match kind {
            ResourceKind::Repositories => format!("/orgs/{}/repos", parse_owner(repo_uri)?),
            _ => format!(
                "{}/{}",
                RepoId::parse(repo_uri)?.api_path(),
                kind.path_segment()
            ),
        };
        self.api_url(&path)
    }

    fn fetcher(&self, kind: ResourceKind, token: &str) -> PageFetcher {
        let mut fetcher = PageFetcher::new(self.client.clone());
        for (key, value) in kind.extra_query() {
            fetcher = fetcher.with_query(*key, *value);
        }
        if !token.is_empty() {
            fetcher = fetcher.with_query("access_token", token);
        }
        fetcher
    }

    async fn collection_page(
        &self,
        repo_uri: &str,
        kind: ResourceKind,
        page: u32,
        page_size: u32,
        token: &str,
    ) -> Result<Value> {
        use crate::pagination::PageSource;

        let uri = self.collection_uri(repo_uri, kind)?;
        let page = self
            .fetcher(kind, token)
            .fetch_page(&uri, page, page_size)
            .await?;
        Ok(envelope(kind, page.items))
    }

    async fn get_object(&self, url: &str, token: &str) -> Result<Value> {
        let response = self
            .client
            .execute_get_with_config(url, token_query(token))
            .await?;
        decode_object(&response.body)
    }

    async fn get_array(&self, url: &str, token: &str) -> Result<Vec<crate::types::Record>> {
        let response = self
            .client
            .execute_get_with_config(url, token_query(token))
            .await?;
        Ok(decode_page(1, &response.body)?.items)
    }
}

/// `access_token` query parameter, omitted for anonymous access
fn token_query(token: &str) -> RequestConfig {
    if token.is_empty() {
        RequestConfig::new()
    } else {
        RequestConfig::new().query("access_token", token)
    }
}
