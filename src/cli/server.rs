//! HTTP server mode exposing the retrieval operations as JSON endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{Error, Result};
use crate::service::GitHubService;
use crate::types::ResourceKind;

/// App state shared across handlers
#[derive(Clone)]
struct AppState {
    service: GitHubService,
}

/// Token passed by the caller
#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    #[serde(default)]
    access_token: String,
}

/// Query for paged endpoints
#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    #[serde(default)]
    access_token: String,
    /// Fetch a single page instead of all pages
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    per_page: Option<u32>,
    /// Commits only: return the last page of the history
    #[serde(default)]
    latest: bool,
}

/// Request body for markdown rendering
#[derive(Debug, Deserialize)]
struct MarkdownRequest {
    text: String,
}

/// Request body for the OAuth code exchange
#[derive(Debug, Deserialize)]
struct TokenRequest {
    code: String,
    client_id: String,
    client_secret: String,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Build the router
pub fn router(service: GitHubService) -> Router {
    let state = AppState { service };

    // Build CORS layer - allow all origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/repos/:owner/:repo", get(repo_info))
        .route("/repos/:owner/:repo/contributors", get(contributors))
        .route("/repos/:owner/:repo/commits", get(commits))
        .route("/repos/:owner/:repo/commits/:sha", get(commit))
        .route("/repos/:owner/:repo/contents", get(contents))
        .route("/repos/:owner/:repo/compare/:base/:head", get(compare))
        .route("/orgs/:org/repos", get(org_repos))
        .route("/markdown", post(markdown))
        .route("/oauth/token", post(oauth_token))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(service: GitHubService, port: u16) -> Result<()> {
    let app = router(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn repo_info(
    State(state): State<Arc<AppState>>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Response {
    respond(
        state
            .service
            .retrieve_repo_info(&format!("{owner}/{repo}"), &query.access_token)
            .await,
    )
}

async fn contributors(
    State(state): State<Arc<AppState>>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Response {
    let repo = format!("{owner}/{repo}");
    let token = &query.access_token;
    let result = match query.page {
        Some(page) => {
            state
                .service
                .retrieve_contributors_page(&repo, page, token)
                .await
        }
        None => state.service.retrieve_all_contributors(&repo, token).await,
    };
    respond(result)
}

async fn commits(
    State(state): State<Arc<AppState>>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Response {
    let repo = format!("{owner}/{repo}");
    let token = &query.access_token;
    let result = if query.latest {
        state.service.retrieve_latest_commit_page(&repo, token).await
    } else if let Some(page) = query.page {
        let per_page = query.per_page.unwrap_or(30);
        state
            .service
            .retrieve_commits_page(&repo, page, token, per_page)
            .await
    } else {
        state
            .service
            .get_all_of_type(&repo, ResourceKind::Commits, token)
            .await
    };
    respond(result)
}

async fn commit(
    State(state): State<Arc<AppState>>,
    Path((owner, repo, sha)): Path<(String, String, String)>,
    Query(query): Query<TokenQuery>,
) -> Response {
    respond(
        state
            .service
            .retrieve_commit(&format!("{owner}/{repo}"), &sha, &query.access_token)
            .await,
    )
}

async fn contents(
    State(state): State<Arc<AppState>>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<TokenQuery>,
) -> Response {
    respond(
        state
            .service
            .retrieve_repo_contents(&format!("{owner}/{repo}"), &query.access_token)
            .await,
    )
}

async fn compare(
    State(state): State<Arc<AppState>>,
    Path((owner, repo, base, head)): Path<(String, String, String, String)>,
    Query(query): Query<TokenQuery>,
) -> Response {
    respond(
        state
            .service
            .compare_commits_by_uri(&format!("{owner}/{repo}"), &query.access_token, &base, &head)
            .await,
    )
}

async fn org_repos(
    State(state): State<Arc<AppState>>,
    Path(org): Path<String>,
    Query(query): Query<TokenQuery>,
) -> Response {
    respond(
        state
            .service
            .retrieve_org_repos(&org, &query.access_token)
            .await,
    )
}

async fn markdown(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
    Json(req): Json<MarkdownRequest>,
) -> Response {
    match state
        .service
        .render_markdown(&req.text, &query.access_token)
        .await
    {
        Ok(html) => ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn oauth_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Response {
    let outcome = state
        .service
        .exchange_code_for_token(&req.code, &req.client_id, &req.client_secret)
        .await;

    match outcome.token() {
        Some(token) => Json(ApiResponse::success(json!({ "access_token": token }))).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error("no access token was granted")),
        )
            .into_response(),
    }
}

fn respond(result: Result<Value>) -> Response {
    match result {
        Ok(data) => Json(ApiResponse::success(data)).into_response(),
        Err(e) => error_response(&e),
    }
}

fn error_response(error: &Error) -> Response {
    tracing::warn!(error = %error, "Request failed");
    (
        status_for(error),
        Json(ApiResponse::<()>::error(error.to_string())),
    )
        .into_response()
}

/// HTTP status reported for a failed operation
fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::InvalidRepoId { .. } => StatusCode::BAD_REQUEST,
        Error::BaseUrlUnavailable { .. } | Error::Config { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Error::OAuth2 { .. } => StatusCode::UNAUTHORIZED,
        Error::HttpStatus { status, .. } if (400..500).contains(status) => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        Error::PageFetch { source, .. } => status_for(source),
        Error::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        Error::HttpStatus { .. }
        | Error::Http(_)
        | Error::MaxRetriesExceeded { .. }
        | Error::LinkParse { .. }
        | Error::PageLimitExceeded { .. }
        | Error::MalformedResponse { .. }
        | Error::JsonParse(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
