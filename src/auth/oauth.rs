//! OAuth authorization-code exchange

use super::types::{AccessToken, ClientCredentials, TokenExchange};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use serde::Deserialize;
use tracing::{info, warn};

/// Default GitHub token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// Token endpoint response when JSON is requested
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Extract the access token from a token endpoint response.
///
/// GitHub answers `application/x-www-form-urlencoded` by default and JSON
/// when asked; both are accepted. Error responses come back with status
/// 200 and an `error` field, so the body decides success.
pub fn parse_token_response(body: &str) -> Result<AccessToken> {
    let body = body.trim();

    let response = if body.starts_with('{') {
        serde_json::from_str::<TokenResponse>(body)
            .map_err(|e| Error::oauth2(format!("unreadable token response: {e}")))?
    } else {
        let mut response = TokenResponse {
            access_token: None,
            error: None,
            error_description: None,
        };
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "access_token" => response.access_token = Some(value.into_owned()),
                "error" => response.error = Some(value.into_owned()),
                "error_description" => response.error_description = Some(value.into_owned()),
                _ => {}
            }
        }
        response
    };

    if let Some(error) = response.error {
        let message = match response.error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        };
        return Err(Error::oauth2(message));
    }

    match response.access_token {
        Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
        _ => Err(Error::oauth2("token response has no access_token")),
    }
}

/// POST the code to the token endpoint and parse the token
pub async fn request_token(
    client: &HttpClient,
    token_url: &str,
    credentials: &ClientCredentials,
    code: &str,
) -> Result<AccessToken> {
    let params = vec![
        ("client_id".to_string(), credentials.client_id.clone()),
        ("client_secret".to_string(), credentials.client_secret.clone()),
        ("code".to_string(), code.to_string()),
    ];
    let body = client.execute_post_form(token_url, params).await?;
    parse_token_response(&body)
}

/// Exchange an authorization code, folding every failure into
/// [`TokenExchange::NoToken`]
pub async fn exchange_code(
    client: &HttpClient,
    token_url: &str,
    credentials: &ClientCredentials,
    code: &str,
) -> TokenExchange {
    match request_token(client, token_url, credentials, code).await {
        Ok(token) => {
            info!(client_id = %credentials.client_id, "Authorization code exchanged");
            TokenExchange::Granted(token)
        }
        Err(e) => {
            warn!(client_id = %credentials.client_id, error = %e, "Authorization code exchange failed");
            TokenExchange::NoToken {
                reason: e.to_string(),
            }
        }
    }
}
