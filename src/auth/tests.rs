//! Tests for the auth module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use test_case::test_case;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> HttpClient {
    let config = HttpClientConfig::builder()
        .max_retries(0)
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

#[test_case("access_token=gho_abc&scope=repo&token_type=bearer", "gho_abc" ; "form encoded")]
#[test_case(r#"{"access_token": "gho_abc", "token_type": "bearer", "scope": "repo"}"#, "gho_abc" ; "json")]
#[test_case("scope=&access_token=gho_abc", "gho_abc" ; "form encoded out of order")]
fn test_parse_token_response(body: &str, expected: &str) {
    let token = parse_token_response(body).unwrap();
    assert_eq!(token.secret(), expected);
}

#[test_case("error=bad_verification_code&error_description=The+code+passed+is+incorrect" ; "form error")]
#[test_case(r#"{"error": "incorrect_client_credentials"}"# ; "json error")]
#[test_case("" ; "empty body")]
#[test_case("access_token=" ; "empty token")]
#[test_case("{not json" ; "broken json")]
fn test_parse_token_response_rejects(body: &str) {
    assert!(matches!(
        parse_token_response(body),
        Err(Error::OAuth2 { .. })
    ));
}

#[test]
fn test_parse_token_error_message() {
    let err = parse_token_response("error=bad_verification_code&error_description=expired")
        .unwrap_err();
    assert_eq!(err.to_string(), "OAuth2 error: bad_verification_code: expired");
}

#[tokio::test]
async fn test_exchange_code_granted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .and(body_string_contains("client_id=app"))
        .and(body_string_contains("client_secret=s3cret"))
        .and(body_string_contains("code=c0de"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("access_token=gho_new&token_type=bearer"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/login/oauth/access_token", mock_server.uri());
    let credentials = ClientCredentials::new("app", "s3cret");
    let outcome = exchange_code(&client(), &url, &credentials, "c0de").await;

    assert_eq!(outcome, TokenExchange::Granted(AccessToken::new("gho_new")));
}

#[tokio::test]
async fn test_exchange_code_rejected_is_no_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("error=bad_verification_code"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/token", mock_server.uri());
    let outcome = exchange_code(&client(), &url, &ClientCredentials::new("a", "b"), "x").await;

    match outcome {
        TokenExchange::NoToken { reason } => assert!(reason.contains("bad_verification_code")),
        TokenExchange::Granted(_) => panic!("expected NoToken"),
    }
}

#[tokio::test]
async fn test_exchange_code_transport_failure_is_no_token() {
    let outcome = exchange_code(
        &client(),
        "http://127.0.0.1:9/login/oauth/access_token",
        &ClientCredentials::new("a", "b"),
        "x",
    )
    .await;

    assert!(!outcome.is_granted());
}
