//! Authentication module
//!
//! Access tokens are sent as the `access_token` query parameter. This module
//! holds the token types and the OAuth authorization-code exchange.

mod oauth;
mod types;

pub use oauth::{exchange_code, parse_token_response, request_token, DEFAULT_TOKEN_URL};
pub use types::{AccessToken, ClientCredentials, TokenExchange};

#[cfg(test)]
mod tests;
