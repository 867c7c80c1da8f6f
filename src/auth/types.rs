//! Credential and token types

use serde::{Serialize, Serializer};
use std::fmt;

/// An OAuth access token.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The token value, for building requests
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl Serialize for AccessToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// OAuth application credentials
#[derive(Clone)]
pub struct ClientCredentials {
    /// Application client id
    pub client_id: String,
    /// Application client secret
    pub client_secret: String,
}

impl ClientCredentials {
    /// Create credentials
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Outcome of exchanging an authorization code.
///
/// A failed exchange is not an error for the caller: it is the explicit
/// `NoToken` outcome, never an empty token string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenExchange {
    /// The server issued a token
    Granted(AccessToken),
    /// No token was obtained
    NoToken {
        /// Why the exchange failed
        reason: String,
    },
}

impl TokenExchange {
    /// The granted token, if any
    pub fn token(&self) -> Option<&AccessToken> {
        match self {
            Self::Granted(token) => Some(token),
            Self::NoToken { .. } => None,
        }
    }

    /// Whether a token was granted
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}
