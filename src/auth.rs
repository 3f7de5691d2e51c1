//! OAuth2 token pair and grant wire records.
//!
//! The server issues tokens through two grants on `/oauth2/token`:
//!
//! | Grant | Request | Response |
//! |-------|---------|----------|
//! | password | [`AuthRequest`] | [`AuthResponse`] |
//! | refresh_token | [`RefreshRequest`] | [`AuthResponse`] |
//!
//! Request and response records are transient; only the [`TokenPair`]
//! derived from a response is kept by the session.

use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::{Error, Result};

/// Token endpoint path below the service prefix.
pub const TOKEN_PATH: &str = "/oauth2/token";

/// Header carrying the access token on authenticated calls.
pub const TOKEN_HEADER: &str = "oauth-token";

/// Password grant request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub platform: String,
}

impl AuthRequest {
    /// Password grant for the given credentials using the configured client.
    #[must_use]
    pub fn password(config: &SessionConfig, username: &str, password: &str) -> Self {
        Self {
            grant_type: "password".to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            username: username.to_string(),
            password: password.to_string(),
            platform: config.platform.clone(),
        }
    }
}

/// Refresh grant request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub grant_type: String,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
}

impl RefreshRequest {
    /// Refresh grant reusing the stored refresh token.
    #[must_use]
    pub fn new(config: &SessionConfig, refresh_token: &str) -> Self {
        Self {
            grant_type: "refresh_token".to_string(),
            refresh_token: refresh_token.to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }
}

/// Token endpoint response, shared by both grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub scope: Option<String>,
    pub refresh_token: String,
    pub refresh_expires_in: i64,
    pub download_token: Option<String>,
}

/// Access and refresh token held by a session.
///
/// Both tokens are set together or cleared together. Expiry values are the
/// server's hints at issue time; nothing schedules on them, an expired access
/// token is discovered through a 401.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub scope: Option<String>,
    pub download_token: Option<String>,
    /// Access token lifetime in seconds, as reported.
    pub expires_in: i64,
    /// Refresh token lifetime in seconds, as reported.
    pub refresh_expires_in: i64,
}

impl TokenPair {
    /// The unauthenticated pair.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when an access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// True when a refresh token is held.
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// True when neither token is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty() && self.refresh_token.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::empty();
    }
}

/// A grant response becomes a pair only when it carries both tokens.
impl TryFrom<AuthResponse> for TokenPair {
    type Error = Error;

    fn try_from(res: AuthResponse) -> Result<Self> {
        if res.access_token.is_empty() {
            return Err(Error::decode("access_token", "missing from grant response"));
        }
        if res.refresh_token.is_empty() {
            return Err(Error::decode("refresh_token", "missing from grant response"));
        }

        Ok(Self {
            access_token: res.access_token,
            refresh_token: res.refresh_token,
            token_type: res.token_type,
            scope: res.scope,
            download_token: res.download_token,
            expires_in: res.expires_in,
            refresh_expires_in: res.refresh_expires_in,
        })
    }
}

// Tokens never reach logs in clear.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &mask_token(&self.access_token))
            .field("refresh_token", &mask_token(&self.refresh_token))
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_expires_in", &self.refresh_expires_in)
            .finish()
    }
}

/// Masks a token for logging, keeping at most the first four characters.
#[must_use]
pub fn mask_token(token: &str) -> String {
    match token.char_indices().nth(4) {
        Some((idx, _)) => format!("{}****", &token[..idx]),
        None => "*".repeat(token.chars().count()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_password_grant_wire_format() {
        let config = SessionConfig::new("https://crm.example.com");
        let request = AuthRequest::password(&config, "jim", "secret");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "grant_type": "password",
                "client_id": "sugar",
                "client_secret": "",
                "username": "jim",
                "password": "secret",
                "platform": "base",
            })
        );
    }

    #[test]
    fn test_refresh_grant_wire_format() {
        let config = SessionConfig::new("https://crm.example.com");
        let request = RefreshRequest::new(&config, "refresh-1");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "grant_type": "refresh_token",
                "refresh_token": "refresh-1",
                "client_id": "sugar",
                "client_secret": "",
            })
        );
    }

    #[test]
    fn test_auth_response_into_pair() {
        let response: AuthResponse = serde_json::from_value(json!({
            "access_token": "acc",
            "expires_in": 3600,
            "token_type": "bearer",
            "scope": null,
            "refresh_token": "ref",
            "refresh_expires_in": 1209600,
            "download_token": "dl"
        }))
        .unwrap();

        let pair = TokenPair::try_from(response).unwrap();
        assert_eq!(pair.access_token, "acc");
        assert_eq!(pair.refresh_token, "ref");
        assert_eq!(pair.expires_in, 3600);
        assert_eq!(pair.refresh_expires_in, 1_209_600);
        assert_eq!(pair.download_token.as_deref(), Some("dl"));
        assert!(pair.is_authenticated());
        assert!(pair.has_refresh_token());
    }

    #[test]
    fn test_auth_response_without_both_tokens_is_rejected() {
        let response: AuthResponse =
            serde_json::from_value(json!({"access_token": "acc", "expires_in": 3600})).unwrap();
        match TokenPair::try_from(response) {
            Err(Error::Decode { field, .. }) => assert_eq!(field, "refresh_token"),
            other => panic!("unexpected: {other:?}"),
        }

        let response: AuthResponse =
            serde_json::from_value(json!({"refresh_token": "ref"})).unwrap();
        match TokenPair::try_from(response) {
            Err(Error::Decode { field, .. }) => assert_eq!(field, "access_token"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_clear() {
        let mut pair = TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
            ..TokenPair::default()
        };
        pair.clear();
        assert!(pair.is_empty());
        assert!(!pair.is_authenticated());
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdef123"), "abcd****");
        assert_eq!(mask_token("abc"), "***");
        assert_eq!(mask_token(""), "");
    }

    #[test]
    fn test_debug_masks_tokens() {
        let pair = TokenPair {
            access_token: "secret-access".into(),
            refresh_token: "secret-refresh".into(),
            ..TokenPair::default()
        };
        let debug = format!("{pair:?}");
        assert!(!debug.contains("secret-access"));
        assert!(debug.contains("secr****"));
    }
}
