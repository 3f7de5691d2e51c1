//! Error types for the session client.
//!
//! One [`Error`] enum covers every failure the session can surface:
//!
//! - **Transport**: the request never produced an HTTP response
//! - **Response**: the server answered with something other than 200
//! - **Token**: refresh requested without a refresh token
//! - **Data**: JSON errors, unexpected shapes, lenient decode failures
//! - **Validation**: a query against a module the session cannot see
//! - **Configuration**: bad base URL or config sources
//!
//! Nothing here is retried or logged on the caller's behalf; recovery policy
//! (such as logging in again) belongs to the caller.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed source error produced by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by a [`Session`](crate::Session).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Network, DNS or TLS failure while issuing a request.
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// The server answered with a status other than 200.
    ///
    /// `body` is absent when the failure is reported after a rejected token
    /// refresh; the original 401 status is kept in that case.
    #[error("non OK response: {status} {reason}{}", body_suffix(.body))]
    NonOk {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
        /// Response body text.
        body: Option<String>,
    },

    /// A refresh was requested but no refresh token is stored.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The `/me` response did not carry an object-valued `current_user`.
    #[error("Could not locate current_user json element")]
    MissingCurrentUser,

    /// JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field could not be coerced into its declared type.
    #[error("Cannot decode '{field}': {message}")]
    Decode {
        /// Dotted path of the offending field.
        field: String,
        /// What was expected and what arrived.
        message: String,
    },

    /// The module is not in the session's module list.
    #[error("Module {0} is not available for querying")]
    ModuleUnavailable(String),

    /// Invalid base URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .map(|b| format!("\nBody: {b}"))
        .unwrap_or_default()
}

impl Error {
    /// Create a transport error from any source error.
    #[must_use]
    pub fn transport(source: impl Into<BoxError>) -> Self {
        Self::Transport(source.into())
    }

    /// Create a non-OK response error.
    #[must_use]
    pub fn non_ok(status: u16, reason: impl Into<String>, body: Option<String>) -> Self {
        Self::NonOk {
            status,
            reason: reason.into(),
            body,
        }
    }

    /// Create a decode error for a field path.
    #[must_use]
    pub fn decode(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NonOk { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is a 401 Unauthorized response.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::NonOk { status: 401, .. })
    }

    /// Check if the caller has to log in again.
    ///
    /// True for a missing refresh token and for the body-less 401 reported
    /// when the in-band refresh failed; the session holds no tokens then.
    /// A 401 that still carries its body was followed by a successful
    /// refresh: the session already holds fresh tokens and the request can
    /// simply be re-issued, so this returns false.
    #[must_use]
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Self::NoRefreshToken | Self::NonOk { status: 401, body: None, .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}
