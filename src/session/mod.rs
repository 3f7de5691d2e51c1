//! Authenticated session against the REST v10 API.
//!
//! A [`Session`] moves through these states:
//!
//! ```text
//! new ──connect──▶ authenticated ──401──▶ refresh ──ok──▶ authenticated
//!  ▲                                         │
//!  └──────────────── failed (tokens cleared) ┘
//! ```
//!
//! Expiry is only discovered reactively: a 401 on [`Session::call_json`]
//! triggers exactly one refresh. All mutable state (token pair and session
//! info) sits behind one async mutex held for the whole
//! request → maybe refresh → maybe retry sequence, so concurrent callers on a
//! shared session never race a refresh.
//!
//! # Example
//!
//! ```rust,ignore
//! use sugar_session::{Query, Session};
//!
//! let session = Session::new("https://crm.example.com")?;
//! session.connect("jim", "jim").await?;
//!
//! let accounts = session
//!     .run_query(&Query::new("Accounts").with_max_num(10))
//!     .await?;
//! ```

mod call;
mod grant;

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::auth::TokenPair;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::info::SessionInfo;
use crate::query::Query;
use crate::transport::{ReqwestTransport, Transport};

/// Profile endpoint.
pub const ME_PATH: &str = "/me";

/// User preferences endpoint.
pub const PREFERENCES_PATH: &str = "/me/preferences";

/// Mutable part of a session.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionState {
    pub(crate) tokens: TokenPair,
    pub(crate) info: SessionInfo,
}

/// One logical user session.
pub struct Session {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create an unauthenticated session for a server URL.
    ///
    /// No network call is made. The URL carries protocol and host only, the
    /// REST service prefix is appended per request.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(SessionConfig::new(base_url))
    }

    /// Create a session from a full configuration.
    pub fn with_config(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::from_parts(config, Arc::new(transport)))
    }

    /// Create a session over a custom transport.
    pub fn with_transport(config: SessionConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, transport))
    }

    fn from_parts(config: SessionConfig, transport: Arc<dyn Transport>) -> Self {
        debug!(base_url = %config.base_url, "Session created");
        Self {
            config,
            transport,
            state: Mutex::new(SessionState::default()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Snapshot of the current token pair.
    pub async fn tokens(&self) -> TokenPair {
        self.state.lock().await.tokens.clone()
    }

    /// Snapshot of the loaded session info.
    pub async fn info(&self) -> SessionInfo {
        self.state.lock().await.info.clone()
    }

    /// True when an access token is held.
    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.tokens.is_authenticated()
    }

    /// Case-sensitive check against the loaded module list.
    pub async fn has_module(&self, module: &str) -> bool {
        self.state.lock().await.info.has_module(module)
    }

    /// Forget tokens and session info locally.
    ///
    /// The server is not contacted; issued tokens stay valid there until
    /// they expire.
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        *state = SessionState::default();
        debug!("Session state cleared");
    }

    /// Issue an authenticated JSON call.
    ///
    /// `body` is serialized when present. A 200 response is decoded into `R`;
    /// any other status is [`Error::NonOk`]. A 401 triggers one token refresh;
    /// whether the original request is then re-issued follows
    /// [`SessionConfig::retry_after_refresh`].
    #[instrument(skip(self, body), fields(method = %method))]
    pub async fn call_json<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let payload = call::encode(body)?;
        let mut state = self.state.lock().await;
        self.call_locked(&mut state, method, path, payload).await
    }

    /// `GET` a path without a body.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.call_json::<Value, R>(Method::GET, path, None).await
    }

    /// Fetch `/me` and `/me/preferences` into the session info.
    ///
    /// The implicit module is appended once `/me` is decoded. A failure on
    /// `/me/preferences` leaves the freshly decoded base info in place.
    #[instrument(skip(self))]
    pub async fn load_info(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        let me: Value = self.call_locked(&mut state, Method::GET, ME_PATH, None).await?;
        apply_me(&mut state, &me)?;

        let prefs: Value = self
            .call_locked(&mut state, Method::GET, PREFERENCES_PATH, None)
            .await?;
        apply_preferences(&mut state, &prefs)
    }

    /// Run a filter query against a module of the loaded module list.
    ///
    /// Fails with [`Error::ModuleUnavailable`] before any request when the
    /// module is not listed.
    #[instrument(skip(self, query), fields(module = %query.module))]
    pub async fn run_query(&self, query: &Query) -> Result<Value> {
        let mut state = self.state.lock().await;

        if !state.info.has_module(&query.module) {
            return Err(Error::ModuleUnavailable(query.module.clone()));
        }

        let payload = call::encode(Some(query))?;
        self.call_locked(&mut state, query.method.clone(), &query.path(), payload)
            .await
    }
}

/// Decode a `/me` response into the base session info.
///
/// User preferences already loaded are carried over; they have their own
/// source.
pub(crate) fn apply_me(state: &mut SessionState, me: &Value) -> Result<()> {
    let current_user = me
        .get("current_user")
        .and_then(Value::as_object)
        .ok_or(Error::MissingCurrentUser)?;

    let mut info = SessionInfo::from_current_user(current_user)?;
    info.user_preferences = std::mem::take(&mut state.info.user_preferences);
    if info.ensure_implicit_module() {
        debug!(module = crate::info::IMPLICIT_MODULE, "Added implicit module");
    }

    state.info = info;
    Ok(())
}

/// Decode a `/me/preferences` response into the user preferences.
pub(crate) fn apply_preferences(state: &mut SessionState, prefs: &Value) -> Result<()> {
    let prefs = prefs
        .as_object()
        .ok_or_else(|| Error::decode("preferences", "expected an object"))?;
    state.info.apply_user_preferences(prefs)
}

#[cfg(test)]
mod tests;
