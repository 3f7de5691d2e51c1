//! Configuration for a session.
//!
//! [`SessionConfig`] holds the server location, the fixed OAuth client
//! identity used by both grant flows, and transport settings. It can be built
//! in code with the `with_*` methods or layered from defaults, a TOML file and
//! `SUGAR_*` environment variables with [`SessionConfig::load`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// REST service prefix appended to the base URL.
pub const SERVICE_PATH: &str = "/rest/v10";

/// OAuth client id the server ships for its own web client.
pub const DEFAULT_CLIENT_ID: &str = "sugar";

/// Platform reported with the password grant.
pub const DEFAULT_PLATFORM: &str = "base";

/// Prefix for environment overrides (`SUGAR_BASE_URL`, ...).
pub const ENV_PREFIX: &str = "SUGAR_";

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Server URL with protocol and host, without the service path.
    ///
    /// Example: `https://crm.example.com`
    pub base_url: String,

    /// OAuth client id sent with both grants.
    pub client_id: String,

    /// OAuth client secret sent with both grants.
    pub client_secret: String,

    /// Platform sent with the password grant.
    pub platform: String,

    /// Skip TLS certificate validation.
    ///
    /// On by default: deployments commonly run with self-signed or internal
    /// certificates.
    pub accept_invalid_certs: bool,

    /// Re-issue the original request once after a 401 triggered a successful
    /// token refresh. Off by default, in which case the 401 is surfaced even
    /// though the session now holds fresh tokens.
    pub retry_after_refresh: bool,

    /// Total request timeout in seconds. `None` keeps the transport default.
    pub request_timeout_secs: Option<u64>,

    /// Connect timeout in seconds. `None` keeps the transport default.
    pub connect_timeout_secs: Option<u64>,

    /// User agent header value.
    pub user_agent: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            client_secret: String::new(),
            platform: DEFAULT_PLATFORM.to_string(),
            accept_invalid_certs: true,
            retry_after_refresh: false,
            request_timeout_secs: None,
            connect_timeout_secs: None,
            user_agent: None,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration for the given server URL with default values.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from defaults, an optional TOML file, then
    /// `SUGAR_*` environment variables (highest precedence).
    ///
    /// A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            debug!(path = %path.display(), "Merging session config file");
            figment = figment.merge(Toml::file(path));
        }

        let config: Self = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from [`default_path`](Self::default_path) and the environment.
    pub fn load_default() -> Result<Self> {
        Self::load(Some(&Self::default_path()))
    }

    /// `~/.config/sugar-session/config.toml`, or `config.toml` when the
    /// platform has no config directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("sugar-session").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Check that the base URL parses and carries no service path.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::config("base_url is not set"));
        }

        let url = url::Url::parse(&self.base_url)?;
        if url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "base_url '{}' cannot be used as a base",
                self.base_url
            )));
        }
        if url.path().trim_end_matches('/').ends_with(SERVICE_PATH) {
            return Err(Error::config(format!(
                "base_url '{}' must not include {SERVICE_PATH}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Sets the server URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the OAuth client id.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Sets the OAuth client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = secret.into();
        self
    }

    /// Sets the password grant platform.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Sets whether invalid TLS certificates are accepted.
    #[must_use]
    pub fn with_accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    /// Sets whether the original request is re-issued after a refresh.
    #[must_use]
    pub fn with_retry_after_refresh(mut self, enabled: bool) -> Self {
        self.retry_after_refresh = enabled;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = Some(timeout.as_secs());
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Request timeout as a duration.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Connect timeout as a duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    /// Returns the full URL for a REST path.
    ///
    /// The path is appended verbatim after the service prefix.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url.trim_end_matches('/'), SERVICE_PATH, path)
    }
}
