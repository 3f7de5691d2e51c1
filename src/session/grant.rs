//! Password and refresh grants.

use reqwest::Method;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::{apply_me, apply_preferences, call::encode, Session, SessionState, ME_PATH, PREFERENCES_PATH};
use crate::auth::{mask_token, AuthRequest, AuthResponse, RefreshRequest, TokenPair, TOKEN_PATH};
use crate::error::{Error, Result};

impl Session {
    /// Log in with the password grant, then load session info.
    ///
    /// A rejected grant, or a grant response missing either token, leaves
    /// the previous token pair untouched. If the grant succeeds but loading
    /// info fails, the new tokens are kept and the load error is returned.
    #[instrument(skip(self, password))]
    pub async fn connect(&self, username: &str, password: &str) -> Result<()> {
        let request = AuthRequest::password(&self.config, username, password);
        let payload = encode(Some(&request))?;

        let mut state = self.state.lock().await;
        let response: AuthResponse = self
            .call_once(&state, Method::POST, TOKEN_PATH, payload)
            .await?;

        state.tokens = TokenPair::try_from(response)?;
        info!(
            token_preview = %mask_token(&state.tokens.access_token),
            expires_in = state.tokens.expires_in,
            "Password grant accepted"
        );

        self.reload_info(&mut state).await
    }

    /// Exchange the stored refresh token for a new pair, then reload
    /// session info.
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    /// Refresh with the state lock already held.
    ///
    /// Any failure of the exchange clears both tokens, including a response
    /// that lacks either token.
    #[instrument(skip(self, state))]
    pub(crate) async fn refresh_locked(&self, state: &mut SessionState) -> Result<()> {
        if !state.tokens.has_refresh_token() {
            warn!("No refresh token available");
            state.tokens.clear();
            return Err(Error::NoRefreshToken);
        }

        let request = RefreshRequest::new(&self.config, &state.tokens.refresh_token);
        let payload = encode(Some(&request))?;

        let exchanged = self
            .call_once::<AuthResponse>(state, Method::POST, TOKEN_PATH, payload)
            .await
            .and_then(TokenPair::try_from);

        state.tokens = match exchanged {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "Refresh grant rejected, clearing tokens");
                state.tokens.clear();
                return Err(e);
            }
        };
        info!(
            token_preview = %mask_token(&state.tokens.access_token),
            expires_in = state.tokens.expires_in,
            "Token refreshed"
        );

        self.reload_info(state).await
    }

    /// `/me` then `/me/preferences`, without the refresh path.
    async fn reload_info(&self, state: &mut SessionState) -> Result<()> {
        let me: Value = self.call_once(state, Method::GET, ME_PATH, None).await?;
        apply_me(state, &me)?;

        let prefs: Value = self
            .call_once(state, Method::GET, PREFERENCES_PATH, None)
            .await?;
        apply_preferences(state, &prefs)
    }
}
