//! Request dispatch and the 401 → refresh path.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::{Session, SessionState};
use crate::auth::TOKEN_HEADER;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse};

/// Serialize an optional request body.
pub(crate) fn encode<B: Serialize + ?Sized>(body: Option<&B>) -> Result<Option<Vec<u8>>> {
    body.map(serde_json::to_vec).transpose().map_err(Error::from)
}

/// Turn a response into `R`, or [`Error::NonOk`] for anything but 200.
pub(crate) fn decode_response<R: DeserializeOwned>(response: HttpResponse) -> Result<R> {
    if response.status != StatusCode::OK {
        return Err(Error::non_ok(
            response.status.as_u16(),
            response.reason(),
            Some(response.text()),
        ));
    }
    Ok(serde_json::from_slice(&response.body)?)
}

impl Session {
    fn build_headers(&self, state: &SessionState) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if state.tokens.is_authenticated() {
            headers.insert(
                HeaderName::from_static(TOKEN_HEADER),
                HeaderValue::from_str(&state.tokens.access_token)
                    .map_err(|e| Error::config(format!("Invalid token header: {e}")))?,
            );
        }

        Ok(headers)
    }

    /// One HTTP exchange with the current token. Transport failures are
    /// returned as-is; every status is an `Ok` response.
    pub(crate) async fn send(
        &self,
        state: &SessionState,
        method: Method,
        path: &str,
        payload: Option<Vec<u8>>,
    ) -> Result<HttpResponse> {
        let request = HttpRequest {
            method,
            url: self.config.endpoint(path),
            headers: self.build_headers(state)?,
            body: payload,
        };

        let response = self.transport.execute(request).await?;
        debug!(status = %response.status, path, "Call completed");
        Ok(response)
    }

    /// One exchange without the refresh path.
    ///
    /// Used by the grant exchanges and the metadata reload that runs inside a
    /// refresh, so a 401 there never starts another refresh.
    pub(crate) async fn call_once<R: DeserializeOwned>(
        &self,
        state: &SessionState,
        method: Method,
        path: &str,
        payload: Option<Vec<u8>>,
    ) -> Result<R> {
        let response = self.send(state, method, path, payload).await?;
        decode_response(response)
    }

    /// Full call protocol.
    ///
    /// On 401 exactly one refresh is attempted. A failed refresh reports the
    /// original status without a body. After a successful refresh the
    /// original 401 is reported unless `retry_after_refresh` is set, in which
    /// case the request is re-issued once with the new token.
    #[instrument(skip(self, state, payload), fields(method = %method))]
    pub(crate) async fn call_locked<R: DeserializeOwned>(
        &self,
        state: &mut SessionState,
        method: Method,
        path: &str,
        payload: Option<Vec<u8>>,
    ) -> Result<R> {
        let retry_payload = if self.config.retry_after_refresh {
            payload.clone()
        } else {
            None
        };

        let response = self.send(state, method.clone(), path, payload).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return decode_response(response);
        }

        warn!(path, "Unauthorized, refreshing token");
        if let Err(e) = self.refresh_locked(state).await {
            warn!(error = %e, "Token refresh failed");
            return Err(Error::non_ok(
                response.status.as_u16(),
                response.reason(),
                None,
            ));
        }

        if !self.config.retry_after_refresh {
            return decode_response(response);
        }

        info!(path, "Re-issuing request with refreshed token");
        let retried = self.send(state, method, path, retry_payload).await?;
        decode_response(retried)
    }
}
