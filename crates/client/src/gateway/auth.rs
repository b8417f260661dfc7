//! Token endpoints.
//!
//! `/token/` exchanges a username and password for an access/refresh pair;
//! `/token/refresh/` trades the refresh token for a new access token. Both
//! are sent without a bearer token and never trigger the gateway's own
//! refresh-on-401.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use super::{ApiGateway, ApiRequest, into_body, parse_body};
use crate::error::ClientError;

const TOKEN_PATH: &str = "/token/";
const REFRESH_PATH: &str = "/token/refresh/";

/// Access and refresh tokens issued at login.
#[derive(Clone)]
pub struct TokenPair {
    /// Bearer token sent with every authenticated request.
    pub access: SecretString,
    /// Token exchanged for a new access token when the old one is rejected.
    pub refresh: SecretString,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"[REDACTED]")
            .field("refresh", &"[REDACTED]")
            .finish()
    }
}

/// Result of a refresh. The API may rotate the refresh token as well.
pub struct RefreshedToken {
    pub access: SecretString,
    pub refresh: Option<SecretString>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access: String,
    refresh: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

impl ApiGateway {
    /// Exchange credentials for a token pair.
    ///
    /// Does not modify the session; [`SessionStore::login`](crate::SessionStore::login)
    /// stores the result.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AuthRejected` with the server's message if the
    /// credentials are refused.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn obtain_token(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<TokenPair, ClientError> {
        let request = ApiRequest::post(
            TOKEN_PATH,
            serde_json::json!({
                "username": username,
                "password": password.expose_secret(),
            }),
        )
        .anonymous();

        let response: TokenResponse = self.fetch(request).await?;

        Ok(TokenPair {
            access: SecretString::from(response.access),
            refresh: SecretString::from(response.refresh),
        })
    }

    /// Trade a refresh token for a new access token.
    ///
    /// Does not modify the session. Sent as a single exchange, so a rejected
    /// refresh never triggers another refresh.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AuthRejected` if the refresh token is invalid or expired.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(
        &self,
        refresh_token: &SecretString,
    ) -> Result<RefreshedToken, ClientError> {
        let request = ApiRequest::post(
            REFRESH_PATH,
            serde_json::json!({ "refresh": refresh_token.expose_secret() }),
        )
        .anonymous();

        let response = self.dispatch(&request, None).await?;
        let body = into_body(response, false)?;
        let response: RefreshResponse = parse_body(&body)?;

        Ok(RefreshedToken {
            access: SecretString::from(response.access),
            refresh: response.refresh.map(SecretString::from),
        })
    }
}
