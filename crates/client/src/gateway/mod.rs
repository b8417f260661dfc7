//! HTTP gateway to the ordering API.
//!
//! Every remote call goes through [`ApiGateway`]. It attaches the session's
//! bearer token, and when an authenticated request comes back `401` it
//! refreshes the access token once and replays the request. Catalog reads
//! are cached with `moka`.
//!
//! Typed resource methods live in the `api` module as further
//! `impl ApiGateway` blocks.

mod auth;
pub(crate) mod cache;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

pub use auth::{RefreshedToken, TokenPair};
use cache::{CacheKey, CacheValue};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::SessionHandle;
use crate::validation::FieldErrors;

const CACHE_CAPACITY: u64 = 1000;

/// Characters of a response body kept in logs and fallback messages.
const BODY_PREVIEW_CHARS: usize = 200;

/// One outgoing API call, kept so it can be replayed after a token refresh.
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<serde_json::Value>,
    /// Attach the bearer token and refresh on 401.
    authenticated: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authenticated: true,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        request
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query parameters.
    pub(crate) fn query(mut self, pairs: Vec<(&'static str, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Send without a bearer token and report 401 as rejected credentials.
    pub(crate) const fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// Raw outcome of one HTTP exchange.
struct RawResponse {
    status: StatusCode,
    body: String,
}

/// Client for the ordering API.
#[derive(Clone)]
pub struct ApiGateway {
    inner: Arc<ApiGatewayInner>,
}

struct ApiGatewayInner {
    client: reqwest::Client,
    base_url: String,
    session: SessionHandle,
    /// Keyed by session generation so one user's catalog is never served to another.
    cache: Option<Cache<(u64, CacheKey), CacheValue>>,
}

impl ApiGateway {
    /// Create a gateway for `config.api_base_url` reading tokens from `session`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: SessionHandle) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let cache = config.catalog_cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiGatewayInner {
                client,
                base_url: config.api_base_url.clone(),
                session,
                cache,
            }),
        })
    }

    /// The session this gateway authenticates with.
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    // =========================================================================
    // Request Execution
    // =========================================================================

    /// Send `request` and parse a JSON response body.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let body = self.send(request).await?;
        parse_body(&body)
    }

    /// Send `request`, applying bearer auth and the one-shot refresh.
    ///
    /// Returns the body of a successful response.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<String, ClientError> {
        if !request.authenticated {
            let response = self.dispatch(&request, None).await?;
            return into_body(response, false);
        }

        let token = self.inner.session.access_token();
        let response = self.dispatch(&request, token.as_ref()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return into_body(response, true);
        }

        let Some(refresh) = self.inner.session.refresh_token() else {
            tracing::debug!("401 with no refresh token");
            self.inner.session.expire();
            return Err(ClientError::Unauthorized);
        };

        let tokens = match self.refresh_token(&refresh).await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.inner.session.expire();
                return Err(ClientError::Unauthorized);
            }
        };

        self.inner.session.set_access_token(tokens.access.clone());
        if let Some(rotated) = tokens.refresh {
            self.inner.session.set_refresh_token(rotated);
        }

        tracing::debug!("Replaying request with refreshed token");
        let response = self.dispatch(&request, Some(&tokens.access)).await?;
        into_body(response, true)
    }

    /// Perform one HTTP exchange without any retry.
    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&SecretString>,
    ) -> Result<RawResponse, ClientError> {
        let url = self.url(&request.path, &request.query)?;

        let mut builder = self
            .inner
            .client
            .request(request.method.clone(), url)
            .header("Accept", "application/json");
        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;
        tracing::debug!(status = %status, bytes = body.len(), "API response");

        Ok(RawResponse { status, body })
    }

    fn url(&self, path: &str, query: &[(&'static str, String)]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!("{}{path}", self.inner.base_url)).map_err(|e| {
            ClientError::Api {
                status: 0,
                message: format!("invalid request URL: {e}"),
            }
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Look up a catalog response for the current session.
    ///
    /// Anonymous sessions never hit the cache; the API decides what they may see.
    pub(crate) async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let cache = self.catalog_cache()?;
        let value = cache
            .get(&(self.inner.session.generation(), key.clone()))
            .await;
        if value.is_some() {
            tracing::debug!(?key, "Cache hit");
        }
        value
    }

    pub(crate) async fn cache(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = self.catalog_cache() {
            cache
                .insert((self.inner.session.generation(), key), value)
                .await;
        }
    }

    fn catalog_cache(&self) -> Option<&Cache<(u64, CacheKey), CacheValue>> {
        if !self.inner.session.is_authenticated() {
            return None;
        }
        self.inner.cache.as_ref()
    }

    /// Drop every cached catalog response.
    pub async fn invalidate_catalog(&self) {
        if let Some(cache) = &self.inner.cache {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
        }
    }
}

impl std::fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiGateway")
            .field("base_url", &self.inner.base_url)
            .field("cache", &self.inner.cache.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Response Handling
// =============================================================================

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %preview(body),
            "Failed to parse API response"
        );
        ClientError::Parse(e)
    })
}

/// Map a non-success status to the error taxonomy.
///
/// `authenticated` distinguishes an expired session (after the refresh has
/// already been tried) from credentials rejected by an auth endpoint.
fn into_body(response: RawResponse, authenticated: bool) -> Result<String, ClientError> {
    let RawResponse { status, body } = response;
    if status.is_success() {
        return Ok(body);
    }

    let json: Option<serde_json::Value> = serde_json::from_str(&body).ok();
    let message = json
        .as_ref()
        .and_then(server_message)
        .unwrap_or_else(|| fallback_message(status, &body));

    tracing::debug!(status = %status, message = %message, "API returned non-success status");

    Err(match status {
        StatusCode::UNAUTHORIZED if authenticated => ClientError::Unauthorized,
        StatusCode::UNAUTHORIZED => ClientError::AuthRejected(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::BAD_REQUEST => match json.as_ref().and_then(field_errors) {
            Some(errors) => ClientError::Validation(errors),
            None => ClientError::Api {
                status: status.as_u16(),
                message,
            },
        },
        _ => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

/// Extract a `detail` or `error` message.
fn server_message(json: &serde_json::Value) -> Option<String> {
    ["detail", "error"]
        .iter()
        .find_map(|key| json.get(key)?.as_str())
        .map(str::to_string)
}

/// Field errors from a 400 body that is not a plain `detail`/`error` message.
fn field_errors(json: &serde_json::Value) -> Option<FieldErrors> {
    if server_message(json).is_some() {
        return None;
    }
    FieldErrors::from_api_body(json)
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() || body.starts_with('<') {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        preview(body)
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
