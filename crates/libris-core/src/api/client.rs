//! API client for communicating with the library REST backend.
//!
//! Every call goes through `ApiClient::execute`, which attaches the stored
//! access token, and on an unauthorized response refreshes the session once
//! (shared across concurrent requests) before replaying the request.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{AuthResponse, CredentialStore, RegisterOutcome, SessionIdentity};
use crate::config::{Config, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::models::RegisterRequest;

use super::refresh::{RefreshCoordinator, RefreshFailure, RefreshedTokens, SessionExpiredHook};
use super::{ApiError, ApiRequest};

// ============================================================================
// Constants
// ============================================================================

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const REFRESH_TOKEN_PATH: &str = "/auth/refresh-token";
pub const LOGOUT_PATH: &str = "/auth/logout";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
    credentials: Option<CredentialStore>,
    on_session_expired: Option<SessionExpiredHook>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credentials: None,
            on_session_expired: None,
        }
    }
}

impl ApiClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Called once whenever the session is lost for good (refresh failed,
    /// no refresh token, or the refresh endpoint itself answered 401).
    pub fn on_session_expired<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RefreshFailure) + Send + Sync + 'static,
    {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let credentials = self.credentials.unwrap_or_else(CredentialStore::in_memory);
        let refresh = RefreshCoordinator::new(credentials.clone(), self.on_session_expired);

        Ok(ApiClient {
            client,
            base_url: Arc::from(self.base_url.trim_end_matches('/')),
            credentials,
            refresh: Arc::new(refresh),
        })
    }
}

/// API client for the library backend.
/// Clone is cheap - clones share the connection pool, credential store and
/// refresh coordinator.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    credentials: CredentialStore,
    refresh: Arc<RefreshCoordinator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Builder preset from the on-disk configuration.
    pub fn from_config(config: &Config, credentials: CredentialStore) -> ApiClientBuilder {
        Self::builder()
            .base_url(config.api_url())
            .timeout(config.request_timeout())
            .credentials(credentials)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_refreshing()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send one request as-is, with the given bearer token if any.
    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, ApiError> {
        let mut builder = self
            .client
            .request(request.method().clone(), self.url(request.path()));
        if !request.query_params().is_empty() {
            builder = builder.query(request.query_params());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        debug!(
            method = %request.method(),
            path = request.path(),
            authenticated = token.is_some(),
            retried = request.is_retried(),
            "Sending request"
        );
        builder.send().await.map_err(|e| {
            warn!(path = request.path(), error = %e, "Request failed without a response");
            ApiError::from(e)
        })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(path, error = %e, "Failed to parse JSON response");
            ApiError::InvalidResponse(format!("{}: {}", path, e))
        })
    }

    /// Send a request through the refresh interceptor and return the raw
    /// successful response.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<Response, ApiError> {
        let sent_with = self.credentials.access_token().map_err(ApiError::storage)?;
        let response = self.dispatch(&request, sent_with.as_deref()).await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {}
            StatusCode::FORBIDDEN => {
                warn!(path = request.path(), "Access denied - insufficient permissions");
                return Self::check_response(response).await;
            }
            _ => return Self::check_response(response).await,
        }

        if request.path() == REFRESH_TOKEN_PATH {
            self.refresh
                .expire_session(&RefreshFailure::Rejected(StatusCode::UNAUTHORIZED.as_u16()));
            return Self::check_response(response).await;
        }
        if request.is_retried() {
            debug!(path = request.path(), "Replayed request still unauthorized");
            return Self::check_response(response).await;
        }
        request.mark_retried();

        let token = self.token_for_replay(sent_with.as_deref()).await?;
        debug!(path = request.path(), "Replaying request with refreshed token");
        let replay = self.dispatch(&request, Some(&token)).await?;
        if replay.status() == StatusCode::FORBIDDEN {
            warn!(path = request.path(), "Access denied - insufficient permissions");
        }
        Self::check_response(replay).await
    }

    /// Access token to replay an unauthorized request with.
    ///
    /// When another request already rotated the token since this one was
    /// sent, the stored token is reused instead of refreshing again; when
    /// another request already lost the session, this one fails quietly.
    async fn token_for_replay(&self, sent_with: Option<&str>) -> Result<String, ApiError> {
        let client = self.clone();
        self.refresh
            .authorize_rejected(sent_with, move |refresh_token| async move {
                client.refresh_tokens(refresh_token).await
            })
            .await
            .map_err(ApiError::SessionExpired)
    }

    /// Exchange a refresh token at the refresh endpoint. Never intercepted.
    async fn refresh_tokens(&self, refresh_token: String) -> Result<RefreshedTokens, RefreshFailure> {
        let response = self
            .client
            .post(self.url(REFRESH_TOKEN_PATH))
            .json(&RefreshTokenRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(|e| RefreshFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Refresh endpoint rejected refresh token");
            return Err(RefreshFailure::Rejected(status.as_u16()));
        }

        let body: RefreshTokenResponse = response
            .json()
            .await
            .map_err(|e| RefreshFailure::InvalidResponse(e.to_string()))?;
        if body.access_token.is_empty() {
            return Err(RefreshFailure::InvalidResponse(
                "empty access token".to_string(),
            ));
        }

        Ok(RefreshedTokens {
            access_token: body.access_token,
            refresh_token: body.refresh_token.filter(|t| !t.is_empty()),
        })
    }

    /// Refresh the session now, joining any refresh already in flight.
    pub async fn refresh_session(&self) -> Result<String, ApiError> {
        let client = self.clone();
        self.refresh
            .authorize(move |refresh_token| async move {
                client.refresh_tokens(refresh_token).await
            })
            .await
            .map_err(ApiError::SessionExpired)
    }

    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path().to_string();
        let response = self.execute(request).await?;
        Self::parse_json(response, &path).await
    }

    /// Send a request whose successful response carries no body of interest.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.execute(request).await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send_empty(ApiRequest::delete(path)).await
    }

    // ===== Authentication =====

    /// Authenticate and persist the returned session.
    ///
    /// Bypasses the refresh interceptor: a 401 here means bad credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionIdentity, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest { email, password })?;
        let response = Self::check_response(self.dispatch(&request, None).await?).await?;
        let auth: AuthResponse = Self::parse_json(response, LOGIN_PATH).await?;

        let (pair, identity) = auth.into_session().ok_or_else(|| {
            ApiError::InvalidResponse("Login response did not include a session".to_string())
        })?;
        self.credentials
            .save_session(&pair, &identity)
            .map_err(ApiError::storage)?;
        info!(user_id = identity.user_id, role = %identity.role, "Logged in");
        Ok(identity)
    }

    /// Create an account. Stores the session when the backend logs the user in directly.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<RegisterOutcome, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).json(registration)?;
        let response = Self::check_response(self.dispatch(&request, None).await?).await?;
        let auth: AuthResponse = Self::parse_json(response, REGISTER_PATH).await?;

        match auth.into_session() {
            Some((pair, identity)) => {
                self.credentials
                    .save_session(&pair, &identity)
                    .map_err(ApiError::storage)?;
                info!(user_id = identity.user_id, "Registered and logged in");
                Ok(RegisterOutcome::LoggedIn(identity))
            }
            None => {
                info!("Registered, login required");
                Ok(RegisterOutcome::PendingLogin)
            }
        }
    }

    /// Tell the server the session ended, then clear local credentials
    /// regardless of the server's answer.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let token = self.credentials.access_token().ok().flatten();
        match self.dispatch(&ApiRequest::post(LOGOUT_PATH), token.as_deref()).await {
            Ok(response) if response.status().is_success() => debug!("Server session closed"),
            Ok(response) => debug!(
                status = %response.status(),
                "Logout rejected by server, clearing local session anyway"
            ),
            Err(e) => debug!(error = %e, "Logout request failed, clearing local session anyway"),
        }
        self.credentials.clear_all().map_err(ApiError::storage)?;
        info!("Logged out");
        Ok(())
    }

    /// The stored identity, if a session with an access token exists.
    pub fn current_session(&self) -> Result<Option<SessionIdentity>, ApiError> {
        if self
            .credentials
            .access_token()
            .map_err(ApiError::storage)?
            .is_none()
        {
            return Ok(None);
        }
        self.credentials.identity().map_err(ApiError::storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_base_and_path() {
        let client = ApiClient::builder()
            .base_url("http://localhost:8080/api/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/books"), "http://localhost:8080/api/books");
        assert_eq!(client.url("books/1"), "http://localhost:8080/api/books/1");
    }

    #[test]
    fn test_current_session_requires_access_token() {
        let client = ApiClient::builder().build().unwrap();
        assert_eq!(client.current_session().unwrap(), None);
        assert!(!client.is_refreshing());
    }
}
