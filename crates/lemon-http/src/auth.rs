//! Auth authority backed by the REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use lemon_core::config::Endpoints;
use lemon_core::error::{AuthError, InvalidInputError, NetworkError};
use lemon_core::{
    AccessToken, AuthApi, BaseUrl, ClientConfig, Credentials, HttpRequest, HttpResponse,
    LoginGrant, RefreshGrant, RefreshToken, Result, Transport, User,
};

/// Request body for the login endpoint.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Response from the login endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    refresh_token: String,
    user: User,
}

/// Request body for the refresh endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Response from the refresh endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// An [`AuthApi`] that talks to `POST /auth/login` and `POST /auth/refresh`.
///
/// Calls go straight to the transport, outside the request pipeline: they
/// carry no bearer, are never retried and never trigger a refresh.
pub struct HttpAuthApi {
    transport: Arc<dyn Transport>,
    base_url: BaseUrl,
    endpoints: Endpoints,
    timeout: Duration,
}

impl HttpAuthApi {
    /// Use the base URL, endpoint paths and timeout from `config`.
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            base_url: config.base_url.clone(),
            endpoints: config.endpoints.clone(),
            timeout: config.timeout,
        }
    }

    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<HttpResponse, PostError> {
        let body = serde_json::to_vec(body).map_err(|e| {
            PostError::Input(InvalidInputError::Body {
                message: e.to_string(),
            })
        })?;

        let mut request = HttpRequest::new(Method::POST, self.base_url.resolve(path));
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static("application/json"));
        request.body = Some(body);

        match tokio::time::timeout(self.timeout, self.transport.send(request)).await {
            Ok(result) => result.map_err(PostError::Network),
            Err(_) => Err(PostError::Network(NetworkError::Timeout {
                duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })),
        }
    }
}

/// Failure to get any response out of [`HttpAuthApi::post_json`].
enum PostError {
    Input(InvalidInputError),
    Network(NetworkError),
}

impl PostError {
    fn into_reason(self) -> String {
        match self {
            PostError::Input(e) => e.to_string(),
            PostError::Network(e) => e.to_string(),
        }
    }
}

impl From<PostError> for lemon_core::Error {
    fn from(err: PostError) -> Self {
        match err {
            PostError::Input(e) => e.into(),
            PostError::Network(e) => e.into(),
        }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant> {
        let request = LoginRequest {
            email: credentials.email(),
            password: credentials.password(),
        };
        let response = self.post_json(&self.endpoints.login, &request).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            debug!("Credentials rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !response.is_success() {
            let message = response
                .error_message()
                .unwrap_or_else(|| format!("HTTP {}", response.status.as_u16()));
            warn!(status = response.status.as_u16(), "Login failed");
            return Err(AuthError::LoginFailed { message }.into());
        }

        let body: LoginResponse = response.json().map_err(|e| AuthError::LoginFailed {
            message: e.to_string(),
        })?;

        Ok(LoginGrant {
            access_token: AccessToken::new(body.access_token),
            refresh_token: RefreshToken::new(body.refresh_token),
            user: body.user,
        })
    }

    #[instrument(skip_all)]
    async fn refresh(
        &self,
        refresh_token: &RefreshToken,
    ) -> std::result::Result<RefreshGrant, AuthError> {
        let request = RefreshRequest {
            refresh_token: refresh_token.as_str(),
        };
        let response = self
            .post_json(&self.endpoints.refresh, &request)
            .await
            .map_err(|e| AuthError::RefreshFailed {
                reason: e.into_reason(),
            })?;

        if !response.is_success() {
            let reason = response
                .error_message()
                .unwrap_or_else(|| format!("HTTP {}", response.status.as_u16()));
            return Err(AuthError::RefreshFailed { reason });
        }

        let body: RefreshResponse = response.json().map_err(|e| AuthError::RefreshFailed {
            reason: e.to_string(),
        })?;

        debug!(rotated = body.refresh_token.is_some(), "Token refreshed");
        Ok(RefreshGrant {
            access_token: AccessToken::new(body.access_token),
            refresh_token: body.refresh_token.map(RefreshToken::new),
        })
    }
}
