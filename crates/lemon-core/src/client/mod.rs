//! Authenticated request pipeline.
//!
//! [`ApiClient::request`] resolves the target against the base URL, attaches
//! the bearer token, sends under the [`RetryPolicy`], and on a 401 refreshes
//! the token through the [`RefreshCoordinator`] and replays the request once.
//!
//! Retries are idempotency-agnostic. Only send requests through here that
//! are safe to repeat, or carry an idempotency key.

mod retry;

pub use retry::RetryPolicy;

use std::sync::Arc;

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{AuthError, HttpError, InvalidInputError};
use crate::refresh::RefreshCoordinator;
use crate::store::TokenStore;
use crate::traits::{HttpRequest, HttpResponse, Transport};
use crate::{AccessToken, Result};

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method, `GET` by default.
    pub method: Method,
    /// Extra headers. These replace the JSON defaults but never the bearer
    /// credential.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Add a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set a raw body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body.
    pub fn with_json<B: Serialize + ?Sized>(
        mut self,
        body: &B,
    ) -> std::result::Result<Self, InvalidInputError> {
        let bytes = serde_json::to_vec(body).map_err(|e| InvalidInputError::Body {
            message: e.to_string(),
        })?;
        self.body = Some(bytes);
        Ok(self)
    }
}

/// Client for the configured API origin.
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<TokenStore>,
    refresher: Arc<RefreshCoordinator>,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<TokenStore>,
        refresher: Arc<RefreshCoordinator>,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            config,
            transport,
            store,
            refresher,
            retry,
        }
    }

    /// Returns the configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request through the pipeline.
    ///
    /// # Errors
    ///
    /// - [`NetworkError`](crate::error::NetworkError) once retries are exhausted
    /// - [`AuthError::SessionExpired`] if the token could not be refreshed or
    ///   the replayed request was still unauthorized; the session has been
    ///   cleared by then
    /// - [`HttpError`] for any other non-success status
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request(&self, target: &str, options: RequestOptions) -> Result<HttpResponse> {
        let url = self.config.base_url.resolve(target);
        let token = self.store.get_token().await;

        let mut headers = default_headers();
        headers.extend(options.headers);
        if let Some(ref token) = token {
            set_bearer(&mut headers, token)?;
        }

        let request = HttpRequest {
            method: options.method,
            url,
            headers,
            body: options.body,
        };

        let response = self.retry.send(self.transport.as_ref(), &request).await?;

        if response.status == StatusCode::UNAUTHORIZED && token.is_some() {
            debug!("Unauthorized, refreshing token");
            return self.refresh_and_replay(request).await;
        }

        check_status(response)
    }

    async fn refresh_and_replay(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        let token = match self.refresher.refresh().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not refresh token, ending session");
                self.store.clear_all().await;
                return Err(AuthError::SessionExpired.into());
            }
        };

        set_bearer(&mut request.headers, &token)?;
        let response = self.retry.send(self.transport.as_ref(), &request).await?;

        if response.status == StatusCode::UNAUTHORIZED {
            warn!("Replayed request still unauthorized, ending session");
            self.store.clear_all().await;
            return Err(AuthError::SessionExpired.into());
        }

        check_status(response)
    }

    /// `GET` the target.
    pub async fn get(&self, target: &str) -> Result<HttpResponse> {
        self.request(target, RequestOptions::new(Method::GET)).await
    }

    /// `POST` a JSON body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> Result<HttpResponse> {
        let options = RequestOptions::new(Method::POST).with_json(body)?;
        self.request(target, options).await
    }

    /// `PUT` a JSON body.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> Result<HttpResponse> {
        let options = RequestOptions::new(Method::PUT).with_json(body)?;
        self.request(target, options).await
    }

    /// `PATCH` a JSON body.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        target: &str,
        body: &B,
    ) -> Result<HttpResponse> {
        let options = RequestOptions::new(Method::PATCH).with_json(body)?;
        self.request(target, options).await
    }

    /// `DELETE` the target.
    pub async fn delete(&self, target: &str) -> Result<HttpResponse> {
        self.request(target, RequestOptions::new(Method::DELETE)).await
    }

    /// `GET` the target and decode the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, target: &str) -> Result<T> {
        Ok(self.get(target).await?.json()?)
    }

    /// Send a request and decode the JSON response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        target: &str,
        options: RequestOptions,
    ) -> Result<T> {
        Ok(self.request(target, options).await?.json()?)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn set_bearer(
    headers: &mut HeaderMap,
    token: &AccessToken,
) -> std::result::Result<(), InvalidInputError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str())).map_err(|e| {
        InvalidInputError::Header {
            name: AUTHORIZATION.to_string(),
            reason: e.to_string(),
        }
    })?;
    value.set_sensitive(true);
    headers.insert(AUTHORIZATION, value);
    Ok(())
}

fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }
    Err(HttpError::new(response.status.as_u16(), response.error_message()).into())
}
