//! reqwest-backed transport.

use std::error::Error as _;

use async_trait::async_trait;
use tracing::{debug, instrument};

use lemon_core::error::NetworkError;
use lemon_core::{HttpRequest, HttpResponse, Transport};

/// User agent sent with every request.
const USER_AGENT: &str = concat!("lemon/", env!("CARGO_PKG_VERSION"));

/// A [`Transport`] that sends requests with a shared [`reqwest::Client`].
///
/// The client has no timeout of its own; the request pipeline bounds each
/// attempt.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with a fresh client.
    pub fn new() -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NetworkError::Request {
                message: describe(&e),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        let mut builder = self
            .client
            .request(request.method, request.url.as_str())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(network_error)?;

        debug!(status = status.as_u16(), bytes = body.len(), "Received response");
        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

/// Classify a reqwest failure.
pub(crate) fn network_error(err: reqwest::Error) -> NetworkError {
    let message = describe(&err);
    if err.is_connect() {
        NetworkError::Connection { message }
    } else {
        NetworkError::Request { message }
    }
}

// reqwest's Display omits the underlying cause ("connection refused" etc).
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
