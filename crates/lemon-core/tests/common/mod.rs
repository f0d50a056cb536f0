//! Shared fakes for lemon-core integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use http::header::AUTHORIZATION;
use lemon_core::codec::{self, TokenClaims, TokenHeader, TokenType};
use lemon_core::error::{AuthError, NetworkError};
use lemon_core::storage::{AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
use lemon_core::{
    AccessToken, AuthApi, BaseUrl, ClientConfig, Credentials, DemoAuthApi, HttpRequest,
    HttpResponse, Identifier, LoginGrant, MemoryStore, RefreshGrant, RefreshToken, Transport,
    User,
};
use tokio::time::Instant;

pub const NOW: i64 = 1_700_000_000;

/// What the fake transport does for one call.
pub enum Step {
    Reply(Result<HttpResponse, NetworkError>),
    After(Duration, Result<HttpResponse, NetworkError>),
}

type Handler = dyn Fn(usize, &HttpRequest) -> Step + Send + Sync;

/// A transport driven by a closure, recording every request it sees.
pub struct FakeTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl FakeTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(usize, &HttpRequest) -> Step + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Answers every request with 200 `{}`.
    pub fn ok() -> Arc<Self> {
        Self::new(|_, _| Step::Reply(Ok(json(StatusCode::OK, "{}"))))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, NetworkError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((Instant::now(), request.clone()));
            calls.len() - 1
        };
        match (self.handler)(index, &request) {
            Step::Reply(reply) => reply,
            Step::After(delay, reply) => {
                tokio::time::sleep(delay).await;
                reply
            }
        }
    }
}

pub fn json(status: StatusCode, body: &str) -> HttpResponse {
    HttpResponse::new(status, body.as_bytes().to_vec())
}

pub fn refused() -> NetworkError {
    NetworkError::Connection {
        message: "connection refused".to_string(),
    }
}

/// The bearer token a request carried, if any.
pub fn bearer(request: &HttpRequest) -> Option<String> {
    request
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// An auth authority that counts refreshes and can be told to fail.
pub struct CountingAuth {
    pub refreshes: AtomicUsize,
    pub delay: Duration,
    pub fail: bool,
    pub issued_at: i64,
}

impl CountingAuth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            refreshes: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
            fail: false,
            issued_at: NOW,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            refreshes: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
            fail: true,
            issued_at: NOW,
        })
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for CountingAuth {
    async fn login(&self, credentials: &Credentials) -> lemon_core::Result<LoginGrant> {
        DemoAuthApi::new().login(credentials).await
    }

    async fn refresh(&self, _token: &RefreshToken) -> Result<RefreshGrant, AuthError> {
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(AuthError::RefreshFailed {
                reason: "refresh token revoked".to_string(),
            });
        }
        Ok(RefreshGrant {
            access_token: AccessToken::new(token(
                TokenType::Access,
                self.issued_at,
                self.issued_at + 3600,
                &format!("refreshed-{n}"),
            )),
            refresh_token: None,
        })
    }
}

/// A well-formed token with the given lifetime and signature tag.
pub fn token(kind: TokenType, iat: i64, exp: i64, tag: &str) -> String {
    let claims = TokenClaims {
        sub: Identifier::Number(1),
        email: Some("demo@example.com".to_string()),
        token_type: kind,
        iat,
        exp,
        role: Some("customer".to_string()),
    };
    codec::encode(&TokenHeader::default(), &claims, tag).unwrap()
}

pub fn user() -> User {
    DemoAuthApi::demo_user()
}

/// Persist a complete session into `storage`.
pub fn seed_session(storage: &MemoryStore, access: &str, refresh: &str) {
    storage.seed(AUTH_TOKEN_KEY, access);
    storage.seed(REFRESH_TOKEN_KEY, refresh);
    storage.seed(USER_DATA_KEY, &serde_json::to_string(&user()).unwrap());
}

/// Local config with fast retries.
pub fn config() -> ClientConfig {
    ClientConfig::new(BaseUrl::new("http://localhost:3000/api").unwrap())
        .with_timeout(Duration::from_secs(10))
        .with_retry_attempts(3)
        .with_retry_base_delay(Duration::from_millis(1000))
}
