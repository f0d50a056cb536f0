//! lemon-core - Token lifecycle and resilient request pipeline for the
//! Little Lemon client.
//!
//! The pieces, leaf first:
//!
//! - [`codec`]: decode and validate compact three-part tokens
//! - [`TokenStore`]: owns the persisted session behind a [`SecureStore`]
//! - [`RefreshCoordinator`]: at most one refresh exchange in flight
//! - [`ApiClient`]: bearer auth, per-attempt timeout, backoff, refresh-and-replay
//! - [`SessionManager`]: login, logout, `is_authenticated`, initialize

pub mod api;
pub mod client;
pub mod clock;
pub mod codec;
pub mod config;
pub mod credentials;
pub mod demo;
pub mod error;
pub mod refresh;
pub mod session;
pub mod storage;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;
pub mod validation;

pub use api::LemonApi;
pub use client::{ApiClient, RequestOptions, RetryPolicy};
pub use clock::{Clock, SystemClock, TestClock};
pub use codec::{TokenClaims, TokenHeader, TokenType};
pub use config::{ClientConfig, Endpoints};
pub use credentials::Credentials;
pub use demo::DemoAuthApi;
pub use error::Error;
pub use refresh::RefreshCoordinator;
pub use session::{Session, SessionManager};
pub use storage::MemoryStore;
pub use store::TokenStore;
pub use tokens::{AccessToken, RefreshToken};
pub use traits::{
    AuthApi, HttpRequest, HttpResponse, LoginGrant, RefreshGrant, SecureStore, Transport,
};
pub use types::{BaseUrl, Identifier, User};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
