//! Token types for bearer authentication.

use std::fmt;

use crate::codec::{self, TokenClaims};
use crate::error::DecodeError;

/// An access token for authenticated requests.
///
/// Access tokens are short-lived and sent as the bearer credential on every
/// request.
///
/// # Security
///
/// - Never logged or displayed in Debug output
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    ///
    /// # Security
    ///
    /// Use only when constructing HTTP authorization headers or persisting
    /// the session.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the token's claims.
    pub fn claims(&self) -> Result<TokenClaims, DecodeError> {
        codec::decode(&self.0)
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A refresh token for obtaining new access tokens.
///
/// Refresh tokens are longer-lived and used to obtain new access tokens
/// without requiring re-authentication. Most authorities invalidate a refresh
/// token once it has been used.
///
/// # Security
///
/// - Never logged or displayed in Debug output
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh requests.
    ///
    /// # Security
    ///
    /// Use only when constructing token refresh requests or persisting the
    /// session.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the token's claims.
    pub fn claims(&self) -> Result<TokenClaims, DecodeError> {
        codec::decode(&self.0)
    }
}

// Hide token value in Debug output
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}
