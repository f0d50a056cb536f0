//! Error types for the lemon client layer.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, HTTP status, token decoding, persistence and
//! input validation failures.

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// The unified error type for lemon operations.
///
/// Every terminal error can be turned into a message suitable for showing
/// to an end user via [`Error::user_message`].
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection refused, DNS, timeout).
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Authentication errors (invalid credentials, expired session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success HTTP responses.
    #[error("http error: {0}")]
    Http(#[from] HttpError),

    /// Malformed tokens.
    #[error("token decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Durable storage failures.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input validation errors (bad URL, header, body).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Returns a human-readable message for this error.
    ///
    /// The message never includes raw transport details; it is meant to be
    /// shown to the person using the application.
    pub fn user_message(&self) -> String {
        match self {
            Error::Auth(err) => err.user_message().to_string(),
            Error::Network(NetworkError::Timeout { .. }) => {
                "Request timed out. Please try again.".to_string()
            }
            Error::Network(_) => "Network error. Please check your connection.".to_string(),
            Error::Http(err) => err.user_message(),
            Error::Decode(_) => "Your session is invalid. Please login again.".to_string(),
            Error::Storage(_) => "Could not save your session on this device.".to_string(),
            Error::InvalidInput(_) | Error::Config(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }

    /// Check if this error means the session is gone and the user must log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::Auth(AuthError::SessionExpired))
    }
}

/// Transport-level errors.
///
/// These are failures to get any HTTP response at all. They are the only
/// failures the request pipeline retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// Network connection failed (refused, reset, DNS resolution).
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Any other failure while sending the request or reading the response.
    #[error("request failed: {message}")]
    Request { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Invalid credentials provided.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The authority rejected the login for another reason.
    #[error("login failed: {message}")]
    LoginFailed { message: String },

    /// A refresh was requested but no refresh token is held.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The refresh exchange failed (network or server rejection).
    #[error("token refresh failed: {reason}")]
    RefreshFailed { reason: String },

    /// Session has expired; the user has been logged out.
    #[error("session expired")]
    SessionExpired,
}

impl AuthError {
    fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password.",
            AuthError::LoginFailed { .. } => "Login failed. Please try again.",
            AuthError::NoRefreshToken
            | AuthError::RefreshFailed { .. }
            | AuthError::SessionExpired => "Session expired. Please login again.",
        }
    }
}

/// A non-success HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Error message from the server, if the body carried one.
    pub message: Option<String>,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create a new HTTP error.
    pub fn new(status: u16, message: Option<String>) -> Self {
        Self { status, message }
    }

    /// Human-readable message, preferring the server's own wording.
    pub fn user_message(&self) -> String {
        if let Some(ref message) = self.message {
            return message.clone();
        }

        match self.status {
            401 => "Session expired. Please login again.",
            403 => "You do not have permission to perform this action.",
            404 => "The requested resource was not found.",
            500 => "Server error. Please try again later.",
            503 => "Service temporarily unavailable. Please try again later.",
            _ => "An unexpected error occurred. Please try again.",
        }
        .to_string()
    }
}

/// Token decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The token did not have exactly three `.`-separated segments.
    #[error("expected 3 token segments, found {found}")]
    SegmentCount { found: usize },

    /// The payload segment was not valid base64.
    #[error("payload is not valid base64: {message}")]
    Base64 { message: String },

    /// The payload did not decode into the expected claims.
    #[error("payload is not a valid claims object: {message}")]
    Payload { message: String },

    /// The claims violate `exp > iat`.
    #[error("token expires ({exp}) at or before it was issued ({iat})")]
    Lifetime { iat: i64, exp: i64 },
}

/// Durable storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Reading an entry failed.
    #[error("failed to read '{key}': {message}")]
    Read { key: String, message: String },

    /// Writing an entry failed.
    #[error("failed to write '{key}': {message}")]
    Write { key: String, message: String },

    /// Deleting an entry failed.
    #[error("failed to delete '{key}': {message}")]
    Delete { key: String, message: String },

    /// A stored value could not be (de)serialized.
    #[error("invalid data in '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// A header name or value could not be used.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// A request or response body could not be (de)serialized.
    #[error("invalid body: {message}")]
    Body { message: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
