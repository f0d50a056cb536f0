//! Compact three-part token codec and validator.
//!
//! Tokens have the shape `header.payload.signature` where the first two
//! segments are base64-encoded JSON. Signatures are not verified on the
//! client; only the payload is inspected, to learn who the token is for and
//! when it expires.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DecodeError;
use crate::types::Identifier;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

/// Standard alphabet, padding optional.
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// URL-safe alphabet, padding optional.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Issuer-assigned token type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived bearer credential.
    Access,
    /// Long-lived credential exchanged for new access tokens.
    Refresh,
}

impl TokenType {
    /// Returns the wire name of the token type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Token header segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm name.
    pub alg: String,
    /// Token type, usually `JWT`.
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Decoded token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user) identifier.
    pub sub: Identifier,
    /// Email of the subject, if the issuer includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether this is an access or refresh token.
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Issued-at, UNIX seconds.
    pub iat: i64,
    /// Expiry, UNIX seconds.
    pub exp: i64,
    /// Role of the subject, if the issuer includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl TokenClaims {
    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// True iff the token has not yet expired at `now`.
    #[inline]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.exp > now.timestamp()
    }

    /// True once `now` has reached the expiry.
    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_valid_at(now)
    }

    /// Seconds remaining until expiry at `now`, zero once expired.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> i64 {
        (self.exp - now.timestamp()).max(0)
    }
}

/// Decode a token's payload into typed claims.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the token does not have exactly three
/// segments, the payload is not base64 JSON of the expected shape, or the
/// claims expire at or before they were issued.
pub fn decode(token: &str) -> Result<TokenClaims, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount {
            found: segments.len(),
        });
    }

    let payload = decode_segment(segments[1])?;
    let claims: TokenClaims =
        serde_json::from_slice(&payload).map_err(|e| DecodeError::Payload {
            message: e.to_string(),
        })?;

    if claims.exp <= claims.iat {
        return Err(DecodeError::Lifetime {
            iat: claims.iat,
            exp: claims.exp,
        });
    }

    Ok(claims)
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD_LENIENT
        .decode(segment)
        .or_else(|_| URL_SAFE_LENIENT.decode(segment))
        .map_err(|e| DecodeError::Base64 {
            message: e.to_string(),
        })
}

/// Check whether a token is valid at `now`.
///
/// Never fails: anything that does not decode is simply invalid. The result
/// is derived afresh on every call.
pub fn is_valid(token: &str, now: DateTime<Utc>) -> bool {
    match decode(token) {
        Ok(claims) => claims.is_valid_at(now),
        Err(err) => {
            debug!(error = %err, "token failed to decode");
            false
        }
    }
}

/// Encode a token from its parts.
///
/// Header and payload use the standard base64 alphabet with padding.
pub fn encode(
    header: &TokenHeader,
    claims: &TokenClaims,
    signature: &str,
) -> Result<String, serde_json::Error> {
    let header = STANDARD.encode(serde_json::to_vec(header)?);
    let payload = STANDARD.encode(serde_json::to_vec(claims)?);
    Ok(format!("{}.{}.{}", header, payload, signature))
}
