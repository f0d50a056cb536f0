//! In-memory demo authority.
//!
//! Accepts a single fixed account and mints unsigned tokens locally, so the
//! client can be exercised without a server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::clock::{Clock, SystemClock};
use crate::codec::{self, TokenClaims, TokenHeader, TokenType};
use crate::error::{AuthError, InvalidInputError};
use crate::traits::{AuthApi, LoginGrant, RefreshGrant};
use crate::types::{Identifier, User};
use crate::{AccessToken, Credentials, RefreshToken, Result};

/// Email of the demo account.
pub const DEMO_EMAIL: &str = "demo@example.com";

/// Password of the demo account.
pub const DEMO_PASSWORD: &str = "demo123";

/// Display name of the demo account.
pub const DEMO_USER_NAME: &str = "Little Lemon User";

/// Access token lifetime: one hour.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Refresh token lifetime: seven days.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 604_800;

const DEMO_USER_ID: u64 = 1;
const DEMO_ROLE: &str = "customer";

/// An [`AuthApi`] backed by a fixed in-memory account.
#[derive(Debug, Clone)]
pub struct DemoAuthApi {
    clock: Arc<dyn Clock>,
    latency: Duration,
}

impl Default for DemoAuthApi {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoAuthApi {
    /// A demo authority on the system clock with no artificial latency.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// A demo authority that stamps tokens using `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`, to mimic a network round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The demo account's profile.
    pub fn demo_user() -> User {
        User {
            id: Identifier::Number(DEMO_USER_ID),
            email: DEMO_EMAIL.to_string(),
            name: DEMO_USER_NAME.to_string(),
            role: Some(DEMO_ROLE.to_string()),
            avatar: None,
        }
    }

    /// Mint a token of `token_type` for `email`, issued at `now`.
    pub fn issue_token(
        email: &str,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> std::result::Result<String, InvalidInputError> {
        let iat = now.timestamp();
        let ttl = match token_type {
            TokenType::Access => ACCESS_TOKEN_TTL_SECS,
            TokenType::Refresh => REFRESH_TOKEN_TTL_SECS,
        };
        let claims = TokenClaims {
            sub: Identifier::Number(DEMO_USER_ID),
            email: Some(email.to_string()),
            token_type,
            iat,
            exp: iat + ttl,
            role: Some(DEMO_ROLE.to_string()),
        };
        // The email may contain dots, so the signature is base64url.
        let signature = URL_SAFE_NO_PAD.encode(format!(
            "dummy_signature_{}_for_{}",
            token_type.as_str(),
            email
        ));

        codec::encode(&TokenHeader::default(), &claims, &signature).map_err(|e| {
            InvalidInputError::Other {
                message: e.to_string(),
            }
        })
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl AuthApi for DemoAuthApi {
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant> {
        self.simulate_latency().await;

        if credentials.email() != DEMO_EMAIL || credentials.password() != DEMO_PASSWORD {
            debug!("Rejected demo credentials");
            return Err(AuthError::InvalidCredentials.into());
        }

        let now = self.clock.now();
        let access = Self::issue_token(DEMO_EMAIL, TokenType::Access, now)?;
        let refresh = Self::issue_token(DEMO_EMAIL, TokenType::Refresh, now)?;

        Ok(LoginGrant {
            access_token: AccessToken::new(access),
            refresh_token: RefreshToken::new(refresh),
            user: Self::demo_user(),
        })
    }

    #[instrument(skip_all)]
    async fn refresh(
        &self,
        refresh_token: &RefreshToken,
    ) -> std::result::Result<RefreshGrant, AuthError> {
        self.simulate_latency().await;

        let now = self.clock.now();
        let claims = refresh_token
            .claims()
            .map_err(|e| AuthError::RefreshFailed {
                reason: e.to_string(),
            })?;

        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::RefreshFailed {
                reason: "not a refresh token".to_string(),
            });
        }
        if !claims.is_valid_at(now) {
            return Err(AuthError::RefreshFailed {
                reason: "refresh token expired".to_string(),
            });
        }

        let email = claims.email.as_deref().unwrap_or(DEMO_EMAIL);
        let access = Self::issue_token(email, TokenType::Access, now).map_err(|e| {
            AuthError::RefreshFailed {
                reason: e.to_string(),
            }
        })?;

        debug!("Issued demo access token");
        Ok(RefreshGrant {
            access_token: AccessToken::new(access),
            refresh_token: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TestClock;

    const NOW: i64 = 1_700_000_000;

    fn api(clock: &TestClock) -> DemoAuthApi {
        DemoAuthApi::with_clock(Arc::new(clock.clone()))
    }

    #[tokio::test]
    async fn accepts_demo_account() {
        let clock = TestClock::new(NOW);
        let grant = api(&clock)
            .login(&Credentials::new(DEMO_EMAIL, DEMO_PASSWORD))
            .await
            .unwrap();

        assert_eq!(grant.user.name, DEMO_USER_NAME);
        let access = grant.access_token.claims().unwrap();
        assert_eq!(access.token_type, TokenType::Access);
        assert_eq!(access.exp - access.iat, 3600);
        assert_eq!(access.email.as_deref(), Some(DEMO_EMAIL));

        let refresh = grant.refresh_token.claims().unwrap();
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_eq!(refresh.exp - refresh.iat, 604_800);
    }

    #[tokio::test]
    async fn rejects_other_credentials() {
        let clock = TestClock::new(NOW);
        for (email, password) in [
            (DEMO_EMAIL, "wrong"),
            ("someone@example.com", DEMO_PASSWORD),
            ("", ""),
        ] {
            let err = api(&clock)
                .login(&Credentials::new(email, password))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                crate::Error::Auth(AuthError::InvalidCredentials)
            ));
        }
    }

    #[test]
    fn signature_names_type_and_email() {
        let token =
            DemoAuthApi::issue_token(DEMO_EMAIL, TokenType::Refresh, Utc::now()).unwrap();
        let signature = token.rsplit('.').next().unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(signature).unwrap();
        assert_eq!(decoded, b"dummy_signature_refresh_for_demo@example.com");
    }

    #[test]
    fn issued_tokens_decode_as_three_segments() {
        let now = DateTime::from_timestamp(NOW, 0).unwrap();
        for (email, token_type) in [
            (DEMO_EMAIL, TokenType::Access),
            (DEMO_EMAIL, TokenType::Refresh),
            ("first.last@mail.example.co.uk", TokenType::Access),
        ] {
            let token = DemoAuthApi::issue_token(email, token_type, now).unwrap();
            assert_eq!(token.split('.').count(), 3, "{token}");

            let claims = codec::decode(&token).unwrap();
            assert_eq!(claims.token_type, token_type);
            assert_eq!(claims.email.as_deref(), Some(email));
            assert_eq!(claims.iat, NOW);
            assert!(codec::is_valid(&token, now));
        }
    }

    #[tokio::test]
    async fn refresh_issues_new_access_token() {
        let clock = TestClock::new(NOW);
        let api = api(&clock);
        let grant = api
            .login(&Credentials::new(DEMO_EMAIL, DEMO_PASSWORD))
            .await
            .unwrap();

        clock.advance(7200);
        let refreshed = api.refresh(&grant.refresh_token).await.unwrap();

        let claims = refreshed.access_token.claims().unwrap();
        assert_eq!(claims.iat, NOW + 7200);
        assert!(refreshed.refresh_token.is_none());
    }

    #[tokio::test]
    async fn refresh_rejects_access_and_expired_tokens() {
        let clock = TestClock::new(NOW);
        let api = api(&clock);
        let grant = api
            .login(&Credentials::new(DEMO_EMAIL, DEMO_PASSWORD))
            .await
            .unwrap();

        let as_refresh = RefreshToken::new(grant.access_token.as_str());
        assert!(matches!(
            api.refresh(&as_refresh).await,
            Err(AuthError::RefreshFailed { .. })
        ));

        clock.advance(REFRESH_TOKEN_TTL_SECS);
        assert!(matches!(
            api.refresh(&grant.refresh_token).await,
            Err(AuthError::RefreshFailed { .. })
        ));

        assert!(matches!(
            api.refresh(&RefreshToken::new("garbage")).await,
            Err(AuthError::RefreshFailed { .. })
        ));
    }
}
