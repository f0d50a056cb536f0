//! Authentication authority trait.

use async_trait::async_trait;

use crate::error::AuthError;
use crate::types::User;
use crate::{AccessToken, Credentials, RefreshToken, Result};

/// Output of a successful login.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    /// Bearer token for subsequent requests.
    pub access_token: AccessToken,
    /// Token used to obtain new access tokens.
    pub refresh_token: RefreshToken,
    /// Profile of the signed-in user.
    pub user: User,
}

/// Output of a successful refresh exchange.
#[derive(Debug, Clone)]
pub struct RefreshGrant {
    /// The new access token.
    pub access_token: AccessToken,
    /// A rotated refresh token, when the authority issues one.
    pub refresh_token: Option<RefreshToken>,
}

/// An authority that exchanges credentials and refresh tokens for tokens.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token pair and the user profile.
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant>;

    /// Exchange a refresh token for a new access token.
    ///
    /// Any failure, network or server side, is reported as
    /// [`AuthError::RefreshFailed`].
    async fn refresh(
        &self,
        refresh_token: &RefreshToken,
    ) -> std::result::Result<RefreshGrant, AuthError>;
}
