//! Session facade.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::LemonApi;
use crate::client::ApiClient;
use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::config::ClientConfig;
use crate::refresh::RefreshCoordinator;
use crate::store::TokenStore;
use crate::traits::{AuthApi, LoginGrant, SecureStore, Transport};
use crate::types::User;
use crate::{AccessToken, Credentials, RefreshToken, Result};

/// The persisted triple of access token, refresh token and user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub user: User,
}

/// The composition root for an authenticated client.
///
/// Wires one [`TokenStore`], one [`RefreshCoordinator`] and one
/// [`ApiClient`] over the injected storage, transport and auth authority.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use lemon_core::{ClientConfig, Credentials, DemoAuthApi, MemoryStore, SessionManager};
/// # use lemon_core::{HttpRequest, HttpResponse, Transport, error::NetworkError};
/// # struct Offline;
/// # #[async_trait::async_trait]
/// # impl Transport for Offline {
/// #     async fn send(&self, _: HttpRequest) -> Result<HttpResponse, NetworkError> {
/// #         Err(NetworkError::Connection { message: "offline".into() })
/// #     }
/// # }
///
/// # async fn example() -> lemon_core::Result<()> {
/// let config = ClientConfig::from_env()?;
/// let manager = SessionManager::new(
///     config,
///     Arc::new(MemoryStore::new()),
///     Arc::new(Offline),
///     Arc::new(DemoAuthApi::new()),
/// );
///
/// let session = manager.login(Credentials::new("demo@example.com", "demo123")).await?;
/// assert_eq!(session.user.name, "Little Lemon User");
/// assert!(manager.is_authenticated().await);
/// # Ok(())
/// # }
/// ```
pub struct SessionManager {
    store: Arc<TokenStore>,
    auth: Arc<dyn AuthApi>,
    client: Arc<ApiClient>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Build a manager using the system clock.
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn SecureStore>,
        transport: Arc<dyn Transport>,
        auth: Arc<dyn AuthApi>,
    ) -> Self {
        Self::with_clock(config, storage, transport, auth, Arc::new(SystemClock))
    }

    /// Build a manager that judges token expiry against `clock`.
    pub fn with_clock(
        config: ClientConfig,
        storage: Arc<dyn SecureStore>,
        transport: Arc<dyn Transport>,
        auth: Arc<dyn AuthApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(TokenStore::new(storage, auth.clone(), clock.clone()));
        let refresher = Arc::new(RefreshCoordinator::new(store.clone(), auth.clone()));
        let client = Arc::new(ApiClient::new(config, transport, store.clone(), refresher));
        Self {
            store,
            auth,
            client,
            clock,
        }
    }

    /// Load any persisted session. Safe to call repeatedly.
    pub async fn initialize(&self) {
        self.store.initialize().await;
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// # Errors
    ///
    /// Returns the authority's error unchanged (nothing is stored), or a
    /// storage error if the new session could not be persisted.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: Credentials) -> Result<Session> {
        self.store.initialize().await;
        info!("Logging in");

        let grant = self.auth.login(&credentials).await?;

        if let Err(e) = self.persist(&grant).await {
            warn!(error = %e, "Could not store new session, discarding it");
            self.store.clear_all().await;
            return Err(e);
        }

        info!(user = %grant.user.id, "Logged in");
        Ok(Session {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            user: grant.user,
        })
    }

    async fn persist(&self, grant: &LoginGrant) -> Result<()> {
        self.store.set_token(grant.access_token.clone()).await?;
        self.store
            .set_refresh_token(grant.refresh_token.clone())
            .await?;
        self.store.set_user(grant.user.clone()).await?;
        Ok(())
    }

    /// Forget the session. Never fails.
    pub async fn logout(&self) {
        self.store.clear_all().await;
        info!("Logged out");
    }

    /// True iff an access token is held and has not expired.
    pub async fn is_authenticated(&self) -> bool {
        match self.store.get_token().await {
            Some(token) => codec::is_valid(token.as_str(), self.clock.now()),
            None => false,
        }
    }

    /// The signed-in user, if any.
    pub async fn user(&self) -> Option<User> {
        self.store.get_user().await
    }

    /// The current session, if complete.
    pub async fn session(&self) -> Option<Session> {
        self.store.snapshot().await
    }

    /// The authenticated request pipeline.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Typed application endpoints over the pipeline.
    pub fn api(&self) -> LemonApi {
        LemonApi::new(self.client.clone())
    }

    /// The underlying token store.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }
}
