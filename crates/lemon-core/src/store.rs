//! Token store: the single owner of the persisted session.

use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::clock::Clock;
use crate::codec;
use crate::error::StorageError;
use crate::session::Session;
use crate::storage::{AUTH_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
use crate::traits::{AuthApi, SecureStore};
use crate::types::User;
use crate::{AccessToken, RefreshToken};

#[derive(Default)]
struct SessionState {
    access_token: Option<AccessToken>,
    refresh_token: Option<RefreshToken>,
    user: Option<User>,
}

/// Owns the access token, refresh token and user, and keeps them in sync
/// with durable storage.
///
/// The first read lazily loads the persisted session. Loading happens once,
/// and concurrent callers all wait for the same load to finish. If the
/// restored access token has expired, a single refresh is attempted through
/// the configured [`AuthApi`]; if that fails the session is cleared.
///
/// Setters are write-through: memory is always updated, and a failed
/// durable write is reported as a [`StorageError`].
pub struct TokenStore {
    storage: Arc<dyn SecureStore>,
    restorer: Arc<dyn AuthApi>,
    clock: Arc<dyn Clock>,
    state: RwLock<SessionState>,
    init: OnceCell<()>,
}

impl TokenStore {
    /// Create a store over `storage`.
    ///
    /// `restorer` is used only to refresh an expired token found at startup.
    pub fn new(
        storage: Arc<dyn SecureStore>,
        restorer: Arc<dyn AuthApi>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            restorer,
            clock,
            state: RwLock::new(SessionState::default()),
            init: OnceCell::new(),
        }
    }

    /// Load the persisted session. Later calls are no-ops.
    pub async fn initialize(&self) {
        self.init.get_or_init(|| self.restore()).await;
    }

    /// Returns true once the persisted session has been loaded.
    pub fn is_initialized(&self) -> bool {
        self.init.initialized()
    }

    /// The clock tokens are judged against.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Current access token, if any.
    pub async fn get_token(&self) -> Option<AccessToken> {
        self.initialize().await;
        self.state.read().await.access_token.clone()
    }

    /// Current refresh token, if any.
    pub async fn get_refresh_token(&self) -> Option<RefreshToken> {
        self.initialize().await;
        self.state.read().await.refresh_token.clone()
    }

    /// Current user, if any.
    pub async fn get_user(&self) -> Option<User> {
        self.initialize().await;
        self.state.read().await.user.clone()
    }

    /// The whole session, if all three parts are present.
    pub async fn snapshot(&self) -> Option<Session> {
        self.initialize().await;
        let state = self.state.read().await;
        Some(Session {
            access_token: state.access_token.clone()?,
            refresh_token: state.refresh_token.clone()?,
            user: state.user.clone()?,
        })
    }

    /// Replace the access token.
    pub async fn set_token(&self, token: AccessToken) -> Result<(), StorageError> {
        self.initialize().await;
        self.write_token(token).await
    }

    /// Replace the refresh token.
    pub async fn set_refresh_token(&self, token: RefreshToken) -> Result<(), StorageError> {
        self.initialize().await;
        self.write_refresh_token(token).await
    }

    /// Replace the user profile.
    pub async fn set_user(&self, user: User) -> Result<(), StorageError> {
        self.initialize().await;
        let value = serde_json::to_string(&user).map_err(|e| StorageError::Corrupt {
            key: USER_DATA_KEY.to_string(),
            message: e.to_string(),
        })?;
        self.state.write().await.user = Some(user);
        self.persist(USER_DATA_KEY, &value).await
    }

    /// Remove the session from memory and storage.
    ///
    /// Storage failures are logged, never returned.
    pub async fn clear_all(&self) {
        self.initialize().await;
        self.reset().await;
    }

    async fn write_token(&self, token: AccessToken) -> Result<(), StorageError> {
        let value = token.as_str().to_string();
        self.state.write().await.access_token = Some(token);
        self.persist(AUTH_TOKEN_KEY, &value).await
    }

    async fn write_refresh_token(&self, token: RefreshToken) -> Result<(), StorageError> {
        let value = token.as_str().to_string();
        self.state.write().await.refresh_token = Some(token);
        self.persist(REFRESH_TOKEN_KEY, &value).await
    }

    async fn persist(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(key, value).await.inspect_err(|e| {
            warn!(key, error = %e, "Failed to persist session value");
        })
    }

    async fn reset(&self) {
        let results = tokio::join!(
            self.storage.delete_item(AUTH_TOKEN_KEY),
            self.storage.delete_item(REFRESH_TOKEN_KEY),
            self.storage.delete_item(USER_DATA_KEY),
        );
        for result in [results.0, results.1, results.2] {
            if let Err(e) = result {
                warn!(error = %e, "Failed to delete session value");
            }
        }

        *self.state.write().await = SessionState::default();
        debug!("Session cleared");
    }

    async fn load(&self) -> Result<Option<Session>, StorageError> {
        let (access, refresh, user) = tokio::join!(
            self.storage.get_item(AUTH_TOKEN_KEY),
            self.storage.get_item(REFRESH_TOKEN_KEY),
            self.storage.get_item(USER_DATA_KEY),
        );

        match (access?, refresh?, user?) {
            (Some(access), Some(refresh), Some(user)) => {
                let user: User =
                    serde_json::from_str(&user).map_err(|e| StorageError::Corrupt {
                        key: USER_DATA_KEY.to_string(),
                        message: e.to_string(),
                    })?;
                Ok(Some(Session {
                    access_token: AccessToken::new(access),
                    refresh_token: RefreshToken::new(refresh),
                    user,
                }))
            }
            (None, None, None) => Ok(None),
            (access, refresh, _) => {
                let missing = if access.is_none() {
                    AUTH_TOKEN_KEY
                } else if refresh.is_none() {
                    REFRESH_TOKEN_KEY
                } else {
                    USER_DATA_KEY
                };
                Err(StorageError::Corrupt {
                    key: missing.to_string(),
                    message: "session is incomplete".to_string(),
                })
            }
        }
    }

    #[instrument(skip(self))]
    async fn restore(&self) {
        let session = match self.load().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("No persisted session");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session");
                self.reset().await;
                return;
            }
        };

        let Session {
            access_token,
            refresh_token,
            user,
        } = session;

        if codec::is_valid(access_token.as_str(), self.clock.now()) {
            *self.state.write().await = SessionState {
                access_token: Some(access_token),
                refresh_token: Some(refresh_token),
                user: Some(user),
            };
            info!("Session restored");
            return;
        }

        debug!("Restored access token expired, refreshing");
        match self.restorer.refresh(&refresh_token).await {
            Ok(grant) => {
                *self.state.write().await = SessionState {
                    access_token: None,
                    refresh_token: Some(refresh_token),
                    user: Some(user),
                };
                let _ = self.write_token(grant.access_token).await;
                if let Some(rotated) = grant.refresh_token {
                    let _ = self.write_refresh_token(rotated).await;
                }
                info!("Session restored after refresh");
            }
            Err(e) => {
                warn!(error = %e, "Could not refresh restored session");
                self.reset().await;
            }
        }
    }
}
