//! Single-flight access token refresh.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::AccessToken;
use crate::error::AuthError;
use crate::store::TokenStore;
use crate::traits::AuthApi;

type Outcome = Result<AccessToken, AuthError>;
type Waiters = Mutex<Option<Vec<oneshot::Sender<Outcome>>>>;

/// Makes sure at most one refresh exchange is in flight.
///
/// The first caller performs the exchange. Callers that arrive while it is
/// running are parked and receive a clone of the same outcome. The waiter
/// list exists only while an exchange is running (`Some`); taking it out of
/// the mutex is what returns the coordinator to idle.
pub struct RefreshCoordinator {
    store: Arc<TokenStore>,
    auth: Arc<dyn AuthApi>,
    pending: Waiters,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<TokenStore>, auth: Arc<dyn AuthApi>) -> Self {
        Self {
            store,
            auth,
            pending: Mutex::new(None),
        }
    }

    /// Returns true while an exchange is in flight.
    pub fn is_refreshing(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Obtain a fresh access token, sharing any exchange already running.
    ///
    /// # Errors
    ///
    /// [`AuthError::NoRefreshToken`] when there is nothing to exchange, or
    /// [`AuthError::RefreshFailed`] when the exchange fails. Either one means
    /// the session cannot continue.
    pub async fn refresh(&self) -> Outcome {
        let waiter = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            match pending.as_mut() {
                Some(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                None => {
                    *pending = Some(Vec::new());
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            debug!("Waiting for in-flight refresh");
            return rx.await.unwrap_or_else(|_| {
                Err(AuthError::RefreshFailed {
                    reason: "refresh was abandoned".to_string(),
                })
            });
        }

        let guard = SettleOnDrop {
            pending: &self.pending,
            armed: true,
        };
        let outcome = self.exchange().await;
        guard.settle(&outcome);
        outcome
    }

    async fn exchange(&self) -> Outcome {
        let Some(refresh_token) = self.store.get_refresh_token().await else {
            debug!("No refresh token to exchange");
            return Err(AuthError::NoRefreshToken);
        };

        info!("Refreshing access token");
        let grant = self.auth.refresh(&refresh_token).await.inspect_err(|e| {
            warn!(error = %e, "Token refresh failed");
        })?;

        // Durability is best effort here; memory is updated either way.
        if let Err(e) = self.store.set_token(grant.access_token.clone()).await {
            warn!(error = %e, "Refreshed access token kept in memory only");
        }
        if let Some(rotated) = grant.refresh_token
            && let Err(e) = self.store.set_refresh_token(rotated).await
        {
            warn!(error = %e, "Rotated refresh token kept in memory only");
        }

        debug!("Access token refreshed");
        Ok(grant.access_token)
    }
}

/// Wakes every waiter when the leading refresh settles, or rejects them if
/// the leader is dropped before it does.
struct SettleOnDrop<'a> {
    pending: &'a Waiters,
    armed: bool,
}

impl SettleOnDrop<'_> {
    fn settle(mut self, outcome: &Outcome) {
        self.armed = false;
        drain(self.pending, outcome);
    }
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            drain(
                self.pending,
                &Err(AuthError::RefreshFailed {
                    reason: "refresh was cancelled".to_string(),
                }),
            );
        }
    }
}

fn drain(pending: &Waiters, outcome: &Outcome) {
    let waiters = pending
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .unwrap_or_default();

    if !waiters.is_empty() {
        debug!(waiters = waiters.len(), "Releasing refresh waiters");
    }
    for tx in waiters {
        let _ = tx.send(outcome.clone());
    }
}
