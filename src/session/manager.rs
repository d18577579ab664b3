use crate::error::AuthError;
use crate::session::credential::Credential;
use crate::session::interface::Authenticator;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Owns the current credential and replaces it wholesale when it goes
/// stale. Callers never hold a half-refreshed credential: they either get
/// the cached one or the replacement.
pub struct SessionManager {
    auth: Arc<dyn Authenticator>,
    current: RwLock<Option<Credential>>,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn Authenticator>) -> Self {
        Self {
            auth,
            current: RwLock::new(None),
        }
    }

    /// Seeds the manager with a previously persisted credential.
    pub fn with_credential(auth: Arc<dyn Authenticator>, credential: Credential) -> Self {
        Self {
            auth,
            current: RwLock::new(Some(credential)),
        }
    }

    /// Returns a credential ready for use, logging in on first call and
    /// refreshing when the stored expiry has passed.
    pub async fn credential(&self) -> Result<Credential, AuthError> {
        let now = Utc::now();
        {
            let guard = self.current.read().await;
            if let Some(credential) = guard.as_ref() {
                if !credential.is_expired(now) {
                    return Ok(credential.clone());
                }
            }
        }

        let mut guard = self.current.write().await;
        // Re-check under the write lock: another caller may have finished first.
        if let Some(credential) = guard.as_ref() {
            if !credential.is_expired(now) {
                return Ok(credential.clone());
            }
        }

        let fresh = match guard.as_ref() {
            Some(stale) => {
                debug!("Credential expired for user {}, refreshing", stale.user_id);
                self.auth.refresh(stale).await?
            }
            None => self.auth.login().await?,
        };
        *guard = Some(fresh.clone());
        Ok(fresh)
    }

    /// Replaces a credential the server rejected. The rejected token is
    /// compared against the stored one so concurrent callers reacting to
    /// the same rejection trigger exactly one refresh.
    pub async fn refresh_rejected(&self, rejected: &Credential) -> Result<Credential, AuthError> {
        let mut guard = self.current.write().await;
        if let Some(current) = guard.as_ref() {
            if current.auth_token != rejected.auth_token {
                debug!("Credential already replaced, reusing it");
                return Ok(current.clone());
            }
        }

        warn!(
            "Server rejected credential for user {}, refreshing",
            rejected.user_id
        );
        let fresh = match self.auth.refresh(rejected).await {
            Ok(fresh) => fresh,
            Err(AuthError::BadCredentials) => {
                info!("Refresh rejected, falling back to a full login");
                self.auth.login().await?
            }
            Err(e) => return Err(e),
        };
        *guard = Some(fresh.clone());
        Ok(fresh)
    }

    /// Forces a full login, discarding any stored credential.
    pub async fn login(&self) -> Result<Credential, AuthError> {
        let mut guard = self.current.write().await;
        let fresh = self.auth.login().await?;
        *guard = Some(fresh.clone());
        Ok(fresh)
    }
}
