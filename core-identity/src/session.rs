//! Session Management
//!
//! Binds the stored session token to a resolvable device identity and
//! invalidates sessions that can no longer be bound.
//!
//! ## Overview
//!
//! Three persisted pieces make up a usable session:
//! - the session token (secure store)
//! - the remembered login email (settings store)
//! - the per-email device identity (settings store, via `IdentityResolver`)
//!
//! A token without a resolvable identity is useless (the server would reject
//! or misattribute every call), so `active_session` clears it and forces
//! re-login instead of handing it out.

use crate::error::{IdentityError, Result};
use crate::resolver::IdentityResolver;
use crate::types::{normalize_email, DeviceId};
use bridge_traits::storage::{SecureStore, SettingsStore};
use core_runtime::events::{CoreEvent, EventBus, IdentityEvent};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Secure-store key holding the session token.
const SECRET_SESSION_TOKEN: &str = "auth.session_token";

/// Settings key holding the remembered login email.
pub const SETTING_REMEMBERED_EMAIL: &str = "auth.email";

/// A fully resolved session: everything a remote call needs.
#[derive(Debug, Clone)]
pub struct Session {
    /// Normalized login email
    pub email: String,
    /// Bearer token for the file service
    pub token: String,
    /// Credential-derived device identity
    pub device_id: DeviceId,
}

/// Manages the persisted session and its identity binding.
pub struct SessionManager {
    secure_store: Arc<dyn SecureStore>,
    settings: Arc<dyn SettingsStore>,
    resolver: IdentityResolver,
    event_bus: EventBus,
}

impl SessionManager {
    /// Creates a new session manager.
    ///
    /// # Arguments
    ///
    /// * `secure_store` - Platform secure storage for the session token
    /// * `settings` - Settings storage for email and identity records
    /// * `event_bus` - Event bus for identity state changes
    pub fn new(
        secure_store: Arc<dyn SecureStore>,
        settings: Arc<dyn SettingsStore>,
        event_bus: EventBus,
    ) -> Self {
        let resolver = IdentityResolver::new(settings.clone());
        Self {
            secure_store,
            settings,
            resolver,
            event_bus,
        }
    }

    /// Access the underlying identity resolver.
    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    /// Record a successful login or registration.
    ///
    /// Derives and persists the device identity from the credentials, stores
    /// the session token, and remembers the email for cold starts.
    #[instrument(skip(self, password, token), fields(email = %normalize_email(email)))]
    pub async fn sign_in(&self, email: &str, password: &str, token: &str) -> Result<Session> {
        let record = self
            .resolver
            .resolve_required(email, Some(password))
            .await?;

        self.settings
            .set_string(SETTING_REMEMBERED_EMAIL, &record.normalized_email)
            .await
            .map_err(|e| IdentityError::SettingsUnavailable(e.to_string()))?;

        self.secure_store
            .set_secret(SECRET_SESSION_TOKEN, token.as_bytes())
            .await
            .map_err(|e| IdentityError::SecureStorageUnavailable(e.to_string()))?;

        info!(email = %record.normalized_email, "Signed in");
        self.event_bus
            .emit(CoreEvent::Identity(IdentityEvent::SignedIn {
                email: record.normalized_email.clone(),
                device_id: record.device_id.to_string(),
            }))
            .ok();

        Ok(Session {
            email: record.normalized_email,
            token: token.to_string(),
            device_id: record.device_id,
        })
    }

    /// Resolve the active session, if any.
    ///
    /// Returns `Ok(None)` when no token is stored (signed out). When a token
    /// exists but no identity can be resolved for the remembered email, the
    /// token is cleared and `NotAuthenticated` is returned; the caller must
    /// send the user back through login.
    #[instrument(skip(self))]
    pub async fn active_session(&self) -> Result<Option<Session>> {
        let token = self
            .secure_store
            .get_secret(SECRET_SESSION_TOKEN)
            .await
            .map_err(|e| IdentityError::SecureStorageUnavailable(e.to_string()))?;

        let Some(token) = token else {
            return Ok(None);
        };

        let token = String::from_utf8(token).map_err(|e| {
            IdentityError::SecureStorageUnavailable(format!("Stored token is not UTF-8: {}", e))
        })?;

        let email = self
            .settings
            .get_string(SETTING_REMEMBERED_EMAIL)
            .await
            .map_err(|e| IdentityError::SettingsUnavailable(e.to_string()))?;

        let device_id = match &email {
            Some(email) => self.resolver.resolve(email, None).await?,
            None => None,
        };

        match device_id {
            Some(device_id) => Ok(Some(Session {
                email: email.unwrap_or_default(),
                token,
                device_id,
            })),
            None => {
                warn!("Session token present but no resolvable identity; invalidating");
                self.secure_store
                    .delete_secret(SECRET_SESSION_TOKEN)
                    .await
                    .map_err(|e| IdentityError::SecureStorageUnavailable(e.to_string()))?;

                self.event_bus
                    .emit(CoreEvent::Identity(IdentityEvent::SessionInvalidated {
                        email,
                    }))
                    .ok();

                Err(IdentityError::NotAuthenticated)
            }
        }
    }

    /// Clear the session token.
    ///
    /// The identity record stays; it is reproducible from credentials and
    /// harmless without a token.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        self.secure_store
            .delete_secret(SECRET_SESSION_TOKEN)
            .await
            .map_err(|e| IdentityError::SecureStorageUnavailable(e.to_string()))?;

        let email = self
            .settings
            .get_string(SETTING_REMEMBERED_EMAIL)
            .await
            .map_err(|e| IdentityError::SettingsUnavailable(e.to_string()))?
            .unwrap_or_default();

        info!(email = %email, "Signed out");
        self.event_bus
            .emit(CoreEvent::Identity(IdentityEvent::SignedOut { email }))
            .ok();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySecureStore {
        data: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for MemorySecureStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySettingsStore {
        data: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl SettingsStore for MemorySettingsStore {
        async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        async fn delete(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            Ok(self.data.lock().unwrap().keys().cloned().collect())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            self.data.lock().unwrap().clear();
            Ok(())
        }
    }

    fn manager() -> SessionManager {
        SessionManager::new(
            Arc::new(MemorySecureStore::default()),
            Arc::new(MemorySettingsStore::default()),
            EventBus::new(16),
        )
    }

    #[tokio::test]
    async fn test_sign_in_then_active_session() {
        let manager = manager();

        let session = manager
            .sign_in("User@Example.com", "pw", "token-1")
            .await
            .unwrap();
        assert_eq!(session.email, "user@example.com");

        let active = manager.active_session().await.unwrap().unwrap();
        assert_eq!(active.token, "token-1");
        assert_eq!(active.device_id, session.device_id);
    }

    #[tokio::test]
    async fn test_no_token_means_no_session() {
        let manager = manager();
        assert!(manager.active_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_orphaned_token_invalidates_session() {
        let secure = Arc::new(MemorySecureStore::default());
        let settings = Arc::new(MemorySettingsStore::default());
        let manager = SessionManager::new(secure.clone(), settings, EventBus::new(16));

        // A token with no identity record behind it
        secure
            .set_secret(SECRET_SESSION_TOKEN, b"orphan-token")
            .await
            .unwrap();

        let result = manager.active_session().await;
        assert!(matches!(result, Err(IdentityError::NotAuthenticated)));

        // The token was cleared; the next check reports signed-out
        assert!(manager.active_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_token_keeps_identity() {
        let manager = manager();

        manager
            .sign_in("user@example.com", "pw", "token-1")
            .await
            .unwrap();
        manager.sign_out().await.unwrap();

        assert!(manager.active_session().await.unwrap().is_none());

        // Identity record survives sign-out
        let device_id = manager
            .resolver()
            .resolve("user@example.com", None)
            .await
            .unwrap();
        assert!(device_id.is_some());
    }
}
