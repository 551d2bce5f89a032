//! # Identity Resolver
//!
//! Derives and persists the deterministic synchronization identity binding a
//! user's credentials to server-side records.
//!
//! ## Overview
//!
//! The identity is a UUID derived from `(normalized_email, password)` under a
//! fixed namespace. It is computed when credentials are available
//! (login/registration) and persisted keyed by email, so later cold starts
//! can read it back without the password. The password itself is never
//! stored.
//!
//! ## Resolution rules
//!
//! - With a password: the expected identity is recomputed; a persisted value
//!   that differs is overwritten (write-after-read upsert), never treated as
//!   an error.
//! - Without a password: only the persisted value can be returned. Absence is
//!   an unrecoverable-without-credentials condition for callers that need to
//!   reach the server.

use crate::error::{IdentityError, Result};
use crate::types::{normalize_email, DeviceId, IdentityRecord};
use bridge_traits::storage::SettingsStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Settings key prefix for per-email identity records.
const IDENTITY_KEY_PREFIX: &str = "identity.device.";

/// Resolves device identities from credentials and the settings store.
#[derive(Clone)]
pub struct IdentityResolver {
    settings: Arc<dyn SettingsStore>,
}

impl IdentityResolver {
    /// Creates a resolver over the given settings store.
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    fn storage_key(normalized_email: &str) -> String {
        format!("{}{}", IDENTITY_KEY_PREFIX, normalized_email)
    }

    /// Resolve the device identity for an email.
    ///
    /// With `password`, the identity is recomputed and persisted; without it,
    /// only a previously persisted identity can be returned.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no password is supplied and nothing is persisted for
    /// this email; the caller must force re-authentication before any
    /// remote call.
    pub async fn resolve(&self, email: &str, password: Option<&str>) -> Result<Option<DeviceId>> {
        let normalized = normalize_email(email);
        let key = Self::storage_key(&normalized);

        let persisted = self
            .settings
            .get_string(&key)
            .await
            .map_err(|e| IdentityError::SettingsUnavailable(e.to_string()))?;

        if let Some(password) = password {
            let expected = DeviceId::derive(&normalized, password);

            let matches_persisted = persisted
                .as_deref()
                .map(|p| p == expected.to_string())
                .unwrap_or(false);

            if !matches_persisted {
                self.settings
                    .set_string(&key, &expected.to_string())
                    .await
                    .map_err(|e| IdentityError::SettingsUnavailable(e.to_string()))?;
                info!(email = %normalized, "Persisted derived device identity");
            }

            return Ok(Some(expected));
        }

        match persisted {
            Some(raw) => {
                let device_id =
                    DeviceId::from_string(&raw).map_err(|e| IdentityError::MalformedIdentity {
                        email: normalized.clone(),
                        message: e.to_string(),
                    })?;
                debug!(email = %normalized, "Resolved persisted device identity");
                Ok(Some(device_id))
            }
            None => {
                debug!(email = %normalized, "No persisted device identity");
                Ok(None)
            }
        }
    }

    /// Resolve the identity or fail with `NotAuthenticated`.
    ///
    /// Convenience for call sites that are about to talk to the server and
    /// must fail fast locally when no identity exists.
    pub async fn resolve_required(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> Result<IdentityRecord> {
        let normalized = normalize_email(email);
        match self.resolve(email, password).await? {
            Some(device_id) => Ok(IdentityRecord {
                normalized_email: normalized,
                device_id,
            }),
            None => Err(IdentityError::NotAuthenticated),
        }
    }

    /// Remove the persisted identity for an email.
    pub async fn forget(&self, email: &str) -> Result<()> {
        let key = Self::storage_key(&normalize_email(email));
        self.settings
            .delete(&key)
            .await
            .map_err(|e| IdentityError::SettingsUnavailable(e.to_string()))
    }
}
