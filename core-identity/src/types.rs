use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fixed namespace under which device identities are derived.
///
/// Changing this constant changes every derived identity, which would orphan
/// server-side records; it is part of the wire contract.
pub const DEVICE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x7c9e_6679_7425_40de_944b_e07f_c1f9_0ae7);

/// Deterministic synchronization identity for a (email, password) pair.
///
/// Derived once at login/registration, persisted keyed by normalized email,
/// and sent as the `X-Device-UUID` header on every remote call. The same
/// credentials always yield the same identity, across devices and reinstalls,
/// because the derivation is entirely local.
///
/// # Examples
///
/// ```
/// use core_identity::DeviceId;
///
/// let a = DeviceId::derive("User@Example.com", "secret");
/// let b = DeviceId::derive("user@example.com", "secret");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Derive the identity for a credential pair.
    ///
    /// The email is normalized first, so case and surrounding whitespace
    /// never produce distinct identities. No network call is involved.
    pub fn derive(email: &str, password: &str) -> Self {
        let input = format!("{}:{}", normalize_email(email), password);
        Self(Uuid::new_v5(&DEVICE_ID_NAMESPACE, input.as_bytes()))
    }

    /// Parse a device ID from its string representation
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DeviceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Normalize an email for use as an identity key.
///
/// Lower-cases and trims; `A@B.com` and `a@b.com` are the same account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// The persisted identity record for one email.
///
/// Immutable for a given email once written (a differing re-derivation
/// overwrites it wholesale, never merges).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Normalized login email the record is keyed by
    pub normalized_email: String,

    /// The credential-derived device identity
    pub device_id: DeviceId,
}
