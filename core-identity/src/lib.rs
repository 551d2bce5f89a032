//! # Identity Module
//!
//! Derives and persists the deterministic synchronization identity that binds
//! a user's credentials to server-side records.
//!
//! ## Overview
//!
//! - **Device identity derivation** (`types`): UUID derived from
//!   `(normalized_email, password)` under a fixed namespace; reproducible
//!   without storing the password
//! - **Identity Resolver** (`resolver`): resolve-or-derive with persistent
//!   upsert semantics
//! - **Session Manager** (`session`): binds the stored session token to a
//!   resolvable identity and invalidates orphaned sessions

pub mod error;
pub mod resolver;
pub mod session;
pub mod types;

pub use error::{IdentityError, Result};
pub use resolver::IdentityResolver;
pub use session::{Session, SessionManager, SETTING_REMEMBERED_EMAIL};
pub use types::{normalize_email, DeviceId, IdentityRecord, DEVICE_ID_NAMESPACE};
