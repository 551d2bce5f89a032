use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Not authenticated: no device identity can be resolved without credentials")]
    NotAuthenticated,

    #[error("Secure storage unavailable: {0}")]
    SecureStorageUnavailable(String),

    #[error("Settings storage unavailable: {0}")]
    SettingsUnavailable(String),

    #[error("Persisted identity for {email} is malformed: {message}")]
    MalformedIdentity { email: String, message: String },
}

pub type Result<T> = std::result::Result<T, IdentityError>;
