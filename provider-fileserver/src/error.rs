//! Error types for the file service client

use thiserror::Error;

/// File service client errors
#[derive(Error, Debug)]
pub enum FileServerError {
    /// Authentication rejected by the server
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error status
    #[error("File service error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// File not found on the server
    #[error("File not found: {filename}")]
    FileNotFound { filename: String },

    /// Failed to parse an API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for file service operations
pub type Result<T> = std::result::Result<T, FileServerError>;

impl From<FileServerError> for bridge_traits::error::BridgeError {
    fn from(error: FileServerError) -> Self {
        match error {
            FileServerError::AuthenticationFailed(msg) => {
                bridge_traits::error::BridgeError::OperationFailed(format!(
                    "Authentication failed: {}",
                    msg
                ))
            }
            FileServerError::ApiError {
                status_code,
                message,
            } => bridge_traits::error::BridgeError::OperationFailed(format!(
                "API error (status {}): {}",
                status_code, message
            )),
            FileServerError::FileNotFound { filename } => {
                bridge_traits::error::BridgeError::OperationFailed(format!(
                    "File not found: {}",
                    filename
                ))
            }
            FileServerError::ParseError(msg) => {
                bridge_traits::error::BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            FileServerError::BridgeError(e) => e,
        }
    }
}
