use thiserror::Error;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Asset enumeration failed: {0}")]
    Enumeration(String),

    #[error("Album {name} unavailable: {message}")]
    Album { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, InventoryError>;
