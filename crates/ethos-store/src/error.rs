//! Error types for ethos-store

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store already exists at path: {0}")]
    StoreExists(String),

    #[error("Invalid store path: {0}")]
    InvalidPath(String),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A share token that could not be turned back into a snapshot
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("share token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("share token does not hold UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
