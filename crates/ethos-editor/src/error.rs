//! Error types for ethos-editor

use ethos_core::CoreError;
use ethos_store::{DecodeError, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("No table in scope")]
    NoTableInScope,

    #[error("Invalid table size: {rows}x{cols}")]
    InvalidTableSize { rows: usize, cols: usize },

    #[error("Table rows have different cell counts")]
    IrregularTable,

    #[error("No image selected")]
    NoImageSelected,

    #[error("Invalid value for {command}: {value}")]
    InvalidCommandValue { command: &'static str, value: String },

    #[error("Document error: {0}")]
    Core(#[from] CoreError),

    #[error("Invalid share link: {0}")]
    ShareLink(#[from] DecodeError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EditorError {
    pub(crate) fn invalid(command: &'static str, value: impl Into<String>) -> Self {
        EditorError::InvalidCommandValue {
            command,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
