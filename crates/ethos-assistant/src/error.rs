//! Error types for ethos-assistant

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    #[error("Generation failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
