//! Error types for ethos-core

use thiserror::Error;

use crate::NodeId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node is not an element: {0}")]
    NotAnElement(NodeId),

    #[error("Node is not a text run: {0}")]
    NotText(NodeId),

    #[error("Node is already attached to a parent: {0}")]
    AlreadyAttached(NodeId),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Markup error at byte {position}: {message}")]
    Markup { position: usize, message: String },

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("Unknown CV layout: {0}")]
    UnknownLayout(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
