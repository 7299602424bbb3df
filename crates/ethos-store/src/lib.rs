//! Ethos Store - Persistence for the Ethos editor
//!
//! This crate provides:
//! - A string key-value port (`SnapshotStore`) with memory and local-directory backends
//! - The persistence adapter that saves and loads snapshots by template key
//! - The share-link codec and the clipboard port used to hand links out
//! - The custom template library

pub mod error;
pub mod library;
pub mod local;
pub mod persistence;
pub mod share;
pub mod store;

pub use error::*;
pub use library::*;
pub use local::*;
pub use persistence::*;
pub use share::*;
pub use store::*;
