//! Ethos Assistant - The writing assistant around the editor
//!
//! This crate provides:
//! - The `Generator` port the AI backend plugs into, with per-mode system instructions
//! - `Assistant`, which turns generator failures into a fallback reply
//! - Draft prompt builders for CVs and articles
//! - Writing metrics fed by editor activity, and the report export port

pub mod assistant;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod prompt;

pub use assistant::*;
pub use error::*;
pub use generator::*;
pub use metrics::*;
pub use prompt::*;
