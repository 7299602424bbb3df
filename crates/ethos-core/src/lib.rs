//! Ethos Core - Document tree and shared types for the Ethos editor
//!
//! This crate defines the fundamental data structures used throughout Ethos:
//! - `Document`: The mutable tree the editing engine acts on
//! - `Node`: A text run or an element, linked to its parent
//! - `Fragment`: A detached subtree waiting to be spliced into a document
//! - `TemplateKey`: The (mode, variant) pair that addresses one saved document

pub mod document;
pub mod error;
pub mod fragment;
pub mod markup;
pub mod node;
pub mod selection;
pub mod style;
pub mod template;

pub use document::*;
pub use error::*;
pub use fragment::*;
pub use node::*;
pub use selection::*;
pub use style::*;
pub use template::*;
