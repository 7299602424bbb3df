//! Ethos Editor - The rich-text editing engine
//!
//! The engine owns a [`ethos_core::Document`] and acts on it through:
//! - The command dispatcher (`dispatcher`), applying [`Command`]s to the tracked selection
//! - The table engine (`table`) and image controller (`image`)
//! - The structural locator (`locator`) and word counter (`word_count`)
//!
//! [`Editor`] ties them into one session with persistence and events.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod editor;
pub mod error;
pub mod event;
pub mod fragments;
pub mod image;
pub mod locator;
pub mod table;
pub mod word_count;

pub use command::*;
pub use config::*;
pub use editor::*;
pub use error::*;
pub use event::*;
pub use image::*;
pub use locator::*;
pub use table::TableShape;
pub use word_count::*;
