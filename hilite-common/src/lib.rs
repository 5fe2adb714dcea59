//! # Hilite Common Library
//!
//! Shared code for the highlight engine and its front ends:
//! - Timestamp codec (`M:SS` / `H:MM:SS` ↔ seconds)
//! - Common error types
//! - TOML bootstrap configuration and engine tuning constants
//! - Event types (HighlightEvent enum) and the EventBus

pub mod config;
pub mod error;
pub mod events;
pub mod time_codec;

pub use error::{Error, Result};
pub use time_codec::{seconds_to_timestamp, timestamp_to_seconds};
