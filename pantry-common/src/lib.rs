//! # Pantry Common Library
//!
//! Shared code for the pantry crates:
//! - Error type and result alias
//! - Configuration loading (CLI → ENV → TOML → defaults)
//! - Event bus for change notification
//! - Time helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
pub use events::EventBus;
