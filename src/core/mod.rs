//! Core error types for ccsettings
//!
//! - [`SettingsError`] - enumerated failure modes
//! - [`ErrorContext`] - user-facing wrapper with suggestions and details
//! - [`user_friendly_error`] - convert any [`anyhow::Error`] for CLI display

pub mod error;

pub use error::{ErrorContext, PresetBlob, SettingsError, user_friendly_error};
