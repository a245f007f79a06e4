//! Error handling for ccsettings
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`SettingsError`]) for failures that callers
//!    need to tell apart, such as a preset blob that is not valid JSON or a
//!    preset name that is already taken.
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable
//!    suggestions for CLI users.
//!
//! Fallible operations that touch the filesystem return [`anyhow::Result`].
//! Typed errors travel inside the [`anyhow::Error`] and can be recovered with
//! `downcast_ref::<SettingsError>()`.
//!
//! Detected inconsistencies between scopes are *not* errors. They are
//! reported as [`SettingsIssue`](crate::issues::SettingsIssue) values and
//! never block merging.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ccsettings_cli::core::{SettingsError, user_friendly_error};
//!
//! let error = anyhow::Error::from(SettingsError::EmptyPresetName);
//! let context = user_friendly_error(error);
//! context.display(); // Prints a colored error with a suggestion
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::settings::Scope;

/// Which of the two serialized blobs of a preset failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetBlob {
    /// The serialized settings document.
    Settings,
    /// The serialized MCP server map.
    McpServers,
}

impl fmt::Display for PresetBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings => write!(f, "settings"),
            Self::McpServers => write!(f, "mcpServers"),
        }
    }
}

/// The main error type for ccsettings operations.
///
/// # Error Categories
///
/// ## Parsing
/// - [`PresetParse`](Self::PresetParse) - a preset blob is not valid JSON
/// - [`SettingsParse`](Self::SettingsParse) - a settings file on disk is not valid JSON
///
/// ## Preset validation
/// - [`EmptyPresetName`](Self::EmptyPresetName)
/// - [`DuplicatePresetName`](Self::DuplicatePresetName)
/// - [`PresetNotFound`](Self::PresetNotFound)
///
/// ## Scope targeting
/// - [`ReadOnlyScope`](Self::ReadOnlyScope) - managed settings are never written
/// - [`MissingProjectPath`](Self::MissingProjectPath) - project scopes need a project
///
/// ## Everything else
/// - [`UnknownSliderCategory`](Self::UnknownSliderCategory)
/// - [`ConfigError`](Self::ConfigError)
/// - [`Io`](Self::Io)
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A preset blob could not be parsed. No write was issued.
    #[error("Preset {blob} blob is not valid JSON: {reason}")]
    PresetParse {
        /// Which blob failed
        blob: PresetBlob,
        /// Parser message
        reason: String,
    },

    /// A settings or MCP file exists but does not contain valid JSON.
    #[error("Invalid JSON in {path}: {reason}")]
    SettingsParse {
        /// File that failed to parse
        path: String,
        /// Parser message
        reason: String,
    },

    /// Preset names must contain at least one non-whitespace character.
    #[error("Preset name cannot be empty")]
    EmptyPresetName,

    /// Another preset already uses this name.
    #[error("A preset named '{name}' already exists")]
    DuplicatePresetName {
        /// The rejected name
        name: String,
    },

    /// No preset matched the given id or name.
    #[error("Preset '{id}' not found")]
    PresetNotFound {
        /// Id or name that was looked up
        id: String,
    },

    /// Attempted to write to a scope that editors may not modify.
    #[error("Scope '{scope}' is read-only")]
    ReadOnlyScope {
        /// The rejected scope
        scope: Scope,
    },

    /// A project-bound scope or MCP source was addressed without a project.
    #[error("Scope '{scope}' requires a project path")]
    MissingProjectPath {
        /// The scope that needs a project
        scope: Scope,
    },

    /// A slider category name was not recognised.
    #[error("Unknown permission category '{name}'")]
    UnknownSliderCategory {
        /// The name as given
        name: String,
        /// Closest known category, if any is close enough
        suggestion: Option<String>,
    },

    /// The ccsettings configuration file is unusable.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// What went wrong
        message: String,
    },

    /// A check found error-severity issues.
    #[error("{count} error-severity issue(s) found")]
    IssuesFound {
        /// Number of error findings
        count: usize,
    },

    /// Standard I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Clone for SettingsError {
    fn clone(&self) -> Self {
        match self {
            Self::PresetParse {
                blob,
                reason,
            } => Self::PresetParse {
                blob: *blob,
                reason: reason.clone(),
            },
            Self::SettingsParse {
                path,
                reason,
            } => Self::SettingsParse {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::EmptyPresetName => Self::EmptyPresetName,
            Self::DuplicatePresetName {
                name,
            } => Self::DuplicatePresetName {
                name: name.clone(),
            },
            Self::PresetNotFound {
                id,
            } => Self::PresetNotFound {
                id: id.clone(),
            },
            Self::ReadOnlyScope {
                scope,
            } => Self::ReadOnlyScope {
                scope: *scope,
            },
            Self::MissingProjectPath {
                scope,
            } => Self::MissingProjectPath {
                scope: *scope,
            },
            Self::UnknownSliderCategory {
                name,
                suggestion,
            } => Self::UnknownSliderCategory {
                name: name.clone(),
                suggestion: suggestion.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::IssuesFound {
                count,
            } => Self::IssuesFound {
                count: *count,
            },
            // io::Error is not Clone; keep the kind and message
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
        }
    }
}

/// Error wrapper with a suggestion and details for CLI display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: SettingsError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: SettingsError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// Known [`SettingsError`] variants get tailored guidance. I/O errors get
/// filesystem guidance. Everything else is shown with its full context chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(settings_error) = error.downcast_ref::<SettingsError>() {
        return create_error_context(settings_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let context = ErrorContext::new(SettingsError::Io(std::io::Error::new(
            io_error.kind(),
            io_error.to_string(),
        )));
        return match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => context
                .with_suggestion("Check the ownership and permissions of the settings files"),
            std::io::ErrorKind::NotFound => {
                context.with_suggestion("Check that the file or directory exists")
            }
            _ => context,
        };
    }

    // Walk the chain for a typed error wrapped in context
    for cause in error.chain() {
        if let Some(settings_error) = cause.downcast_ref::<SettingsError>() {
            return create_error_context(settings_error.clone()).with_details(error.to_string());
        }
    }

    ErrorContext::new(SettingsError::ConfigError {
        message: format!("{error:#}"),
    })
}

fn create_error_context(error: SettingsError) -> ErrorContext {
    match &error {
        SettingsError::PresetParse {
            ..
        } => ErrorContext::new(error)
            .with_details("Nothing was written; both blobs must parse before any write is issued")
            .with_suggestion("Re-save the preset from a valid configuration"),
        SettingsError::SettingsParse {
            path,
            ..
        } => {
            let suggestion = format!("Fix the JSON syntax in {path} or remove the file");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        SettingsError::EmptyPresetName => {
            ErrorContext::new(error).with_suggestion("Provide a non-empty preset name")
        }
        SettingsError::DuplicatePresetName {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Choose a different name or update the existing preset"),
        SettingsError::PresetNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'ccsettings preset list' to see available presets"),
        SettingsError::ReadOnlyScope {
            ..
        } => ErrorContext::new(error)
            .with_details("Managed settings are controlled by an administrator")
            .with_suggestion("Target the user, project or local scope instead"),
        SettingsError::MissingProjectPath {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass --project <path> or run from inside the project"),
        SettingsError::UnknownSliderCategory {
            suggestion,
            ..
        } => {
            let hint = match suggestion {
                Some(s) => format!("Did you mean '{s}'?"),
                None => "Run 'ccsettings permissions show' to list categories".to_string(),
            };
            ErrorContext::new(error).with_suggestion(hint)
        }
        SettingsError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check ~/.ccsettings/config.toml or the path passed to --config"),
        SettingsError::IssuesFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'ccsettings check' for the recommendation of each finding"),
        SettingsError::Io(_) => ErrorContext::new(error),
    }
}
