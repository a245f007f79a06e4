//! Diagnostic findings about the combined configuration.
//!
//! A [`SettingsIssue`] is a plain value. It carries message keys and
//! parameters rather than text so that presentation stays with the caller.
//! Findings never block merging; even `error` severity only marks a state
//! that is almost certainly unintended.

pub mod detector;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::settings::Scope;

pub use detector::detect;

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Contradictory configuration
    Error,
    /// Risky or misplaced configuration
    Warning,
    /// Worth knowing, harmless
    Info,
}

impl IssueSeverity {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which check produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueType {
    /// MCP servers declared inside a settings file
    McpInSettings,
    /// One pattern both allowed and denied
    AllowDenyConflict,
    /// One MCP server name in several sources
    McpNameConflict,
    /// Credential-like environment variable in a shared scope
    SensitiveEnv,
    /// One pattern both allowed and asked
    AllowAskOverlap,
    /// `bypassPermissions` set in a shared scope
    BypassPermissionsShared,
}

impl IssueType {
    /// camelCase identifier, also the stem of the message keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::McpInSettings => "mcpInSettings",
            Self::AllowDenyConflict => "allowDenyConflict",
            Self::McpNameConflict => "mcpNameConflict",
            Self::SensitiveEnv => "sensitiveEnv",
            Self::AllowAskOverlap => "allowAskOverlap",
            Self::BypassPermissionsShared => "bypassPermissionsShared",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsIssue {
    /// Stable identifier, unique within one detection run
    pub id: String,
    /// Producing check
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// How serious the finding is
    pub severity: IssueSeverity,
    /// Scopes involved, highest precedence first
    pub affected_scopes: Vec<Scope>,
    /// Message key for the title
    pub title_key: String,
    /// Message key for the description
    pub description_key: String,
    /// Values to interpolate into the description
    pub description_params: BTreeMap<String, String>,
    /// Message key for the recommended fix
    pub recommendation_key: String,
}

impl SettingsIssue {
    /// A finding with message keys derived from its type.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        issue_type: IssueType,
        severity: IssueSeverity,
        affected_scopes: Vec<Scope>,
    ) -> Self {
        let stem = format!("issues.{}", issue_type.as_str());
        Self {
            id: id.into(),
            issue_type,
            severity,
            affected_scopes,
            title_key: format!("{stem}.title"),
            description_key: format!("{stem}.description"),
            description_params: BTreeMap::new(),
            recommendation_key: format!("{stem}.recommendation"),
        }
    }

    /// Add a description parameter.
    #[must_use]
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.description_params.insert(key.to_string(), value.into());
        self
    }

    /// Render the description in English from the parameters.
    ///
    /// Used by the CLI; callers with their own message catalog use the keys.
    #[must_use]
    pub fn describe(&self) -> String {
        let param = |key: &str| self.description_params.get(key).map_or("", String::as_str);
        match self.issue_type {
            IssueType::McpInSettings => format!(
                "MCP servers ({}) are declared inside settings.json; move them to a .mcp.json file",
                param("servers")
            ),
            IssueType::AllowDenyConflict => format!(
                "'{}' is both allowed and denied; deny wins at runtime",
                param("pattern")
            ),
            IssueType::McpNameConflict => format!(
                "MCP server '{}' is defined in several sources: {}",
                param("name"),
                param("sources")
            ),
            IssueType::SensitiveEnv => format!(
                "Environment variable '{}' looks like a credential and is stored in a shared scope",
                param("key")
            ),
            IssueType::AllowAskOverlap => format!(
                "'{}' is both allowed and set to ask; allow takes effect",
                param("pattern")
            ),
            IssueType::BypassPermissionsShared => {
                "defaultMode 'bypassPermissions' is set in a shared scope".to_string()
            }
        }
    }
}

/// Whether any finding has `error` severity.
#[must_use]
pub fn has_errors(issues: &[SettingsIssue]) -> bool {
    issues.iter().any(|issue| issue.severity == IssueSeverity::Error)
}
