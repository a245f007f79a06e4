//! Scoped settings documents and their effective merge.
//!
//! Claude Code reads `settings.json` from four independent scopes:
//!
//! | Scope     | File                                         | Shared?            |
//! |-----------|----------------------------------------------|--------------------|
//! | `managed` | platform managed-settings file               | admin controlled   |
//! | `local`   | `<project>/.claude/settings.local.json`      | private            |
//! | `project` | `<project>/.claude/settings.json`            | committed          |
//! | `user`    | `~/.claude/settings.json`                    | follows the user   |
//!
//! Each scope's document may be absent (`None`: the file does not exist) or
//! present but empty (`Some(SettingsDocument::default())`: the file exists
//! and has no keys). Both contribute nothing to the merge, but
//! [`ScopeDocuments::status`] keeps them apart for diagnostics.
//!
//! The merge itself lives in [`merge`].

pub mod merge;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::constants::SCOPE_PRECEDENCE;
use crate::mcp::ServerMap;

pub use merge::{MergedSettings, merge};

/// One of the four configuration layers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Per-user settings in the home directory
    User,
    /// Project settings shared through version control
    Project,
    /// Private per-project settings
    Local,
    /// Administrator-managed settings, read-only to editors
    Managed,
}

impl Scope {
    /// Position in [`SCOPE_PRECEDENCE`]; lower wins.
    #[must_use]
    pub fn precedence_rank(self) -> usize {
        SCOPE_PRECEDENCE.iter().position(|s| *s == self).unwrap_or(SCOPE_PRECEDENCE.len())
    }

    /// Whether editors and preset application may write to this scope.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        !matches!(self, Self::Managed)
    }

    /// Whether the scope's file is potentially shared or committed.
    #[must_use]
    pub const fn is_shared(self) -> bool {
        matches!(self, Self::User | Self::Project)
    }

    /// Whether locating this scope's file needs a project directory.
    #[must_use]
    pub const fn requires_project(self) -> bool {
        matches!(self, Self::Project | Self::Local)
    }

    /// Lowercase name as used in files and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Local => "local",
            Self::Managed => "managed",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission mode Claude Code starts in.
///
/// Modes added by newer Claude Code releases read as [`Other`](Self::Other)
/// and are written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefaultMode {
    /// Prompt on first use of each tool
    Default,
    /// Accept file edits without prompting
    AcceptEdits,
    /// Read-only planning mode
    Plan,
    /// Skip all permission prompts
    BypassPermissions,
    /// Deny anything not pre-approved
    DontAsk,
    /// Any other mode string
    #[serde(untagged)]
    Other(String),
}

/// The `permissions` block of a settings document.
///
/// `allow`, `deny` and `ask` hold patterns of the form `Tool` or
/// `Tool(argument-glob)`. Order is kept for display; membership is by
/// exact string equality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct PermissionsConfig {
    /// Patterns that run without prompting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,

    /// Patterns that are always refused
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,

    /// Patterns that always prompt
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ask: Vec<String>,

    /// Extra working directories the tools may access
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_directories: Vec<String>,

    /// Starting permission mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<DefaultMode>,

    /// Keys outside the known schema, preserved as-is
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl PermissionsConfig {
    /// True when no list has entries and no other key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty()
            && self.deny.is_empty()
            && self.ask.is_empty()
            && self.additional_directories.is_empty()
            && self.default_mode.is_none()
            && self.other.is_empty()
    }

    /// Remove repeated patterns from every list, keeping first occurrences.
    pub fn dedup(&mut self) {
        dedup_in_place(&mut self.allow);
        dedup_in_place(&mut self.deny);
        dedup_in_place(&mut self.ask);
        dedup_in_place(&mut self.additional_directories);
    }
}

impl From<Map<String, Value>> for PermissionsConfig {
    fn from(mut raw: Map<String, Value>) -> Self {
        Self {
            allow: take_typed(&mut raw, "allow").unwrap_or_default(),
            deny: take_typed(&mut raw, "deny").unwrap_or_default(),
            ask: take_typed(&mut raw, "ask").unwrap_or_default(),
            additional_directories: take_typed(&mut raw, "additionalDirectories")
                .unwrap_or_default(),
            default_mode: take_typed(&mut raw, "defaultMode"),
            other: raw,
        }
    }
}

/// Keys of [`PermissionsConfig`] that have a typed field.
pub(crate) const PERMISSION_KEYS: &[&str] =
    &["allow", "deny", "ask", "additionalDirectories", "defaultMode"];

/// Keys of [`SettingsDocument`] that have a typed field.
pub(crate) const DOCUMENT_KEYS: &[&str] = &[
    "model",
    "language",
    "permissions",
    "mcpServers",
    "hooks",
    "env",
    "attribution",
    "includeCoAuthoredBy",
    "cleanupPeriodDays",
    "alwaysThinkingEnabled",
    "outputStyle",
    "apiKeyHelper",
    "statusLine",
    "enableAllProjectMcpServers",
    "enabledMcpjsonServers",
    "disabledMcpjsonServers",
];

/// Move `key` out of `raw` when its value fits `T`.
///
/// A value of the wrong shape stays in `raw`, so it is carried along with
/// the unknown keys and written back verbatim. `null` reads as absent.
pub(crate) fn take_typed<T: DeserializeOwned>(raw: &mut Map<String, Value>, key: &str) -> Option<T> {
    let parsed = serde_json::from_value::<Option<T>>(raw.get(key)?.clone()).ok()?;
    raw.remove(key);
    parsed
}

/// Remove repeated entries while keeping the first occurrence of each.
pub(crate) fn dedup_in_place(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

/// A sparse settings document from one scope.
///
/// Every known field is optional. Keys outside the known schema land in
/// [`other`](Self::other) so that a document survives a merge or a
/// save/load cycle without losing user data. So does a known key whose value
/// has an unexpected shape: one odd value never makes the rest of the file
/// unreadable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct SettingsDocument {
    /// Model override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Preferred response language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Permission rules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionsConfig>,

    /// MCP servers embedded in a settings file (legacy location)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<ServerMap>,

    /// Hook configuration keyed by event name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hooks: Option<Map<String, Value>>,

    /// Environment variables for tool processes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Map<String, Value>>,

    /// Commit and PR attribution settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribution: Option<Value>,

    /// Whether commits get a co-authored-by trailer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_co_authored_by: Option<bool>,

    /// Days to keep chat transcripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_period_days: Option<u32>,

    /// Extended thinking on by default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_thinking_enabled: Option<bool>,

    /// Output style name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_style: Option<String>,

    /// Script that prints an API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_helper: Option<String>,

    /// Status line command configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_line: Option<Value>,

    /// Auto-approve every server in the project's `.mcp.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_all_project_mcp_servers: Option<bool>,

    /// Approved `.mcp.json` servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_mcpjson_servers: Option<Vec<String>>,

    /// Rejected `.mcp.json` servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_mcpjson_servers: Option<Vec<String>>,

    /// Keys outside the known schema, preserved as-is
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl From<Map<String, Value>> for SettingsDocument {
    fn from(mut raw: Map<String, Value>) -> Self {
        Self {
            model: take_typed(&mut raw, "model"),
            language: take_typed(&mut raw, "language"),
            permissions: take_typed(&mut raw, "permissions"),
            mcp_servers: take_typed(&mut raw, "mcpServers"),
            hooks: take_typed(&mut raw, "hooks"),
            env: take_typed(&mut raw, "env"),
            attribution: take_typed(&mut raw, "attribution"),
            include_co_authored_by: take_typed(&mut raw, "includeCoAuthoredBy"),
            cleanup_period_days: take_typed(&mut raw, "cleanupPeriodDays"),
            always_thinking_enabled: take_typed(&mut raw, "alwaysThinkingEnabled"),
            output_style: take_typed(&mut raw, "outputStyle"),
            api_key_helper: take_typed(&mut raw, "apiKeyHelper"),
            status_line: take_typed(&mut raw, "statusLine"),
            enable_all_project_mcp_servers: take_typed(&mut raw, "enableAllProjectMcpServers"),
            enabled_mcpjson_servers: take_typed(&mut raw, "enabledMcpjsonServers"),
            disabled_mcpjson_servers: take_typed(&mut raw, "disabledMcpjsonServers"),
            other: raw,
        }
    }
}

impl SettingsDocument {
    /// Number of top-level keys present in the document.
    #[must_use]
    pub fn content_count(&self) -> usize {
        let known = [
            self.model.is_some(),
            self.language.is_some(),
            self.permissions.is_some(),
            self.mcp_servers.is_some(),
            self.hooks.is_some(),
            self.env.is_some(),
            self.attribution.is_some(),
            self.include_co_authored_by.is_some(),
            self.cleanup_period_days.is_some(),
            self.always_thinking_enabled.is_some(),
            self.output_style.is_some(),
            self.api_key_helper.is_some(),
            self.status_line.is_some(),
            self.enable_all_project_mcp_servers.is_some(),
            self.enabled_mcpjson_servers.is_some(),
            self.disabled_mcpjson_servers.is_some(),
        ];
        known.iter().filter(|present| **present).count() + self.other.len()
    }

    /// True when the document has no keys at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content_count() == 0
    }

    /// MCP servers embedded in this document, if any are declared.
    #[must_use]
    pub fn embedded_mcp_servers(&self) -> Option<&ServerMap> {
        self.mcp_servers.as_ref().filter(|servers| !servers.is_empty())
    }
}

/// Whether a scope's file exists and how many keys it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeStatus {
    /// The scope described
    pub scope: Scope,
    /// Whether the scope's file exists
    pub exists: bool,
    /// Number of top-level keys; zero when missing or unparsable
    pub content_count: usize,
}

impl ScopeStatus {
    /// The file exists but contributes nothing.
    #[must_use]
    pub const fn is_empty_file(&self) -> bool {
        self.exists && self.content_count == 0
    }
}

/// The raw documents of all four scopes, as supplied for one computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeDocuments {
    /// `~/.claude/settings.json`
    pub user: Option<SettingsDocument>,
    /// `<project>/.claude/settings.json`
    pub project: Option<SettingsDocument>,
    /// `<project>/.claude/settings.local.json`
    pub local: Option<SettingsDocument>,
    /// Managed settings file
    pub managed: Option<SettingsDocument>,
}

impl ScopeDocuments {
    /// Document of a scope, or `None` when its file does not exist.
    #[must_use]
    pub const fn get(&self, scope: Scope) -> Option<&SettingsDocument> {
        match scope {
            Scope::User => self.user.as_ref(),
            Scope::Project => self.project.as_ref(),
            Scope::Local => self.local.as_ref(),
            Scope::Managed => self.managed.as_ref(),
        }
    }

    /// Replace the document of a scope.
    pub fn set(&mut self, scope: Scope, document: Option<SettingsDocument>) {
        match scope {
            Scope::User => self.user = document,
            Scope::Project => self.project = document,
            Scope::Local => self.local = document,
            Scope::Managed => self.managed = document,
        }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, scope: Scope, document: SettingsDocument) -> Self {
        self.set(scope, Some(document));
        self
    }

    /// Present documents, highest precedence first.
    pub fn in_precedence_order(&self) -> impl Iterator<Item = (Scope, &SettingsDocument)> {
        SCOPE_PRECEDENCE.into_iter().filter_map(move |scope| self.get(scope).map(|doc| (scope, doc)))
    }

    /// Existence and size of one scope's document.
    #[must_use]
    pub fn status(&self, scope: Scope) -> ScopeStatus {
        let document = self.get(scope);
        ScopeStatus {
            scope,
            exists: document.is_some(),
            content_count: document.map_or(0, SettingsDocument::content_count),
        }
    }

    /// Status of every scope in precedence order.
    #[must_use]
    pub fn statuses(&self) -> Vec<ScopeStatus> {
        SCOPE_PRECEDENCE.into_iter().map(|scope| self.status(scope)).collect()
    }
}
