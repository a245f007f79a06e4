//! MCP (Model Context Protocol) server definitions and where they live.
//!
//! Claude Code picks up MCP servers from five places:
//!
//! | Source              | Location                                        | Scope   |
//! |---------------------|-------------------------------------------------|---------|
//! | `user_claude_json`  | `~/.claude.json` → `mcpServers`                 | user    |
//! | `local_claude_json` | `~/.claude.json` → `projects[<path>].mcpServers`| local   |
//! | `user_settings`     | `~/.claude/settings.json` → `mcpServers`        | user    |
//! | `user_mcp`          | `~/.claude/.mcp.json`                           | user    |
//! | `project_mcp`       | `<project>/.mcp.json`                           | project |
//!
//! Sources are not ordered by precedence against each other. The same server
//! name appearing in two sources is a conflict, reported by [`resolver`].

pub mod resolver;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::MCP_SOURCE_EVALUATION_ORDER;
use crate::settings::{Scope, take_typed};

pub use resolver::{McpResolution, UnifiedServer, resolve};

/// Server name → configuration.
pub type ServerMap = BTreeMap<String, McpServerConfig>;

/// The on-disk shape of a dedicated MCP file (`.mcp.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpConfigFile {
    /// Map of server names to their configurations
    #[serde(rename = "mcpServers", default)]
    pub mcp_servers: ServerMap,

    /// Other keys preserved from the original file
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Individual MCP server configuration.
///
/// Either a process descriptor (`command`, `args`, `env`) or a remote
/// descriptor (`type`, `url`, `headers`). Identity is the map key the
/// server is stored under, never its content. A known key with a value of
/// the wrong shape is kept in [`other`](Self::other).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct McpServerConfig {
    /// The command to execute to start the server (process servers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Arguments to pass to the command (process servers)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment variables to set when running the server (process servers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, Value>>,

    /// Transport type (remote servers), e.g. `http` or `sse`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    /// Server URL (remote servers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// HTTP headers (remote servers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, Value>>,

    /// Other keys preserved from the original entry
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl From<Map<String, Value>> for McpServerConfig {
    fn from(mut raw: Map<String, Value>) -> Self {
        Self {
            command: take_typed(&mut raw, "command"),
            args: take_typed(&mut raw, "args").unwrap_or_default(),
            env: take_typed(&mut raw, "env"),
            r#type: take_typed(&mut raw, "type"),
            url: take_typed(&mut raw, "url"),
            headers: take_typed(&mut raw, "headers"),
            other: raw,
        }
    }
}

/// How a server is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpTransport {
    /// Local process started from `command`
    Process,
    /// Remote endpoint at `url`
    Remote,
    /// Neither a command nor a URL is set
    Unknown,
}

impl McpServerConfig {
    /// Process descriptor.
    pub fn process(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: Some(command.into()),
            args,
            ..Default::default()
        }
    }

    /// Remote descriptor.
    pub fn remote(transport: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            r#type: Some(transport.into()),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Classify the descriptor.
    #[must_use]
    pub const fn transport(&self) -> McpTransport {
        if self.command.is_some() {
            McpTransport::Process
        } else if self.url.is_some() {
            McpTransport::Remote
        } else {
            McpTransport::Unknown
        }
    }

    /// Short human-readable description: the command line or the URL.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.transport() {
            McpTransport::Process => {
                let mut parts = vec![self.command.clone().unwrap_or_default()];
                parts.extend(self.args.iter().cloned());
                parts.join(" ")
            }
            McpTransport::Remote => format!(
                "{} ({})",
                self.url.as_deref().unwrap_or_default(),
                self.r#type.as_deref().unwrap_or("http")
            ),
            McpTransport::Unknown => "<no command or url>".to_string(),
        }
    }
}

/// One of the five storage locations for MCP servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpSource {
    /// `~/.claude.json` top-level `mcpServers`
    UserClaudeJson,
    /// `~/.claude.json` per-project `mcpServers`
    LocalClaudeJson,
    /// `mcpServers` inside the user `settings.json` (legacy)
    UserSettings,
    /// `~/.claude/.mcp.json`
    UserMcp,
    /// `<project>/.mcp.json`
    ProjectMcp,
}

impl McpSource {
    /// Scope this source is displayed under.
    #[must_use]
    pub const fn scope(self) -> Scope {
        match self {
            Self::UserClaudeJson | Self::UserSettings | Self::UserMcp => Scope::User,
            Self::LocalClaudeJson => Scope::Local,
            Self::ProjectMcp => Scope::Project,
        }
    }

    /// The source presets write to when targeting a scope.
    ///
    /// `managed` has no writable source.
    #[must_use]
    pub const fn canonical_for(scope: Scope) -> Option<Self> {
        match scope {
            Scope::User => Some(Self::UserClaudeJson),
            Scope::Project => Some(Self::ProjectMcp),
            Scope::Local => Some(Self::LocalClaudeJson),
            Scope::Managed => None,
        }
    }

    /// Whether locating this source needs a project directory.
    #[must_use]
    pub const fn requires_project(self) -> bool {
        matches!(self, Self::LocalClaudeJson | Self::ProjectMcp)
    }

    /// Snake-case identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserClaudeJson => "user_claude_json",
            Self::LocalClaudeJson => "local_claude_json",
            Self::UserSettings => "user_settings",
            Self::UserMcp => "user_mcp",
            Self::ProjectMcp => "project_mcp",
        }
    }
}

impl fmt::Display for McpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server maps from all five sources. `None` means the location is absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct McpSources {
    /// `~/.claude.json` top level
    pub user_claude_json: Option<ServerMap>,
    /// `~/.claude.json` per project
    pub local_claude_json: Option<ServerMap>,
    /// User `settings.json`
    pub user_settings: Option<ServerMap>,
    /// `~/.claude/.mcp.json`
    pub user_mcp: Option<ServerMap>,
    /// `<project>/.mcp.json`
    pub project_mcp: Option<ServerMap>,
}

impl McpSources {
    /// Servers declared in a source.
    #[must_use]
    pub const fn get(&self, source: McpSource) -> Option<&ServerMap> {
        match source {
            McpSource::UserClaudeJson => self.user_claude_json.as_ref(),
            McpSource::LocalClaudeJson => self.local_claude_json.as_ref(),
            McpSource::UserSettings => self.user_settings.as_ref(),
            McpSource::UserMcp => self.user_mcp.as_ref(),
            McpSource::ProjectMcp => self.project_mcp.as_ref(),
        }
    }

    /// Replace the servers of a source.
    pub fn set(&mut self, source: McpSource, servers: Option<ServerMap>) {
        match source {
            McpSource::UserClaudeJson => self.user_claude_json = servers,
            McpSource::LocalClaudeJson => self.local_claude_json = servers,
            McpSource::UserSettings => self.user_settings = servers,
            McpSource::UserMcp => self.user_mcp = servers,
            McpSource::ProjectMcp => self.project_mcp = servers,
        }
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, source: McpSource, servers: ServerMap) -> Self {
        self.set(source, Some(servers));
        self
    }

    /// Every `(source, name, config)` triple in evaluation order.
    pub fn entries(&self) -> impl Iterator<Item = (McpSource, &String, &McpServerConfig)> {
        MCP_SOURCE_EVALUATION_ORDER.into_iter().flat_map(move |source| {
            self.get(source)
                .into_iter()
                .flat_map(move |servers| servers.iter().map(move |(n, c)| (source, n, c)))
        })
    }

    /// Total number of server entries across all sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    /// True when no source declares any server.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_config_roundtrips_extra_fields() {
        let config: McpServerConfig = serde_json::from_value(json!({
            "command": "npx",
            "args": ["-y", "@modelcontextprotocol/server-filesystem"],
            "env": {"ROOT": "/tmp"},
            "timeout": 3000
        }))
        .unwrap();

        assert_eq!(config.transport(), McpTransport::Process);
        assert_eq!(config.describe(), "npx -y @modelcontextprotocol/server-filesystem");
        assert_eq!(config.other.get("timeout"), Some(&json!(3000)));

        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back["timeout"], json!(3000));
        assert!(back.get("url").is_none());
    }

    #[test]
    fn test_server_config_keeps_mistyped_args() {
        let raw = json!({"command": "uvx", "args": "mcp-server-git", "env": {"A": "1"}});
        let config: McpServerConfig = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(config.command.as_deref(), Some("uvx"));
        assert!(config.args.is_empty());
        assert_eq!(config.other["args"], json!("mcp-server-git"));
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }

    #[test]
    fn test_remote_descriptor() {
        let config: McpServerConfig =
            serde_json::from_value(json!({"type": "sse", "url": "https://mcp.example.com/sse"}))
                .unwrap();
        assert_eq!(config.transport(), McpTransport::Remote);
        assert_eq!(config.describe(), "https://mcp.example.com/sse (sse)");
        assert_eq!(McpServerConfig::default().transport(), McpTransport::Unknown);
    }

    #[test]
    fn test_source_scope_mapping() {
        assert_eq!(McpSource::UserSettings.scope(), Scope::User);
        assert_eq!(McpSource::ProjectMcp.scope(), Scope::Project);
        assert_eq!(McpSource::LocalClaudeJson.scope(), Scope::Local);
        assert_eq!(McpSource::canonical_for(Scope::User), Some(McpSource::UserClaudeJson));
        assert_eq!(McpSource::canonical_for(Scope::Project), Some(McpSource::ProjectMcp));
        assert_eq!(McpSource::canonical_for(Scope::Local), Some(McpSource::LocalClaudeJson));
        assert_eq!(McpSource::canonical_for(Scope::Managed), None);
        assert_eq!(serde_json::to_value(McpSource::UserMcp).unwrap(), json!("user_mcp"));
    }

    #[test]
    fn test_entries_follow_evaluation_order() {
        let mut project = ServerMap::new();
        project.insert("b".to_string(), McpServerConfig::process("b", vec![]));
        let mut user = ServerMap::new();
        user.insert("a".to_string(), McpServerConfig::process("a", vec![]));

        let sources = McpSources::default()
            .with(McpSource::ProjectMcp, project)
            .with(McpSource::UserClaudeJson, user);

        let order: Vec<McpSource> = sources.entries().map(|(s, _, _)| s).collect();
        assert_eq!(order, vec![McpSource::UserClaudeJson, McpSource::ProjectMcp]);
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn test_mcp_file_shape() {
        let file: McpConfigFile = serde_json::from_value(json!({
            "mcpServers": {"fs": {"command": "fs"}},
            "$schema": "x"
        }))
        .unwrap();
        assert!(file.mcp_servers.contains_key("fs"));
        assert!(file.other.contains_key("$schema"));

        let empty: McpConfigFile = serde_json::from_value(json!({})).unwrap();
        assert!(empty.mcp_servers.is_empty());
    }
}
