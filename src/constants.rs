//! Global constants used throughout the ccsettings codebase.
//!
//! Orderings that several components depend on are defined here exactly
//! once. The merger, the issue detector and the preset target mapping all
//! read [`SCOPE_PRECEDENCE`]; the MCP resolver reads
//! [`MCP_SOURCE_EVALUATION_ORDER`]. Neither list may be reordered.

use crate::mcp::McpSource;
use crate::settings::Scope;

/// Scope precedence, highest first.
///
/// The first scope in this list that supplies a first-wins field is the
/// one whose value becomes effective. Union fields are also concatenated
/// in this order, which keeps merged arrays stable for display.
pub const SCOPE_PRECEDENCE: [Scope; 4] = [Scope::Managed, Scope::Local, Scope::Project, Scope::User];

/// Fixed order in which MCP sources are flattened.
///
/// Sources carry no precedence relative to each other. This order only
/// breaks display ties between copies of the same server name.
pub const MCP_SOURCE_EVALUATION_ORDER: [McpSource; 5] = [
    McpSource::UserClaudeJson,
    McpSource::LocalClaudeJson,
    McpSource::UserSettings,
    McpSource::UserMcp,
    McpSource::ProjectMcp,
];

/// Case-insensitive substrings that mark an environment variable name as
/// likely to hold a credential.
pub const SENSITIVE_ENV_MARKERS: [&str; 4] = ["key", "token", "secret", "password"];

/// Settings file name inside a `.claude` directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Private per-project settings file name inside `<project>/.claude`.
pub const LOCAL_SETTINGS_FILE: &str = "settings.local.json";

/// Dedicated MCP server file name.
pub const MCP_FILE: &str = ".mcp.json";

/// Directory holding Claude Code configuration inside a project or home.
pub const CLAUDE_DIR: &str = ".claude";

/// Global Claude Code state file in the user's home directory.
pub const CLAUDE_JSON_FILE: &str = ".claude.json";

/// JSON key under which MCP servers are stored in every file format.
pub const MCP_SERVERS_KEY: &str = "mcpServers";

/// JSON key of the per-project table inside `~/.claude.json`.
pub const PROJECTS_KEY: &str = "projects";

/// Directory name for ccsettings' own files under the home directory.
pub const APP_DIR: &str = ".ccsettings";

/// Suffix appended to a duplicated preset's name.
pub const PRESET_COPY_SUFFIX: &str = " (copy)";
