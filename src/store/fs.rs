//! Filesystem [`SettingsStore`] over the conventional Claude Code locations.
//!
//! | Location            | Path                                          |
//! |---------------------|-----------------------------------------------|
//! | `user`              | `<claude_home>/settings.json`                 |
//! | `project`           | `<project>/.claude/settings.json`             |
//! | `local`             | `<project>/.claude/settings.local.json`       |
//! | `managed`           | managed settings file (read-only)             |
//! | `user_claude_json`  | `<claude_json>` → `mcpServers`                |
//! | `local_claude_json` | `<claude_json>` → `projects[<project>].mcpServers` |
//! | `user_settings`     | `<claude_home>/settings.json` → `mcpServers`  |
//! | `user_mcp`          | `<claude_home>/.mcp.json`                     |
//! | `project_mcp`       | `<project>/.mcp.json`                         |
//!
//! `~/.claude.json` holds much more than MCP servers, so writes to it edit
//! only the relevant key and leave every other key in place.
//!
//! File I/O runs on the blocking thread pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{SettingsStore, check_writable, require_project, require_source_project};
use crate::constants::{
    CLAUDE_DIR, LOCAL_SETTINGS_FILE, MCP_FILE, MCP_SERVERS_KEY, PROJECTS_KEY, SETTINGS_FILE,
};
use crate::core::SettingsError;
use crate::mcp::{McpConfigFile, McpSource, ServerMap};
use crate::settings::{Scope, SettingsDocument};
use crate::utils::{project_key, read_json_file, write_json_file};

/// Resolved locations of the user-level files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Claude Code home directory, normally `~/.claude`
    pub claude_home: PathBuf,
    /// Global state file, normally `~/.claude.json`
    pub claude_json: PathBuf,
    /// Managed settings file, if the platform has one
    pub managed_settings: Option<PathBuf>,
}

impl StorePaths {
    /// Paths rooted at a home directory, without a managed file.
    ///
    /// Mostly useful for tests that work inside a temporary directory.
    #[must_use]
    pub fn under_home(home: &Path) -> Self {
        Self {
            claude_home: home.join(CLAUDE_DIR),
            claude_json: home.join(crate::constants::CLAUDE_JSON_FILE),
            managed_settings: None,
        }
    }
}

/// Settings store reading and writing the real files.
#[derive(Debug, Clone)]
pub struct FsSettingsStore {
    paths: StorePaths,
}

impl FsSettingsStore {
    /// Store over the given locations.
    #[must_use]
    pub const fn new(paths: StorePaths) -> Self {
        Self {
            paths,
        }
    }

    /// The configured locations.
    #[must_use]
    pub const fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// File holding a scope's settings, or `None` when the scope has none.
    pub fn settings_path(&self, scope: Scope, project: Option<&Path>) -> Result<Option<PathBuf>> {
        let project = require_project(scope, project)?;
        Ok(match (scope, project) {
            (Scope::User, _) => Some(self.paths.claude_home.join(SETTINGS_FILE)),
            (Scope::Project, Some(p)) => Some(p.join(CLAUDE_DIR).join(SETTINGS_FILE)),
            (Scope::Local, Some(p)) => Some(p.join(CLAUDE_DIR).join(LOCAL_SETTINGS_FILE)),
            (Scope::Managed, _) => self.paths.managed_settings.clone(),
            (Scope::Project | Scope::Local, None) => None,
        })
    }

    /// File holding an MCP source.
    pub fn mcp_path(&self, source: McpSource, project: Option<&Path>) -> Result<PathBuf> {
        require_source_project(source, project)?;
        Ok(match (source, project) {
            (McpSource::UserClaudeJson | McpSource::LocalClaudeJson, _) => {
                self.paths.claude_json.clone()
            }
            (McpSource::UserSettings, _) => self.paths.claude_home.join(SETTINGS_FILE),
            (McpSource::UserMcp, _) => self.paths.claude_home.join(MCP_FILE),
            (McpSource::ProjectMcp, Some(p)) => p.join(MCP_FILE),
            (McpSource::ProjectMcp, None) => {
                return Err(SettingsError::MissingProjectPath {
                    scope: Scope::Project,
                }
                .into());
            }
        })
    }
}

async fn blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task).await.context("File I/O task panicked")?
}

/// Read a JSON file that must hold an object. `None` when missing.
fn read_object(path: &Path) -> Result<Option<Map<String, Value>>> {
    match read_json_file::<Value>(path)? {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(SettingsError::SettingsParse {
            path: path.display().to_string(),
            reason: "expected a JSON object".to_string(),
        }
        .into()),
    }
}

fn servers_from(value: Option<&Value>, path: &Path) -> Result<Option<ServerMap>> {
    value
        .map(|v| {
            serde_json::from_value::<ServerMap>(v.clone()).map_err(|e| {
                SettingsError::SettingsParse {
                    path: path.display().to_string(),
                    reason: format!("invalid {MCP_SERVERS_KEY}: {e}"),
                }
                .into()
            })
        })
        .transpose()
}

/// Rewrite one object file, creating it if missing.
fn edit_object<F>(path: &Path, edit: F) -> Result<()>
where
    F: FnOnce(&mut Map<String, Value>) -> Result<()>,
{
    let mut root = read_object(path)?.unwrap_or_default();
    edit(&mut root)?;
    write_json_file(path, &root)
}

fn load_mcp_blocking(
    source: McpSource,
    path: &Path,
    project: Option<&Path>,
) -> Result<Option<ServerMap>> {
    match source {
        McpSource::UserClaudeJson | McpSource::UserSettings => {
            let Some(root) = read_object(path)? else {
                return Ok(None);
            };
            servers_from(root.get(MCP_SERVERS_KEY), path)
        }
        McpSource::LocalClaudeJson => {
            let Some(root) = read_object(path)? else {
                return Ok(None);
            };
            let key = project.map(project_key).unwrap_or_default();
            let entry = root
                .get(PROJECTS_KEY)
                .and_then(|projects| projects.get(&key))
                .and_then(|project| project.get(MCP_SERVERS_KEY));
            servers_from(entry, path)
        }
        McpSource::UserMcp | McpSource::ProjectMcp => {
            Ok(read_json_file::<McpConfigFile>(path)?.map(|file| file.mcp_servers))
        }
    }
}

fn save_mcp_blocking(
    source: McpSource,
    path: &Path,
    project: Option<&Path>,
    servers: ServerMap,
) -> Result<()> {
    let value = serde_json::to_value(&servers).context("Failed to serialize MCP servers")?;

    match source {
        McpSource::UserClaudeJson | McpSource::UserSettings => edit_object(path, |root| {
            root.insert(MCP_SERVERS_KEY.to_string(), value);
            Ok(())
        }),
        McpSource::LocalClaudeJson => {
            let key = project.map(project_key).unwrap_or_default();
            edit_object(path, |root| {
                let projects = root
                    .entry(PROJECTS_KEY)
                    .or_insert_with(|| Value::Object(Map::new()))
                    .as_object_mut()
                    .ok_or_else(|| anyhow::anyhow!("'{PROJECTS_KEY}' is not an object"))?;
                let entry = projects
                    .entry(key)
                    .or_insert_with(|| Value::Object(Map::new()))
                    .as_object_mut()
                    .ok_or_else(|| anyhow::anyhow!("project entry is not an object"))?;
                entry.insert(MCP_SERVERS_KEY.to_string(), value);
                Ok(())
            })
        }
        McpSource::UserMcp | McpSource::ProjectMcp => {
            let mut file = read_json_file::<McpConfigFile>(path)?.unwrap_or_default();
            file.mcp_servers = servers;
            write_json_file(path, &file)
        }
    }
}

#[async_trait]
impl SettingsStore for FsSettingsStore {
    async fn load(&self, scope: Scope, project: Option<&Path>) -> Result<Option<SettingsDocument>> {
        let Some(path) = self.settings_path(scope, project)? else {
            return Ok(None);
        };
        debug!("Loading {scope} settings from {}", path.display());
        blocking(move || read_json_file::<SettingsDocument>(&path)).await
    }

    async fn save(
        &self,
        scope: Scope,
        document: &SettingsDocument,
        project: Option<&Path>,
    ) -> Result<()> {
        check_writable(scope, project)?;
        let Some(path) = self.settings_path(scope, project)? else {
            return Err(SettingsError::ReadOnlyScope {
                scope,
            }
            .into());
        };
        debug!("Writing {scope} settings to {}", path.display());
        let document = document.clone();
        blocking(move || write_json_file(&path, &document))
            .await
            .with_context(|| format!("Failed to save {scope} settings"))
    }

    async fn load_mcp(
        &self,
        source: McpSource,
        project: Option<&Path>,
    ) -> Result<Option<ServerMap>> {
        let path = self.mcp_path(source, project)?;
        debug!("Loading MCP source {source} from {}", path.display());
        let project = project.map(Path::to_path_buf);
        blocking(move || load_mcp_blocking(source, &path, project.as_deref())).await
    }

    async fn save_mcp(
        &self,
        source: McpSource,
        servers: &ServerMap,
        project: Option<&Path>,
    ) -> Result<()> {
        let path = self.mcp_path(source, project)?;
        debug!("Writing {} MCP servers to {source} at {}", servers.len(), path.display());
        let project = project.map(Path::to_path_buf);
        let servers = servers.clone();
        blocking(move || save_mcp_blocking(source, &path, project.as_deref(), servers))
            .await
            .with_context(|| format!("Failed to save MCP source {source}"))
    }
}
