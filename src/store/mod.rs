//! Persistence of scope documents and MCP server maps.
//!
//! The resolution core never touches the filesystem. Everything it needs is
//! loaded through a [`SettingsStore`] into a [`ScopeSnapshot`], and preset
//! application writes back through the same trait.
//!
//! - [`FsSettingsStore`] - the conventional Claude Code file locations
//! - [`MemorySettingsStore`] - in-memory documents with a write log
//!
//! Store errors are returned unchanged; nothing here retries.

pub mod fs;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::SettingsError;
use crate::issues::{self, SettingsIssue};
use crate::mcp::{self, McpResolution, McpSource, McpSources, ServerMap};
use crate::settings::{self, MergedSettings, Scope, ScopeDocuments, SettingsDocument};

pub use fs::{FsSettingsStore, StorePaths};
pub use memory::{MemorySettingsStore, StoreWrite};

/// Load and save scope documents and MCP server maps.
///
/// `None` from a load means the location does not exist, which is distinct
/// from an existing but empty document.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the settings document of a scope.
    async fn load(&self, scope: Scope, project: Option<&Path>) -> Result<Option<SettingsDocument>>;

    /// Replace the settings document of a scope.
    async fn save(
        &self,
        scope: Scope,
        document: &SettingsDocument,
        project: Option<&Path>,
    ) -> Result<()>;

    /// Load the server map of an MCP source.
    async fn load_mcp(
        &self,
        source: McpSource,
        project: Option<&Path>,
    ) -> Result<Option<ServerMap>>;

    /// Replace the server map of an MCP source.
    async fn save_mcp(
        &self,
        source: McpSource,
        servers: &ServerMap,
        project: Option<&Path>,
    ) -> Result<()>;
}

/// Reject writes that no store may perform.
pub(crate) fn check_writable(scope: Scope, project: Option<&Path>) -> Result<(), SettingsError> {
    if !scope.is_editable() {
        return Err(SettingsError::ReadOnlyScope {
            scope,
        });
    }
    require_project(scope, project).map(|_| ())
}

/// The project path, if the scope needs one.
pub(crate) fn require_project(
    scope: Scope,
    project: Option<&Path>,
) -> Result<Option<&Path>, SettingsError> {
    match (scope.requires_project(), project) {
        (true, None) => Err(SettingsError::MissingProjectPath {
            scope,
        }),
        (true, Some(path)) => Ok(Some(path)),
        (false, _) => Ok(None),
    }
}

/// Fail when a project-bound MCP source is addressed without a project.
pub(crate) fn require_source_project(
    source: McpSource,
    project: Option<&Path>,
) -> Result<(), SettingsError> {
    if source.requires_project() && project.is_none() {
        return Err(SettingsError::MissingProjectPath {
            scope: source.scope(),
        });
    }
    Ok(())
}

/// A scope or MCP source that could not be parsed while loading a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnreadableLocation {
    /// A scope's settings file
    Scope(Scope),
    /// An MCP source
    Mcp(McpSource),
}

/// Everything loaded for one computation.
#[derive(Debug, Clone, Default)]
pub struct ScopeSnapshot {
    /// Project the project-bound scopes and sources were read from
    pub project: Option<PathBuf>,
    /// The four scope documents
    pub documents: ScopeDocuments,
    /// The five MCP source maps
    pub mcp: McpSources,
    /// Locations whose content failed to parse, with the parser message
    pub unreadable: Vec<(UnreadableLocation, String)>,
}

impl ScopeSnapshot {
    /// Load all scope documents and MCP sources.
    ///
    /// Project-bound locations are skipped when `project` is `None`. A
    /// document that fails to parse is logged and loaded as an existing,
    /// empty document; any other store error is returned.
    pub async fn load<S>(store: &S, project: Option<&Path>) -> Result<Self>
    where
        S: SettingsStore + ?Sized,
    {
        let mut snapshot = Self {
            project: project.map(Path::to_path_buf),
            ..Self::default()
        };

        for scope in crate::constants::SCOPE_PRECEDENCE {
            if scope.requires_project() && project.is_none() {
                continue;
            }
            let document = match store.load(scope, project).await {
                Ok(document) => document,
                Err(error) => match parse_failure(&error) {
                    Some(reason) => {
                        warn!("Ignoring unparsable {scope} settings: {reason}");
                        snapshot.unreadable.push((UnreadableLocation::Scope(scope), reason));
                        Some(SettingsDocument::default())
                    }
                    None => return Err(error),
                },
            };
            snapshot.documents.set(scope, document);
        }

        for source in crate::constants::MCP_SOURCE_EVALUATION_ORDER {
            if source.requires_project() && project.is_none() {
                continue;
            }
            let servers = match store.load_mcp(source, project).await {
                Ok(servers) => servers,
                Err(error) => match parse_failure(&error) {
                    Some(reason) => {
                        warn!("Ignoring unparsable MCP source {source}: {reason}");
                        snapshot.unreadable.push((UnreadableLocation::Mcp(source), reason));
                        Some(ServerMap::new())
                    }
                    None => return Err(error),
                },
            };
            snapshot.mcp.set(source, servers);
        }

        debug!(
            "Loaded snapshot: {} scope documents, {} MCP entries",
            snapshot.documents.in_precedence_order().count(),
            snapshot.mcp.len()
        );

        Ok(snapshot)
    }

    /// Effective settings across the four scopes.
    #[must_use]
    pub fn merged(&self) -> MergedSettings {
        settings::merge(&self.documents)
    }

    /// Unified MCP server table.
    #[must_use]
    pub fn resolution(&self) -> McpResolution {
        mcp::resolve(&self.mcp)
    }

    /// Findings of the full issue battery.
    #[must_use]
    pub fn issues(&self) -> Vec<SettingsIssue> {
        issues::detect(&self.documents, &self.resolution(), &self.merged())
    }
}

fn parse_failure(error: &anyhow::Error) -> Option<String> {
    error.chain().find_map(|cause| match cause.downcast_ref::<SettingsError>() {
        Some(SettingsError::SettingsParse {
            path,
            reason,
        }) => Some(format!("{path}: {reason}")),
        _ => None,
    })
}
