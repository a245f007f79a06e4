//! In-memory [`SettingsStore`].
//!
//! Holds documents and server maps in memory and records every write in
//! order. Useful for embedding the engine without touching disk, and for
//! asserting exactly which writes an operation issued.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{SettingsStore, check_writable, require_project, require_source_project};
use crate::core::SettingsError;
use crate::mcp::{McpSource, ServerMap};
use crate::settings::{Scope, SettingsDocument};

/// One write issued against a [`MemorySettingsStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    /// A scope document was saved
    Settings {
        /// Target scope
        scope: Scope,
        /// Project, for project-bound scopes
        project: Option<PathBuf>,
    },
    /// An MCP server map was saved
    Mcp {
        /// Target source
        source: McpSource,
        /// Project, for project-bound sources
        project: Option<PathBuf>,
    },
}

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<(Scope, Option<PathBuf>), SettingsDocument>,
    servers: BTreeMap<(McpSource, Option<PathBuf>), ServerMap>,
    unparsable: BTreeSet<Scope>,
    writes: Vec<StoreWrite>,
    fail_writes: bool,
}

/// Settings store backed by memory.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    state: Mutex<State>,
}

impl MemorySettingsStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a scope document without recording a write.
    pub fn insert(&self, scope: Scope, project: Option<&Path>, document: SettingsDocument) {
        let key = (scope, scope_key(scope.requires_project(), project));
        self.state().documents.insert(key, document);
    }

    /// Seed an MCP source without recording a write.
    pub fn insert_mcp(&self, source: McpSource, project: Option<&Path>, servers: ServerMap) {
        let key = (source, scope_key(source.requires_project(), project));
        self.state().servers.insert(key, servers);
    }

    /// Make loads of a scope fail as if its file held invalid JSON.
    pub fn mark_unparsable(&self, scope: Scope) {
        self.state().unparsable.insert(scope);
    }

    /// Make every subsequent save fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Writes issued so far, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<StoreWrite> {
        self.state().writes.clone()
    }

    /// Current document of a scope.
    #[must_use]
    pub fn document(&self, scope: Scope, project: Option<&Path>) -> Option<SettingsDocument> {
        let key = (scope, scope_key(scope.requires_project(), project));
        self.state().documents.get(&key).cloned()
    }

    /// Current server map of an MCP source.
    #[must_use]
    pub fn servers(&self, source: McpSource, project: Option<&Path>) -> Option<ServerMap> {
        let key = (source, scope_key(source.requires_project(), project));
        self.state().servers.get(&key).cloned()
    }
}

fn scope_key(project_bound: bool, project: Option<&Path>) -> Option<PathBuf> {
    if project_bound {
        project.map(Path::to_path_buf)
    } else {
        None
    }
}

fn write_failure() -> anyhow::Error {
    SettingsError::Io(std::io::Error::other("simulated write failure")).into()
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self, scope: Scope, project: Option<&Path>) -> Result<Option<SettingsDocument>> {
        require_project(scope, project)?;
        let state = self.state();
        if state.unparsable.contains(&scope) {
            return Err(SettingsError::SettingsParse {
                path: format!("<memory:{scope}>"),
                reason: "expected value at line 1 column 1".to_string(),
            }
            .into());
        }
        let key = (scope, scope_key(scope.requires_project(), project));
        Ok(state.documents.get(&key).cloned())
    }

    async fn save(
        &self,
        scope: Scope,
        document: &SettingsDocument,
        project: Option<&Path>,
    ) -> Result<()> {
        check_writable(scope, project)?;
        let mut state = self.state();
        if state.fail_writes {
            return Err(write_failure());
        }
        let key = (scope, scope_key(scope.requires_project(), project));
        state.documents.insert(key.clone(), document.clone());
        state.unparsable.remove(&scope);
        state.writes.push(StoreWrite::Settings {
            scope,
            project: key.1,
        });
        Ok(())
    }

    async fn load_mcp(
        &self,
        source: McpSource,
        project: Option<&Path>,
    ) -> Result<Option<ServerMap>> {
        require_source_project(source, project)?;
        let key = (source, scope_key(source.requires_project(), project));
        Ok(self.state().servers.get(&key).cloned())
    }

    async fn save_mcp(
        &self,
        source: McpSource,
        servers: &ServerMap,
        project: Option<&Path>,
    ) -> Result<()> {
        require_source_project(source, project)?;
        let mut state = self.state();
        if state.fail_writes {
            return Err(write_failure());
        }
        let key = (source, scope_key(source.requires_project(), project));
        state.servers.insert(key.clone(), servers.clone());
        state.writes.push(StoreWrite::Mcp {
            source,
            project: key.1,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_records_writes() {
        let store = MemorySettingsStore::new();
        let project = Path::new("/p");
        store.save(Scope::Local, &SettingsDocument::default(), Some(project)).await.unwrap();
        store.save_mcp(McpSource::UserClaudeJson, &ServerMap::new(), None).await.unwrap();

        assert_eq!(
            store.writes(),
            vec![
                StoreWrite::Settings {
                    scope: Scope::Local,
                    project: Some(project.to_path_buf()),
                },
                StoreWrite::Mcp {
                    source: McpSource::UserClaudeJson,
                    project: None,
                },
            ]
        );
        assert!(store.document(Scope::Local, Some(project)).is_some());
    }

    #[tokio::test]
    async fn test_managed_is_read_only() {
        let store = MemorySettingsStore::new();
        let err = store.save(Scope::Managed, &SettingsDocument::default(), None).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SettingsError>(),
            Some(SettingsError::ReadOnlyScope { .. })
        ));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_fail_writes() {
        let store = MemorySettingsStore::new();
        store.fail_writes(true);
        assert!(store.save(Scope::User, &SettingsDocument::default(), None).await.is_err());
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_user_scope_ignores_project() {
        let store = MemorySettingsStore::new();
        store.insert(Scope::User, Some(Path::new("/anything")), SettingsDocument::default());
        assert!(store.load(Scope::User, None).await.unwrap().is_some());
    }
}
