//! Unify MCP server definitions from all five sources into one table.
//!
//! Every entry is flattened and tagged with its source. Entries are grouped
//! by server name; any name present in more than one source is a conflict.
//! Content is never compared: two identical copies are still a conflict,
//! because only one of them is authoritative at runtime and the user has to
//! see which. The resolver makes no choice between copies.

use serde::Serialize;
use std::collections::BTreeMap;

use super::{McpServerConfig, McpSource, McpSources, ServerMap};
use crate::settings::Scope;

/// A server entry tagged with where it was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedServer {
    /// Server name (the identity used for conflicts)
    pub name: String,
    /// Server definition as found in the source
    pub config: McpServerConfig,
    /// Location the entry was read from
    pub source: McpSource,
    /// Scope the source is displayed under
    pub scope: Scope,
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct McpResolution {
    /// Every entry from every source, sorted by name.
    ///
    /// Copies of a conflicting name are all listed, in source evaluation
    /// order.
    pub servers: Vec<UnifiedServer>,

    /// Names defined in more than one source, with each copy.
    pub conflicts: BTreeMap<String, Vec<UnifiedServer>>,
}

impl McpResolution {
    /// Whether a server name is defined in more than one source.
    #[must_use]
    pub fn is_conflicted(&self, name: &str) -> bool {
        self.conflicts.contains_key(name)
    }

    /// Distinct server names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.servers.iter().map(|s| s.name.as_str()).collect();
        names.dedup();
        names
    }

    /// One configuration per name.
    ///
    /// For a conflicting name, the copy whose source scope ranks highest in
    /// scope precedence is taken; copies from equally ranked sources fall
    /// back to source evaluation order. This is the view presets capture.
    #[must_use]
    pub fn effective_servers(&self) -> ServerMap {
        let mut effective: BTreeMap<String, &UnifiedServer> = BTreeMap::new();

        for server in &self.servers {
            match effective.get(&server.name) {
                Some(current) if current.scope.precedence_rank() <= server.scope.precedence_rank() => {}
                _ => {
                    effective.insert(server.name.clone(), server);
                }
            }
        }

        effective.into_iter().map(|(name, server)| (name, server.config.clone())).collect()
    }
}

/// Flatten, group and detect name collisions across MCP sources.
#[must_use]
pub fn resolve(sources: &McpSources) -> McpResolution {
    let mut servers: Vec<UnifiedServer> = sources
        .entries()
        .map(|(source, name, config)| UnifiedServer {
            name: name.clone(),
            config: config.clone(),
            source,
            scope: source.scope(),
        })
        .collect();

    // Stable sort keeps evaluation order among copies of one name
    servers.sort_by(|a, b| a.name.cmp(&b.name));

    let mut groups: BTreeMap<String, Vec<UnifiedServer>> = BTreeMap::new();
    for server in &servers {
        groups.entry(server.name.clone()).or_default().push(server.clone());
    }

    let conflicts = groups
        .into_iter()
        .filter(|(_, copies)| {
            let mut seen: Vec<McpSource> = copies.iter().map(|c| c.source).collect();
            seen.dedup();
            seen.len() > 1
        })
        .collect();

    McpResolution {
        servers,
        conflicts,
    }
}
