//! Effective settings computed from the four scope documents.
//!
//! Three strategies apply, always walking scopes in
//! [`SCOPE_PRECEDENCE`](crate::constants::SCOPE_PRECEDENCE) order:
//!
//! - **First wins** for scalar and object fields (`model`, `attribution`,
//!   unknown keys, ...): the first scope that has the key supplies it and is
//!   recorded in the provenance map.
//! - **Union** for the `permissions` lists: `allow`, `deny`, `ask` and
//!   `additionalDirectories` are concatenated across every scope, then
//!   de-duplicated. Lists that end up empty are omitted. `defaultMode` and
//!   unknown permission keys are first wins.
//! - **Key union** for `env` and `hooks`: keys are collected across scopes
//!   with first wins per key.
//!
//! `mcpServers` embedded in a settings document is not merged here. Those
//! servers belong to MCP source resolution (see [`crate::mcp::resolver`]).
//!
//! A known key whose value has the wrong shape is kept in its scope's
//! document but takes no part in the merge.
//!
//! The merge is a pure function: no caching, no I/O, no logging.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{
    DOCUMENT_KEYS, PERMISSION_KEYS, PermissionsConfig, Scope, ScopeDocuments, SettingsDocument,
};

/// Result of merging all scopes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedSettings {
    /// The effective document
    pub effective: SettingsDocument,

    /// Which scope supplied each first-wins value.
    ///
    /// Keys are JSON field names. Per-key values of `env` and `hooks` use
    /// `env.<NAME>` / `hooks.<EVENT>`, and first-wins permission keys use
    /// `permissions.<key>`. Union lists have no provenance entry.
    pub provenance: BTreeMap<String, Scope>,
}

impl MergedSettings {
    /// Scope that supplied a field, if any did.
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<Scope> {
        self.provenance.get(field).copied()
    }
}

/// Merge scope documents into one effective document with provenance.
///
/// Absent documents contribute nothing. Calling this twice with equal
/// inputs yields equal outputs.
#[must_use]
pub fn merge(documents: &ScopeDocuments) -> MergedSettings {
    let mut provenance = BTreeMap::new();
    let p = &mut provenance;

    let effective = SettingsDocument {
        model: first_present(documents, "model", p, |d| d.model.as_ref()),
        language: first_present(documents, "language", p, |d| d.language.as_ref()),
        permissions: merge_permissions(documents, p),
        mcp_servers: None,
        hooks: key_union(documents, "hooks", p, |d| d.hooks.as_ref()),
        env: key_union(documents, "env", p, |d| d.env.as_ref()),
        attribution: first_present(documents, "attribution", p, |d| d.attribution.as_ref()),
        include_co_authored_by: first_present(documents, "includeCoAuthoredBy", p, |d| {
            d.include_co_authored_by.as_ref()
        }),
        cleanup_period_days: first_present(documents, "cleanupPeriodDays", p, |d| {
            d.cleanup_period_days.as_ref()
        }),
        always_thinking_enabled: first_present(documents, "alwaysThinkingEnabled", p, |d| {
            d.always_thinking_enabled.as_ref()
        }),
        output_style: first_present(documents, "outputStyle", p, |d| d.output_style.as_ref()),
        api_key_helper: first_present(documents, "apiKeyHelper", p, |d| d.api_key_helper.as_ref()),
        status_line: first_present(documents, "statusLine", p, |d| d.status_line.as_ref()),
        enable_all_project_mcp_servers: first_present(
            documents,
            "enableAllProjectMcpServers",
            p,
            |d| d.enable_all_project_mcp_servers.as_ref(),
        ),
        enabled_mcpjson_servers: first_present(documents, "enabledMcpjsonServers", p, |d| {
            d.enabled_mcpjson_servers.as_ref()
        }),
        disabled_mcpjson_servers: first_present(documents, "disabledMcpjsonServers", p, |d| {
            d.disabled_mcpjson_servers.as_ref()
        }),
        other: merge_other(documents, p),
    };

    MergedSettings {
        effective,
        provenance,
    }
}

/// Take the value from the highest-precedence scope that has it.
fn first_present<T: Clone>(
    documents: &ScopeDocuments,
    field: &str,
    provenance: &mut BTreeMap<String, Scope>,
    get: impl Fn(&SettingsDocument) -> Option<&T>,
) -> Option<T> {
    let (scope, value) =
        documents.in_precedence_order().find_map(|(scope, doc)| get(doc).map(|v| (scope, v)))?;
    provenance.insert(field.to_string(), scope);
    Some(value.clone())
}

/// Union of permission lists across scopes.
fn merge_permissions(
    documents: &ScopeDocuments,
    provenance: &mut BTreeMap<String, Scope>,
) -> Option<PermissionsConfig> {
    let mut merged = PermissionsConfig::default();

    for (scope, doc) in documents.in_precedence_order() {
        let Some(perms) = &doc.permissions else {
            continue;
        };

        merged.allow.extend(perms.allow.iter().cloned());
        merged.deny.extend(perms.deny.iter().cloned());
        merged.ask.extend(perms.ask.iter().cloned());
        merged.additional_directories.extend(perms.additional_directories.iter().cloned());

        if merged.default_mode.is_none() && perms.default_mode.is_some() {
            merged.default_mode.clone_from(&perms.default_mode);
            provenance.insert("permissions.defaultMode".to_string(), scope);
        }

        for (key, value) in &perms.other {
            if !PERMISSION_KEYS.contains(&key.as_str()) && !merged.other.contains_key(key) {
                merged.other.insert(key.clone(), value.clone());
                provenance.insert(format!("permissions.{key}"), scope);
            }
        }
    }

    merged.dedup();
    (!merged.is_empty()).then_some(merged)
}

/// Shallow key union with first wins per key. Empty results are omitted.
fn key_union(
    documents: &ScopeDocuments,
    field: &str,
    provenance: &mut BTreeMap<String, Scope>,
    get: impl Fn(&SettingsDocument) -> Option<&Map<String, Value>>,
) -> Option<Map<String, Value>> {
    let mut merged = Map::new();

    for (scope, doc) in documents.in_precedence_order() {
        let Some(entries) = get(doc) else {
            continue;
        };
        for (key, value) in entries {
            if !merged.contains_key(key) {
                merged.insert(key.clone(), value.clone());
                provenance.insert(format!("{field}.{key}"), scope);
            }
        }
    }

    (!merged.is_empty()).then_some(merged)
}

/// Unknown top-level keys, first wins per key.
fn merge_other(
    documents: &ScopeDocuments,
    provenance: &mut BTreeMap<String, Scope>,
) -> Map<String, Value> {
    let mut merged = Map::new();

    for (scope, doc) in documents.in_precedence_order() {
        for (key, value) in &doc.other {
            if !DOCUMENT_KEYS.contains(&key.as_str()) && !merged.contains_key(key) {
                merged.insert(key.clone(), value.clone());
                provenance.insert(key.clone(), scope);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DefaultMode;
    use crate::test_utils::{document as doc, documents, permissions};
    use serde_json::json;

    #[test]
    fn test_first_present_follows_precedence() {
        let docs = ScopeDocuments::default()
            .with(Scope::User, doc(json!({"model": "haiku", "language": "en"})))
            .with(Scope::Project, doc(json!({"model": "sonnet"})))
            .with(Scope::Local, doc(json!({"model": "opus"})));

        let merged = merge(&docs);
        assert_eq!(merged.effective.model.as_deref(), Some("opus"));
        assert_eq!(merged.source_of("model"), Some(Scope::Local));
        assert_eq!(merged.effective.language.as_deref(), Some("en"));
        assert_eq!(merged.source_of("language"), Some(Scope::User));
    }

    #[test]
    fn test_managed_beats_everything() {
        let docs = ScopeDocuments::default()
            .with(Scope::Local, doc(json!({"cleanupPeriodDays": 5})))
            .with(Scope::Managed, doc(json!({"cleanupPeriodDays": 30})));

        let merged = merge(&docs);
        assert_eq!(merged.effective.cleanup_period_days, Some(30));
        assert_eq!(merged.source_of("cleanupPeriodDays"), Some(Scope::Managed));
    }

    #[test]
    fn test_permission_lists_are_unioned() {
        let docs = documents(&[
            (Scope::User, permissions(&["A"], &[], &[])),
            (Scope::Project, permissions(&["B"], &[], &[])),
        ]);

        let merged = merge(&docs);
        let perms = merged.effective.permissions.unwrap();
        assert_eq!(perms.allow, vec!["B", "A"]);
        assert!(perms.deny.is_empty());
        assert!(!merged.provenance.contains_key("permissions.allow"));
    }

    #[test]
    fn test_permission_union_deduplicates() {
        let docs = documents(&[
            (Scope::User, permissions(&[], &["X", "Y"], &["Q"])),
            (Scope::Local, permissions(&[], &["Y", "X"], &[])),
        ]);

        let perms = merge(&docs).effective.permissions.unwrap();
        assert_eq!(perms.deny, vec!["Y", "X"]);
        assert_eq!(perms.ask, vec!["Q"]);
    }

    #[test]
    fn test_empty_permission_lists_are_omitted() {
        let docs = ScopeDocuments::default()
            .with(Scope::User, doc(json!({"permissions": {"allow": [], "deny": []}})));

        let merged = merge(&docs);
        assert!(merged.effective.permissions.is_none());
        let value = serde_json::to_value(&merged.effective).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_default_mode_is_first_wins() {
        let docs = ScopeDocuments::default()
            .with(Scope::User, doc(json!({"permissions": {"defaultMode": "plan"}})))
            .with(Scope::Project, doc(json!({"permissions": {"defaultMode": "acceptEdits"}})));

        let merged = merge(&docs);
        assert_eq!(
            merged.effective.permissions.as_ref().unwrap().default_mode,
            Some(DefaultMode::AcceptEdits)
        );
        assert_eq!(merged.source_of("permissions.defaultMode"), Some(Scope::Project));
    }

    #[test]
    fn test_env_and_hooks_key_union() {
        let docs = ScopeDocuments::default()
            .with(
                Scope::User,
                doc(json!({
                    "env": {"A": "user", "B": "user"},
                    "hooks": {"Stop": [{"matcher": "", "hooks": []}]}
                })),
            )
            .with(
                Scope::Project,
                doc(json!({
                    "env": {"A": "project"},
                    "hooks": {"PreToolUse": []}
                })),
            );

        let merged = merge(&docs);
        let env = merged.effective.env.as_ref().unwrap();
        assert_eq!(env["A"], json!("project"));
        assert_eq!(env["B"], json!("user"));
        assert_eq!(merged.source_of("env.A"), Some(Scope::Project));
        assert_eq!(merged.source_of("env.B"), Some(Scope::User));

        let hooks = merged.effective.hooks.as_ref().unwrap();
        assert!(hooks.contains_key("Stop"));
        assert!(hooks.contains_key("PreToolUse"));
    }

    #[test]
    fn test_unknown_keys_survive_merge() {
        let docs = ScopeDocuments::default()
            .with(Scope::User, doc(json!({"customFlag": 1, "theme": "dark"})))
            .with(Scope::Local, doc(json!({"customFlag": 2})));

        let merged = merge(&docs);
        assert_eq!(merged.effective.other["customFlag"], json!(2));
        assert_eq!(merged.effective.other["theme"], json!("dark"));
        assert_eq!(merged.source_of("customFlag"), Some(Scope::Local));
    }

    #[test]
    fn test_mistyped_known_key_is_left_out_of_the_merge() {
        let docs = documents(&[
            (Scope::Local, doc(json!({"cleanupPeriodDays": "soon", "permissions": {"ask": 1}}))),
            (Scope::User, doc(json!({"cleanupPeriodDays": 14, "permissions": {"ask": ["Read"]}}))),
        ]);

        let merged = merge(&docs);
        assert_eq!(merged.effective.cleanup_period_days, Some(14));
        assert_eq!(merged.source_of("cleanupPeriodDays"), Some(Scope::User));
        assert!(merged.effective.other.is_empty());
        let perms = merged.effective.permissions.as_ref().unwrap();
        assert_eq!(perms.ask, vec!["Read"]);
        assert!(perms.other.is_empty());

        let value = serde_json::to_value(&merged.effective).unwrap();
        assert_eq!(value, json!({"cleanupPeriodDays": 14, "permissions": {"ask": ["Read"]}}));
    }

    #[test]
    fn test_unrecognised_default_mode_is_carried() {
        let docs = documents(&[(Scope::Project, doc(json!({"permissions": {"defaultMode": "delegate"}})))]);
        let perms = merge(&docs).effective.permissions.unwrap();
        assert_eq!(perms.default_mode, Some(DefaultMode::Other("delegate".into())));
    }

    #[test]
    fn test_embedded_mcp_servers_are_not_merged() {
        let docs = ScopeDocuments::default()
            .with(Scope::User, doc(json!({"mcpServers": {"x": {"command": "x"}}})));

        let merged = merge(&docs);
        assert!(merged.effective.mcp_servers.is_none());
        assert!(merged.source_of("mcpServers").is_none());
    }

    #[test]
    fn test_null_and_empty_documents_contribute_nothing() {
        let none = merge(&ScopeDocuments::default());
        let empty = merge(
            &ScopeDocuments::default()
                .with(Scope::User, SettingsDocument::default())
                .with(Scope::Project, SettingsDocument::default()),
        );
        assert_eq!(none, empty);
        assert!(none.effective.is_empty());
        assert!(none.provenance.is_empty());
    }

    #[test]
    fn test_merge_is_deterministic() {
        let docs = ScopeDocuments::default()
            .with(
                Scope::User,
                doc(json!({"model": "a", "env": {"Z": "1", "A": "2"}, "permissions": {"allow": ["R"]}})),
            )
            .with(Scope::Project, doc(json!({"permissions": {"allow": ["S", "R"]}, "x": true})))
            .with(Scope::Local, doc(json!({"env": {"M": "3"}})))
            .with(Scope::Managed, doc(json!({"permissions": {"deny": ["T"]}})));

        let first = merge(&docs);
        let second = merge(&docs);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.effective).unwrap(),
            serde_json::to_string(&second.effective).unwrap()
        );
    }
}
