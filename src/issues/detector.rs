//! Fixed battery of structural checks over the combined configuration.
//!
//! Checks run in a fixed order and never depend on each other: every check
//! runs on every call, and removing the condition behind one finding
//! removes only that finding. Input documents are already parsed; a file
//! that failed to parse arrives as an existing, empty document.

use crate::constants::SENSITIVE_ENV_MARKERS;
use crate::mcp::McpResolution;
use crate::settings::{DefaultMode, MergedSettings, PermissionsConfig, Scope, ScopeDocuments};

use super::{IssueSeverity, IssueType, SettingsIssue};

/// Run every check and return the findings in check order.
#[must_use]
pub fn detect(
    documents: &ScopeDocuments,
    mcp: &McpResolution,
    merged: &MergedSettings,
) -> Vec<SettingsIssue> {
    let mut issues = Vec::new();
    issues.extend(check_mcp_in_settings(documents));
    issues.extend(check_allow_deny_conflicts(documents, merged));
    issues.extend(check_mcp_name_conflicts(mcp));
    issues.extend(check_sensitive_env(documents));
    issues.extend(check_allow_ask_overlap(documents, merged));
    issues.extend(check_bypass_in_shared_scope(documents));
    issues
}

fn check_mcp_in_settings(documents: &ScopeDocuments) -> Option<SettingsIssue> {
    let mut scopes = Vec::new();
    let mut servers = Vec::new();

    for (scope, document) in documents.in_precedence_order() {
        if let Some(embedded) = document.embedded_mcp_servers() {
            scopes.push(scope);
            servers.extend(embedded.keys().cloned());
        }
    }

    if scopes.is_empty() {
        return None;
    }

    servers.sort();
    servers.dedup();
    Some(
        SettingsIssue::new("mcp-in-settings", IssueType::McpInSettings, IssueSeverity::Warning, scopes.clone())
            .with_param("scopes", join_scopes(&scopes))
            .with_param("servers", servers.join(", ")),
    )
}

fn check_allow_deny_conflicts(
    documents: &ScopeDocuments,
    merged: &MergedSettings,
) -> Vec<SettingsIssue> {
    let Some(permissions) = merged.effective.permissions.as_ref() else {
        return Vec::new();
    };

    permissions
        .allow
        .iter()
        .filter(|pattern| permissions.deny.contains(*pattern))
        .map(|pattern| {
            let scopes = scopes_declaring(documents, pattern, |p| [&p.allow, &p.deny]);
            SettingsIssue::new(
                format!("allow-deny-conflict:{pattern}"),
                IssueType::AllowDenyConflict,
                IssueSeverity::Error,
                scopes.clone(),
            )
            .with_param("pattern", pattern.clone())
            .with_param("scopes", join_scopes(&scopes))
        })
        .collect()
}

fn check_mcp_name_conflicts(mcp: &McpResolution) -> Vec<SettingsIssue> {
    mcp.conflicts
        .iter()
        .map(|(name, copies)| {
            let mut scopes: Vec<Scope> = Vec::new();
            for copy in copies {
                if !scopes.contains(&copy.scope) {
                    scopes.push(copy.scope);
                }
            }
            let sources: Vec<&str> = copies.iter().map(|c| c.source.as_str()).collect();

            SettingsIssue::new(
                format!("mcp-name-conflict:{name}"),
                IssueType::McpNameConflict,
                IssueSeverity::Warning,
                scopes,
            )
            .with_param("name", name.clone())
            .with_param("sources", sources.join(", "))
        })
        .collect()
}

fn check_sensitive_env(documents: &ScopeDocuments) -> Vec<SettingsIssue> {
    let mut issues = Vec::new();

    for (scope, document) in documents.in_precedence_order() {
        if !scope.is_shared() {
            continue;
        }
        let Some(env) = document.env.as_ref() else {
            continue;
        };

        for key in env.keys().filter(|key| is_sensitive_name(key)) {
            issues.push(
                SettingsIssue::new(
                    format!("sensitive-env:{scope}:{key}"),
                    IssueType::SensitiveEnv,
                    IssueSeverity::Warning,
                    vec![scope],
                )
                .with_param("key", key.clone())
                .with_param("scope", scope.as_str()),
            );
        }
    }

    issues
}

fn check_allow_ask_overlap(
    documents: &ScopeDocuments,
    merged: &MergedSettings,
) -> Vec<SettingsIssue> {
    let Some(permissions) = merged.effective.permissions.as_ref() else {
        return Vec::new();
    };

    permissions
        .allow
        .iter()
        .filter(|pattern| permissions.ask.contains(*pattern))
        .map(|pattern| {
            let scopes = scopes_declaring(documents, pattern, |p| [&p.allow, &p.ask]);
            SettingsIssue::new(
                format!("allow-ask-overlap:{pattern}"),
                IssueType::AllowAskOverlap,
                IssueSeverity::Info,
                scopes,
            )
            .with_param("pattern", pattern.clone())
        })
        .collect()
}

fn check_bypass_in_shared_scope(documents: &ScopeDocuments) -> Vec<SettingsIssue> {
    documents
        .in_precedence_order()
        .filter(|(scope, document)| {
            scope.is_shared()
                && document
                    .permissions
                    .as_ref()
                    .is_some_and(|p| p.default_mode == Some(DefaultMode::BypassPermissions))
        })
        .map(|(scope, _)| {
            SettingsIssue::new(
                format!("bypass-permissions-shared:{scope}"),
                IssueType::BypassPermissionsShared,
                IssueSeverity::Warning,
                vec![scope],
            )
            .with_param("scope", scope.as_str())
        })
        .collect()
}

/// Case-insensitive substring test against the sensitive markers.
fn is_sensitive_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    SENSITIVE_ENV_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Scopes whose permission lists (as picked by `lists`) contain `pattern`.
fn scopes_declaring(
    documents: &ScopeDocuments,
    pattern: &str,
    lists: fn(&PermissionsConfig) -> [&Vec<String>; 2],
) -> Vec<Scope> {
    documents
        .in_precedence_order()
        .filter(|(_, document)| {
            document
                .permissions
                .as_ref()
                .is_some_and(|p| lists(p).iter().any(|list| list.iter().any(|item| item == pattern)))
        })
        .map(|(scope, _)| scope)
        .collect()
}

fn join_scopes(scopes: &[Scope]) -> String {
    scopes.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}
