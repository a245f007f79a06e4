use ccsettings_cli::core::SettingsError;
use ccsettings_cli::issues::{IssueSeverity, IssueType};
use ccsettings_cli::mcp::McpSource;
use ccsettings_cli::settings::{DefaultMode, Scope};
use ccsettings_cli::store::{ScopeSnapshot, SettingsStore, UnreadableLocation};
use ccsettings_cli::test_utils::{document, documents, init_test_logging, permissions, servers};
use ccsettings_cli::utils::project_key;
use serde_json::json;

use super::common::TestEnv;

#[tokio::test]
async fn test_missing_and_empty_files_are_distinct() {
    init_test_logging(None);
    let env = TestEnv::new();
    env.write_raw(&env.project_settings(), "  \n");
    let store = env.store();

    assert!(store.load(Scope::User, None).await.unwrap().is_none());
    let project = store.load(Scope::Project, Some(&env.project)).await.unwrap().unwrap();
    assert!(project.is_empty());

    let snapshot = ScopeSnapshot::load(&store, Some(&env.project)).await.unwrap();
    let status = snapshot.documents.status(Scope::Project);
    assert!(status.exists);
    assert!(status.is_empty_file());
    assert!(!snapshot.documents.status(Scope::User).exists);
}

#[tokio::test]
async fn test_unparsable_file_loads_as_empty_in_snapshot() {
    let env = TestEnv::new();
    env.write_raw(&env.local_settings(), "{\"model\": ");
    let store = env.store();

    let err = store.load(Scope::Local, Some(&env.project)).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SettingsError>(),
        Some(SettingsError::SettingsParse { .. })
    ));

    let snapshot = ScopeSnapshot::load(&store, Some(&env.project)).await.unwrap();
    assert!(snapshot.documents.status(Scope::Local).exists);
    assert_eq!(snapshot.documents.status(Scope::Local).content_count, 0);
    assert_eq!(snapshot.unreadable[0].0, UnreadableLocation::Scope(Scope::Local));
}

#[tokio::test]
async fn test_local_mcp_servers_live_in_claude_json() {
    let env = TestEnv::new();
    env.write_json(
        &env.claude_json(),
        &json!({"numStartups": 12, "mcpServers": {"global": {"command": "g"}}}),
    );
    let store = env.store();

    store
        .save_mcp(McpSource::LocalClaudeJson, &servers(&["local-db"]), Some(&env.project))
        .await
        .unwrap();

    let root = env.read_json(&env.claude_json());
    assert_eq!(root["numStartups"], 12);
    assert_eq!(root["mcpServers"]["global"]["command"], "g");
    let key = project_key(&env.project);
    assert_eq!(root["projects"][key.as_str()]["mcpServers"]["local-db"]["command"], "npx");

    let loaded =
        store.load_mcp(McpSource::LocalClaudeJson, Some(&env.project)).await.unwrap().unwrap();
    assert!(loaded.contains_key("local-db"));
    let user = store.load_mcp(McpSource::UserClaudeJson, None).await.unwrap().unwrap();
    assert!(user.contains_key("global"));
}

#[tokio::test]
async fn test_mcp_file_keeps_unknown_keys() {
    let env = TestEnv::new();
    env.write_json(&env.project_mcp(), &json!({"mcpServers": {}, "$schema": "x"}));
    let store = env.store();

    store.save_mcp(McpSource::ProjectMcp, &servers(&["fs"]), Some(&env.project)).await.unwrap();
    let file = env.read_json(&env.project_mcp());
    assert_eq!(file["$schema"], "x");
    assert!(file["mcpServers"]["fs"].is_object());
}

#[tokio::test]
async fn test_managed_scope_is_never_written() {
    let env = TestEnv::new();
    let store = env.store();
    let err =
        store.save(Scope::Managed, &permissions(&["Read"], &[], &[]), None).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SettingsError>(),
        Some(SettingsError::ReadOnlyScope { .. })
    ));
    assert!(!env.managed_settings().exists());
}

#[tokio::test]
async fn test_managed_settings_take_precedence() {
    let env = TestEnv::new();
    env.write_json(&env.managed_settings(), &json!({"model": "managed-model"}));
    env.write_json(&env.local_settings(), &json!({"model": "local-model"}));

    let snapshot = ScopeSnapshot::load(&env.store(), Some(&env.project)).await.unwrap();
    let merged = snapshot.merged();
    assert_eq!(merged.effective.model.as_deref(), Some("managed-model"));
    assert_eq!(merged.source_of("model"), Some(Scope::Managed));
}

#[tokio::test]
async fn test_servers_in_user_settings_are_a_source_and_an_issue() {
    let env = TestEnv::new();
    env.write_json(
        &env.user_settings(),
        &json!({"model": "opus", "mcpServers": {"legacy": {"command": "old"}}}),
    );

    let snapshot = ScopeSnapshot::load(&env.store(), Some(&env.project)).await.unwrap();
    let resolution = snapshot.resolution();
    assert_eq!(resolution.servers.len(), 1);
    assert_eq!(resolution.servers[0].source, McpSource::UserSettings);

    let issues = snapshot.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].issue_type, IssueType::McpInSettings);
    assert_eq!(issues[0].affected_scopes, vec![Scope::User]);
}

#[tokio::test]
async fn test_user_settings_write_is_pretty_and_atomic() {
    let env = TestEnv::new();
    let store = env.store();
    store.save(Scope::User, &document(json!({"model": "opus"})), None).await.unwrap();

    let raw = std::fs::read_to_string(env.user_settings()).unwrap();
    assert!(raw.contains("\n  \"model\": \"opus\""));
    assert!(raw.ends_with('\n'));
    let leftovers: Vec<_> = std::fs::read_dir(env.home.join(".claude"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name() != "settings.json")
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_unrecognised_values_keep_the_scope_readable() {
    let env = TestEnv::new();
    let raw = json!({
        "model": "opus",
        "cleanupPeriodDays": -1,
        "permissions": {"defaultMode": "delegate", "allow": ["Read"], "deny": ["Read"]}
    });
    env.write_json(&env.project_settings(), &raw);
    let store = env.store();

    let snapshot = ScopeSnapshot::load(&store, Some(&env.project)).await.unwrap();
    assert!(snapshot.unreadable.is_empty());
    assert_eq!(snapshot.documents, documents(&[(Scope::Project, document(raw.clone()))]));

    let issues = snapshot.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, "allow-deny-conflict:Read");
    assert_eq!(issues[0].severity, IssueSeverity::Error);

    let merged = snapshot.merged();
    let perms = merged.effective.permissions.as_ref().unwrap();
    assert_eq!(perms.default_mode, Some(DefaultMode::Other("delegate".into())));
    assert_eq!(merged.effective.model.as_deref(), Some("opus"));

    let loaded = store.load(Scope::Project, Some(&env.project)).await.unwrap().unwrap();
    store.save(Scope::Project, &loaded, Some(&env.project)).await.unwrap();
    assert_eq!(env.read_json(&env.project_settings()), raw);
}
