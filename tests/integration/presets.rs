use ccsettings_cli::core::{PresetBlob, SettingsError};
use ccsettings_cli::mcp::McpSource;
use ccsettings_cli::presets::{self, PresetLibrary, UnifiedPreset};
use ccsettings_cli::settings::Scope;
use ccsettings_cli::store::{ScopeSnapshot, SettingsStore};
use serde_json::json;

use super::common::TestEnv;

#[tokio::test]
async fn test_capture_then_apply_reproduces_effective_state() {
    let source = TestEnv::new();
    source.write_json(
        &source.user_settings(),
        &json!({"model": "sonnet", "env": {"EDITOR": "vim"}, "permissions": {"allow": ["Read"]}}),
    );
    source.write_json(
        &source.local_settings(),
        &json!({"model": "opus", "permissions": {"deny": ["WebFetch"]}}),
    );
    source.write_json(&source.claude_json(), &json!({"mcpServers": {"fs": {"command": "npx"}}}));
    source.write_json(&source.project_mcp(), &json!({"mcpServers": {"db": {"command": "pg"}}}));

    let snapshot = ScopeSnapshot::load(&source.store(), Some(&source.project)).await.unwrap();
    let preset =
        UnifiedPreset::capture("Everything", None, &snapshot.merged(), &snapshot.resolution())
            .unwrap();
    assert_eq!(preset.summary().mcp_server_count, 2);
    assert_eq!(preset.summary().model.as_deref(), Some("opus"));

    let target = TestEnv::new();
    let store = target.store();
    let outcome = presets::apply(&preset, Scope::Local, Some(&target.project), &store).await.unwrap();
    assert!(outcome.settings_written);
    assert_eq!(outcome.mcp_source, Some(McpSource::LocalClaudeJson));

    let applied = ScopeSnapshot::load(&store, Some(&target.project)).await.unwrap();
    let merged = applied.merged();
    assert_eq!(merged.effective, snapshot.merged().effective);
    assert_eq!(merged.source_of("model"), Some(Scope::Local));
    assert_eq!(applied.resolution().effective_servers(), snapshot.resolution().effective_servers());
}

#[tokio::test]
async fn test_apply_with_invalid_blob_leaves_files_untouched() {
    let env = TestEnv::new();
    env.write_json(&env.claude_json(), &json!({"numStartups": 1}));
    let store = env.store();
    let preset = UnifiedPreset::new("Broken", None, "{\"model\":", "{\"x\":{\"command\":\"y\"}}").unwrap();

    let err = presets::apply(&preset, Scope::User, None, &store).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SettingsError>(),
        Some(SettingsError::PresetParse { blob: PresetBlob::Settings, .. })
    ));
    assert!(!env.user_settings().exists());
    assert_eq!(env.read_json(&env.claude_json()), json!({"numStartups": 1}));
}

#[tokio::test]
async fn test_apply_to_user_keeps_claude_json_state() {
    let env = TestEnv::new();
    env.write_json(&env.claude_json(), &json!({"numStartups": 7, "projects": {}}));
    let store = env.store();
    let preset = UnifiedPreset::new("Servers", None, "", "{\"fs\":{\"command\":\"npx\"}}").unwrap();

    let outcome = presets::apply(&preset, Scope::User, None, &store).await.unwrap();
    assert!(!outcome.settings_written);
    assert!(!env.user_settings().exists());

    let root = env.read_json(&env.claude_json());
    assert_eq!(root["numStartups"], 7);
    assert_eq!(root["mcpServers"]["fs"]["command"], "npx");
    assert!(store.load_mcp(McpSource::UserClaudeJson, None).await.unwrap().is_some());
}

#[test]
fn test_library_round_trip_through_file() {
    let env = TestEnv::new();
    let mut library = PresetLibrary::load(&env.presets_file()).unwrap();
    library.create("A", Some("first".into()), "{\"model\":\"opus\"}", "{}").unwrap();
    let id = library.find_by_name("a").unwrap().id().to_string();
    library.duplicate(&id).unwrap();
    library.save(&env.presets_file()).unwrap();

    let raw = env.read_json(&env.presets_file());
    assert_eq!(raw["version"], 1);
    assert_eq!(raw["presets"].as_array().unwrap().len(), 2);

    let loaded = PresetLibrary::load(&env.presets_file()).unwrap();
    assert_eq!(loaded.presets()[1].name(), "A (copy)");
    assert_eq!(loaded.get(&id).unwrap().description(), Some("first"));
}
