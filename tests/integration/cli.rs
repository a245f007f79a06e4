use predicates::prelude::*;
use serde_json::json;

use super::common::TestEnv;

#[test]
fn test_show_with_no_files() {
    let env = TestEnv::new();
    env.command()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"))
        .stdout(predicate::str::contains("(none)"));
}

#[test]
fn test_show_json_reports_effective_value_and_provenance() {
    let env = TestEnv::new();
    env.write_json(&env.user_settings(), &json!({"model": "sonnet", "env": {"A": "user"}}));
    env.write_json(&env.local_settings(), &json!({"model": "opus"}));
    env.write_raw(&env.project_settings(), "");

    let report = env.json_output(&["show", "--format", "json"]);
    assert_eq!(report["effective"]["model"], "opus");
    assert_eq!(report["provenance"]["model"], "local");
    assert_eq!(report["provenance"]["env.A"], "user");

    let scopes = report["scopes"].as_array().unwrap();
    let project = scopes.iter().find(|s| s["scope"] == "project").unwrap();
    assert_eq!(project["exists"], true);
    assert_eq!(project["contentCount"], 0);
    let managed = scopes.iter().find(|s| s["scope"] == "managed").unwrap();
    assert_eq!(managed["exists"], false);
}

#[test]
fn test_show_survives_unparsable_settings() {
    let env = TestEnv::new();
    env.write_raw(&env.project_settings(), "{ not json");
    env.write_json(&env.user_settings(), &json!({"model": "sonnet"}));

    env.command()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("could not be parsed"))
        .stdout(predicate::str::contains("sonnet"));
}

#[test]
fn test_mcp_reports_conflicts() {
    let env = TestEnv::new();
    env.write_json(
        &env.claude_json(),
        &json!({"mcpServers": {"github": {"command": "npx"}}, "numStartups": 3}),
    );
    env.write_json(&env.project_mcp(), &json!({"mcpServers": {"github": {"command": "npx"}}}));

    let resolution = env.json_output(&["mcp", "--format", "json"]);
    assert_eq!(resolution["servers"].as_array().unwrap().len(), 2);
    assert_eq!(resolution["conflicts"]["github"].as_array().unwrap().len(), 2);

    env.command()
        .arg("mcp")
        .assert()
        .success()
        .stdout(predicate::str::contains("(2 entries, 1 names)"))
        .stdout(predicate::str::contains("github is defined in user_claude_json, project_mcp"));
}

#[test]
fn test_check_passes_on_clean_settings() {
    let env = TestEnv::new();
    env.write_json(&env.user_settings(), &json!({"permissions": {"allow": ["Read"]}}));
    env.command()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn test_check_fails_on_allow_deny_conflict() {
    let env = TestEnv::new();
    env.write_json(&env.user_settings(), &json!({"permissions": {"allow": ["Bash(rm:*)"]}}));
    env.write_json(&env.project_settings(), &json!({"permissions": {"deny": ["Bash(rm:*)"]}}));

    let output = env.command().args(["check", "--format", "json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(report["issues"][0]["type"], "allowDenyConflict");
    assert_eq!(report["issues"][0]["severity"], "error");
    assert_eq!(report["issues"][0]["affectedScopes"], json!(["project", "user"]));

    env.command()
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("'Bash(rm:*)' is both allowed and denied"))
        .stderr(predicate::str::contains("error-severity issue(s) found"));
}

#[test]
fn test_check_reads_past_unrecognised_default_mode() {
    let env = TestEnv::new();
    env.write_json(
        &env.project_settings(),
        &json!({"permissions": {"defaultMode": "delegate", "allow": ["Read"], "deny": ["Read"]}}),
    );

    let output = env.command().args(["check", "--format", "json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["issues"][0]["id"], "allow-deny-conflict:Read");
}

#[test]
fn test_check_warnings_do_not_fail() {
    let env = TestEnv::new();
    env.write_json(&env.project_settings(), &json!({"env": {"GITHUB_TOKEN": "x"}}));
    env.command()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("GITHUB_TOKEN"));
}

#[test]
fn test_permissions_set_preserves_hand_written_rules() {
    let env = TestEnv::new();
    env.write_json(
        &env.local_settings(),
        &json!({"model": "opus", "permissions": {"allow": ["Bash(ls:*)"], "defaultMode": "acceptEdits"}}),
    );

    env.command()
        .args(["permissions", "set", "--scope", "local", "fileEdit=allow", "dangerous=block"])
        .assert()
        .success();

    let local = env.read_json(&env.local_settings());
    assert_eq!(local["model"], "opus");
    assert_eq!(local["permissions"]["defaultMode"], "acceptEdits");
    let allow: Vec<&str> =
        local["permissions"]["allow"].as_array().unwrap().iter().filter_map(|v| v.as_str()).collect();
    assert!(allow.contains(&"Bash(ls:*)"));
    assert!(allow.contains(&"Edit"));
    let deny = local["permissions"]["deny"].as_array().unwrap();
    assert!(deny.contains(&json!("Bash(sudo:*)")));

    let sliders = env.json_output(&["permissions", "show", "--scope", "local", "--format", "json"]);
    assert_eq!(sliders["fileEdit"], "allow");
    assert_eq!(sliders["dangerous"], "block");
    assert_eq!(sliders["fileRead"], "ask");
}

#[test]
fn test_permissions_set_network_sliders_independently() {
    let env = TestEnv::new();
    env.command()
        .args(["permissions", "set", "--scope", "local", "networkDocs=allow"])
        .assert()
        .success();

    let sliders = env.json_output(&["permissions", "show", "--scope", "local", "--format", "json"]);
    assert_eq!(sliders["networkDocs"], "allow");
    assert_eq!(sliders["networkOther"], "ask");

    env.command()
        .args(["permissions", "set", "--scope", "local", "networkOther=block"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated local permissions"));

    let sliders = env.json_output(&["permissions", "show", "--scope", "local", "--format", "json"]);
    assert_eq!(sliders["networkDocs"], "allow");
    assert_eq!(sliders["networkOther"], "block");
}

#[test]
fn test_permissions_set_suggests_category() {
    let env = TestEnv::new();
    env.command()
        .args(["permissions", "set", "--scope", "user", "gitCommand=allow"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Did you mean 'gitCommands'?"));
    assert!(!env.user_settings().exists());
}

#[test]
fn test_permissions_set_refuses_managed() {
    let env = TestEnv::new();
    env.command()
        .args(["permissions", "set", "--scope", "managed", "fileRead=allow"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only"));
    assert!(!env.managed_settings().exists());
}

#[test]
fn test_preset_save_list_and_apply() {
    let env = TestEnv::new();
    env.write_json(&env.user_settings(), &json!({"model": "opus", "permissions": {"allow": ["Read"]}}));
    env.write_json(&env.claude_json(), &json!({"mcpServers": {"fs": {"command": "npx", "args": ["fs"]}}}));

    env.command()
        .args(["preset", "save", "Work", "--description", "daily setup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved preset 'Work'"));

    let presets = env.json_output(&["preset", "list", "--format", "json"]);
    assert_eq!(presets[0]["name"], "Work");
    assert_eq!(presets[0]["summary"]["model"], "opus");
    assert_eq!(presets[0]["summary"]["mcpServerCount"], 1);

    env.command()
        .args(["preset", "apply", "work", "--scope", "project"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MCP servers written to project_mcp"));

    assert_eq!(env.read_json(&env.project_settings())["model"], "opus");
    assert_eq!(env.read_json(&env.project_mcp())["mcpServers"]["fs"]["command"], "npx");
}

#[test]
fn test_preset_duplicate_name_is_rejected() {
    let env = TestEnv::new();
    env.command().args(["preset", "save", "Work"]).assert().success();
    env.command()
        .args(["preset", "save", "  work "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_preset_apply_to_managed_fails() {
    let env = TestEnv::new();
    env.write_json(&env.user_settings(), &json!({"model": "opus"}));
    env.command().args(["preset", "save", "Work"]).assert().success();
    env.command()
        .args(["preset", "apply", "Work", "--scope", "managed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("read-only"));
    assert!(!env.managed_settings().exists());
}

#[test]
fn test_preset_duplicate_and_delete() {
    let env = TestEnv::new();
    env.command().args(["preset", "save", "Work"]).assert().success();
    env.command()
        .args(["preset", "duplicate", "Work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Work (copy)"));
    env.command().args(["preset", "delete", "Work"]).assert().success();

    let presets = env.json_output(&["preset", "list", "--format", "json"]);
    let names: Vec<&str> = presets.as_array().unwrap().iter().filter_map(|p| p["name"].as_str()).collect();
    assert_eq!(names, vec!["Work (copy)"]);
}

#[test]
fn test_unknown_preset() {
    let env = TestEnv::new();
    env.command()
        .args(["preset", "show", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Preset 'missing' not found"));
}

#[test]
fn test_invalid_config_file() {
    let env = TestEnv::new();
    env.write_raw(&env.config_path, "claude_home = [");
    env.command()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
