use assert_cmd::Command;
use ccsettings_cli::config::AppConfig;
use ccsettings_cli::store::{FsSettingsStore, StorePaths};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated Claude Code installation and project in a temporary directory.
///
/// ```text
/// <root>/home/.claude/settings.json
/// <root>/home/.claude.json
/// <root>/managed-settings.json
/// <root>/presets.json
/// <root>/project/.claude/settings.json
/// <root>/config.toml
/// ```
pub struct TestEnv {
    _temp: TempDir,
    pub root: PathBuf,
    pub home: PathBuf,
    pub project: PathBuf,
    pub config_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let home = root.join("home");
        let project = root.join("project");
        fs::create_dir_all(home.join(".claude")).unwrap();
        fs::create_dir_all(&project).unwrap();

        let env = Self {
            _temp: temp,
            config_path: root.join("config.toml"),
            root,
            home,
            project,
        };

        let config = AppConfig {
            claude_home: Some(env.home.join(".claude").display().to_string()),
            claude_json: Some(env.claude_json().display().to_string()),
            managed_settings: Some(env.managed_settings().display().to_string()),
            presets_file: Some(env.presets_file().display().to_string()),
        };
        fs::write(&env.config_path, toml::to_string(&config).unwrap()).unwrap();
        env
    }

    pub fn claude_json(&self) -> PathBuf {
        self.home.join(".claude.json")
    }

    pub fn managed_settings(&self) -> PathBuf {
        self.root.join("managed-settings.json")
    }

    pub fn presets_file(&self) -> PathBuf {
        self.root.join("presets.json")
    }

    pub fn user_settings(&self) -> PathBuf {
        self.home.join(".claude").join("settings.json")
    }

    pub fn project_settings(&self) -> PathBuf {
        self.project.join(".claude").join("settings.json")
    }

    pub fn local_settings(&self) -> PathBuf {
        self.project.join(".claude").join("settings.local.json")
    }

    pub fn project_mcp(&self) -> PathBuf {
        self.project.join(".mcp.json")
    }

    pub fn store(&self) -> FsSettingsStore {
        FsSettingsStore::new(StorePaths {
            claude_home: self.home.join(".claude"),
            claude_json: self.claude_json(),
            managed_settings: Some(self.managed_settings()),
        })
    }

    /// Write JSON to a file, creating parent directories.
    pub fn write_json(&self, path: &Path, value: &Value) {
        self.write_raw(path, &serde_json::to_string_pretty(value).unwrap());
    }

    pub fn write_raw(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn read_json(&self, path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    /// `ccsettings` pointed at this environment.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("ccsettings").unwrap();
        cmd.arg("--config")
            .arg(&self.config_path)
            .arg("--project")
            .arg(&self.project)
            .env_remove("CCSETTINGS_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }

    /// Run a command expected to succeed and parse its JSON stdout.
    pub fn json_output(&self, args: &[&str]) -> Value {
        let output = self.command().args(args).output().unwrap();
        assert!(output.status.success(), "command failed: {}", String::from_utf8_lossy(&output.stderr));
        serde_json::from_slice(&output.stdout).unwrap()
    }
}
