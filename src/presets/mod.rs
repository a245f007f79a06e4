//! Named bundles of effective settings and MCP servers.
//!
//! A [`UnifiedPreset`] stores both parts as serialized JSON so that a preset
//! saved by one version of the schema can still be shown and applied by
//! another. Its [`PresetSummary`] is derived from those blobs, cached on the
//! preset, and never fails: a blob that does not parse gives a zero summary.
//!
//! Applying a preset parses both blobs before any write is issued. If either
//! fails, nothing is written. Once both parse, the two writes are issued in
//! order and are not atomic with respect to each other.
//!
//! Presets are immutable apart from the explicit update and duplicate
//! operations of the [`library`].

pub mod library;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::core::{PresetBlob, SettingsError};
use crate::mcp::{McpResolution, McpSource, ServerMap};
use crate::settings::{MergedSettings, Scope, SettingsDocument};
use crate::store::SettingsStore;

pub use library::{PresetLibrary, PresetUpdate};

/// Cheap counts derived from a preset's blobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetSummary {
    /// Top-level keys in the settings blob
    pub settings_count: usize,
    /// Model named in the settings blob
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Servers in the MCP blob
    pub mcp_server_count: usize,
    /// The settings blob has a `permissions` block
    pub has_permissions: bool,
    /// The settings blob has hooks
    pub has_hooks: bool,
}

/// A stored bundle of settings and MCP servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedPreset {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    settings: String,
    mcp_servers: String,
    #[serde(default)]
    summary: PresetSummary,
    #[serde(default)]
    fingerprint: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UnifiedPreset {
    /// New preset with a fresh id. The name is trimmed and must not be empty.
    pub fn new(
        name: &str,
        description: Option<String>,
        settings: impl Into<String>,
        mcp_servers: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        let now = Utc::now();
        let mut preset = Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: normalize_name(name)?,
            description: normalize_description(description),
            settings: settings.into(),
            mcp_servers: mcp_servers.into(),
            summary: PresetSummary::default(),
            fingerprint: String::new(),
            created_at: now,
            updated_at: now,
        };
        preset.refresh();
        Ok(preset)
    }

    /// Preset holding the effective settings and one copy of every MCP server.
    pub fn capture(
        name: &str,
        description: Option<String>,
        merged: &MergedSettings,
        resolution: &McpResolution,
    ) -> Result<Self> {
        let settings = serde_json::to_string_pretty(&merged.effective)
            .context("Failed to serialize effective settings")?;
        let servers = serde_json::to_string_pretty(&resolution.effective_servers())
            .context("Failed to serialize MCP servers")?;
        Ok(Self::new(name, description, settings, servers)?)
    }

    /// Unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Serialized settings document.
    #[must_use]
    pub fn settings(&self) -> &str {
        &self.settings
    }

    /// Serialized MCP server map.
    #[must_use]
    pub fn mcp_servers(&self) -> &str {
        &self.mcp_servers
    }

    /// Cached summary.
    #[must_use]
    pub const fn summary(&self) -> &PresetSummary {
        &self.summary
    }

    /// Cached content fingerprint, `sha256:<hex>`.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last update time.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the cached summary or fingerprint no longer match the blobs,
    /// as happens when a presets file is edited by hand.
    #[must_use]
    pub fn summary_is_stale(&self) -> bool {
        self.summary != summarize(self) || self.fingerprint != fingerprint(&self.settings, &self.mcp_servers)
    }

    /// Parse the settings blob.
    pub fn parse_settings(&self) -> Result<SettingsDocument, SettingsError> {
        parse_blob(&self.settings, PresetBlob::Settings)
    }

    /// Parse the MCP blob.
    pub fn parse_mcp_servers(&self) -> Result<ServerMap, SettingsError> {
        parse_blob(&self.mcp_servers, PresetBlob::McpServers)
    }

    /// Recompute the cached summary and fingerprint.
    pub(crate) fn refresh(&mut self) {
        self.summary = summarize(self);
        self.fingerprint = fingerprint(&self.settings, &self.mcp_servers);
    }
}

/// Trim a preset name and reject it if nothing is left.
pub fn normalize_name(name: &str) -> Result<String, SettingsError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SettingsError::EmptyPresetName);
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

/// A blank blob stands for an empty object.
fn blob_text(blob: &str) -> &str {
    if blob.trim().is_empty() { "{}" } else { blob }
}

fn parse_blob<T>(blob: &str, which: PresetBlob) -> Result<T, SettingsError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(blob_text(blob)).map_err(|e| SettingsError::PresetParse {
        blob: which,
        reason: e.to_string(),
    })
}

/// Derive the summary from a preset's blobs.
///
/// If either blob fails to parse the whole summary is zero.
#[must_use]
pub fn summarize(preset: &UnifiedPreset) -> PresetSummary {
    summarize_blobs(&preset.settings, &preset.mcp_servers)
}

/// [`summarize`] over raw blobs.
#[must_use]
pub fn summarize_blobs(settings: &str, mcp_servers: &str) -> PresetSummary {
    let (Ok(settings), Ok(servers)) = (
        serde_json::from_str::<Value>(blob_text(settings)),
        serde_json::from_str::<Value>(blob_text(mcp_servers)),
    ) else {
        return PresetSummary::default();
    };

    let present = |key: &str| settings.get(key).is_some_and(|v| !v.is_null());
    PresetSummary {
        settings_count: settings.as_object().map_or(0, serde_json::Map::len),
        model: settings.get("model").and_then(Value::as_str).map(str::to_string),
        mcp_server_count: servers.as_object().map_or(0, serde_json::Map::len),
        has_permissions: present("permissions"),
        has_hooks: settings
            .get("hooks")
            .and_then(Value::as_object)
            .is_some_and(|hooks| !hooks.is_empty()),
    }
}

/// Content fingerprint of the two blobs.
#[must_use]
pub fn fingerprint(settings: &str, mcp_servers: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(settings.as_bytes());
    hasher.update(b"\n");
    hasher.update(mcp_servers.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Which writes [`apply`] performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    /// The settings document of the target scope was replaced
    pub settings_written: bool,
    /// The canonical MCP source of the target scope was replaced
    pub mcp_servers_written: bool,
    /// Source the servers went to, if written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_source: Option<McpSource>,
}

/// Write a preset to a target scope.
///
/// The settings blob replaces the scope's document and the MCP blob replaces
/// the scope's canonical MCP source (`user` → `user_claude_json`, `project` →
/// `project_mcp`, `local` → `local_claude_json`). Empty blobs are skipped.
///
/// # Errors
///
/// - [`SettingsError::ReadOnlyScope`] for `managed`
/// - [`SettingsError::MissingProjectPath`] for `project`/`local` without a project
/// - [`SettingsError::PresetParse`] if either blob is invalid; nothing is written
/// - any store error, unchanged; an earlier write may already have happened
pub async fn apply<S>(
    preset: &UnifiedPreset,
    target: Scope,
    project: Option<&Path>,
    store: &S,
) -> Result<ApplyOutcome>
where
    S: SettingsStore + ?Sized,
{
    let source = McpSource::canonical_for(target).ok_or(SettingsError::ReadOnlyScope {
        scope: target,
    })?;
    if target.requires_project() && project.is_none() {
        return Err(SettingsError::MissingProjectPath {
            scope: target,
        }
        .into());
    }

    let settings = preset.parse_settings()?;
    let servers = preset.parse_mcp_servers()?;

    let mut outcome = ApplyOutcome::default();

    if !settings.is_empty() {
        store.save(target, &settings, project).await?;
        outcome.settings_written = true;
    }

    if !servers.is_empty() {
        store.save_mcp(source, &servers, project).await?;
        outcome.mcp_servers_written = true;
        outcome.mcp_source = Some(source);
    }

    Ok(outcome)
}
