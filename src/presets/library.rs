//! The collection of saved presets and its persistence.
//!
//! Names are trimmed and unique without regard to case. Every operation
//! validates before it mutates, so a rejected call leaves the library as it
//! was.

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{UnifiedPreset, normalize_description, normalize_name};
use crate::constants::PRESET_COPY_SUFFIX;
use crate::core::SettingsError;
use crate::utils::{read_json_file, write_json_file};

/// Current on-disk layout of the presets file.
const PRESETS_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresetsFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    presets: Vec<UnifiedPreset>,
}

const fn default_version() -> u32 {
    PRESETS_FILE_VERSION
}

/// Changes to apply to an existing preset. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct PresetUpdate {
    /// New name
    pub name: Option<String>,
    /// New description; `Some(None)` clears it
    pub description: Option<Option<String>>,
    /// New settings blob
    pub settings: Option<String>,
    /// New MCP blob
    pub mcp_servers: Option<String>,
}

/// Saved presets, in creation order.
#[derive(Debug, Clone, Default)]
pub struct PresetLibrary {
    presets: Vec<UnifiedPreset>,
}

impl PresetLibrary {
    /// Empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the presets file. A missing file is an empty library.
    ///
    /// Cached summaries that no longer match their blobs are recomputed.
    pub fn load(path: &Path) -> Result<Self> {
        let Some(file) = read_json_file::<PresetsFile>(path)? else {
            return Ok(Self::new());
        };
        let mut presets = file.presets;
        for preset in presets.iter_mut().filter(|p| p.summary_is_stale()) {
            preset.refresh();
        }
        Ok(Self {
            presets,
        })
    }

    /// Write the presets file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_file(
            path,
            &PresetsFile {
                version: PRESETS_FILE_VERSION,
                presets: self.presets.clone(),
            },
        )
    }

    /// All presets.
    #[must_use]
    pub fn presets(&self) -> &[UnifiedPreset] {
        &self.presets
    }

    /// Number of presets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether there are no presets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Preset by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&UnifiedPreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// Preset by name, trimmed and case-insensitive.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&UnifiedPreset> {
        let wanted = name.trim().to_lowercase();
        self.presets.iter().find(|p| p.name.to_lowercase() == wanted)
    }

    /// Preset by id, falling back to name.
    pub fn resolve(&self, id_or_name: &str) -> Result<&UnifiedPreset, SettingsError> {
        self.get(id_or_name).or_else(|| self.find_by_name(id_or_name)).ok_or_else(|| {
            SettingsError::PresetNotFound {
                id: id_or_name.to_string(),
            }
        })
    }

    /// Create and add a preset.
    pub fn create(
        &mut self,
        name: &str,
        description: Option<String>,
        settings: impl Into<String>,
        mcp_servers: impl Into<String>,
    ) -> Result<&UnifiedPreset, SettingsError> {
        let preset = UnifiedPreset::new(name, description, settings, mcp_servers)?;
        self.insert(preset)
    }

    /// Add a preset built elsewhere, such as by [`UnifiedPreset::capture`].
    pub fn insert(&mut self, preset: UnifiedPreset) -> Result<&UnifiedPreset, SettingsError> {
        self.ensure_name_free(&preset.name, None)?;
        let index = self.presets.len();
        self.presets.push(preset);
        Ok(&self.presets[index])
    }

    /// Change an existing preset in place. The id and creation time are kept.
    pub fn update(
        &mut self,
        id: &str,
        update: PresetUpdate,
    ) -> Result<&UnifiedPreset, SettingsError> {
        let index = self.index_of(id)?;
        let name = match update.name.as_deref() {
            Some(name) => {
                let name = normalize_name(name)?;
                self.ensure_name_free(&name, Some(index))?;
                Some(name)
            }
            None => None,
        };

        let preset = &mut self.presets[index];
        if let Some(name) = name {
            preset.name = name;
        }
        if let Some(description) = update.description {
            preset.description = normalize_description(description);
        }
        if let Some(settings) = update.settings {
            preset.settings = settings;
        }
        if let Some(mcp_servers) = update.mcp_servers {
            preset.mcp_servers = mcp_servers;
        }
        preset.updated_at = Utc::now();
        preset.refresh();
        Ok(&self.presets[index])
    }

    /// Copy a preset under a fresh id and a `(copy)` name.
    pub fn duplicate(&mut self, id: &str) -> Result<&UnifiedPreset, SettingsError> {
        let index = self.index_of(id)?;
        let source = &self.presets[index];
        let name = self.copy_name(&source.name);
        let copy = UnifiedPreset::new(
            &name,
            source.description.clone(),
            source.settings.clone(),
            source.mcp_servers.clone(),
        )?;
        self.insert(copy)
    }

    /// Remove a preset and return it.
    pub fn delete(&mut self, id: &str) -> Result<UnifiedPreset, SettingsError> {
        let index = self.index_of(id)?;
        Ok(self.presets.remove(index))
    }

    fn index_of(&self, id: &str) -> Result<usize, SettingsError> {
        self.presets.iter().position(|p| p.id == id).ok_or_else(|| {
            SettingsError::PresetNotFound {
                id: id.to_string(),
            }
        })
    }

    fn ensure_name_free(&self, name: &str, except: Option<usize>) -> Result<(), SettingsError> {
        let wanted = name.to_lowercase();
        let taken = self
            .presets
            .iter()
            .enumerate()
            .any(|(i, p)| Some(i) != except && p.name.to_lowercase() == wanted);
        if taken {
            return Err(SettingsError::DuplicatePresetName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn copy_name(&self, name: &str) -> String {
        let base = format!("{name}{PRESET_COPY_SUFFIX}");
        let mut candidate = base.clone();
        let mut n = 2;
        while self.find_by_name(&candidate).is_some() {
            candidate = format!("{name} (copy {n})");
            n += 1;
        }
        candidate
    }
}
