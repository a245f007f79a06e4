//! File helpers for JSON documents.
//!
//! Writes are atomic: content goes to a temporary file in the target's
//! directory, is synced, and is then renamed over the target. Readers see
//! either the old file or the new one, never a partial write.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::core::SettingsError;

/// Create a directory and its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Atomically write bytes to `path`, creating parent directories.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;
    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().context("Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace: {}", path.display()))?;

    Ok(())
}

/// Atomically write a string.
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Read and parse a JSON file, or `None` if it does not exist.
///
/// A file that exists but does not parse fails with
/// [`SettingsError::SettingsParse`], so callers can tell a broken file
/// from an unreadable one.
pub fn read_json_file<T>(path: &Path) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(anyhow::Error::from(e))
                .with_context(|| format!("Failed to read: {}", path.display()));
        }
    };

    // An empty file is an empty object
    if content.trim().is_empty() {
        return serde_json::from_value(Value::Object(serde_json::Map::new()))
            .map(Some)
            .map_err(|e| parse_error(path, &e));
    }

    serde_json::from_str(&content).map(Some).map_err(|e| parse_error(path, &e))
}

/// Serialize `data` as pretty JSON with a trailing newline and write it atomically.
pub fn write_json_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let mut json = serde_json::to_string_pretty(data)
        .with_context(|| format!("Failed to serialize JSON for: {}", path.display()))?;
    json.push('\n');
    safe_write(path, &json)
}

fn parse_error(path: &Path, error: &serde_json::Error) -> anyhow::Error {
    SettingsError::SettingsParse {
        path: path.display().to_string(),
        reason: error.to_string(),
    }
    .into()
}
