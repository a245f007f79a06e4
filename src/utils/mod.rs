//! Filesystem and path helpers shared by the store and the CLI.
//!
//! - [`fs`] - atomic writes and JSON file reading/writing

pub mod fs;

use std::path::{Path, PathBuf};

pub use fs::{atomic_write, ensure_dir, read_json_file, safe_write, write_json_file};

/// The user's home directory.
pub fn home_dir() -> anyhow::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Expand `~` and environment variables in a configured path.
pub fn expand_path(raw: &str) -> anyhow::Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| anyhow::anyhow!("Failed to expand path '{raw}': {e}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Key under which `~/.claude.json` stores a project's table.
///
/// Claude Code keys projects by absolute path with forward slashes.
#[must_use]
pub fn project_key(project: &Path) -> String {
    project.to_string_lossy().replace('\\', "/")
}
