//! ccsettings - settings resolution and conflict engine for Claude Code
//!
//! Claude Code reads its configuration from four scopes and MCP servers from
//! five locations. This crate merges the scopes into one effective document,
//! unifies the MCP servers, reports conflicts and risky settings, converts
//! permission rules to and from a coarse slider view, and saves or applies
//! named presets.
//!
//! # Architecture Overview
//!
//! The engine is a set of pure functions over already loaded documents:
//!
//! ```text
//! SettingsStore ──load──▶ ScopeSnapshot ─┬─▶ settings::merge   ──▶ MergedSettings
//!                                        ├─▶ mcp::resolve      ──▶ McpResolution
//!                                        └─▶ issues::detect    ──▶ Vec<SettingsIssue>
//!
//! UnifiedPreset ──presets::apply──▶ SettingsStore (save, save_mcp)
//! ```
//!
//! Scope precedence is `managed > local > project > user`, defined once in
//! [`constants::SCOPE_PRECEDENCE`].
//!
//! # Core Modules
//!
//! - [`settings`] - scopes, documents and the scope merger
//! - [`mcp`] - MCP server definitions, sources and the source resolver
//! - [`permissions`] - slider categories, rule matching and the codec
//! - [`issues`] - findings and the issue detector
//! - [`presets`] - presets, their summaries, application and the library
//!
//! ## Supporting Modules
//!
//! - [`store`] - persistence contract with filesystem and in-memory stores
//! - [`config`] - the optional `~/.ccsettings/config.toml`
//! - [`core`] - error types and user-facing error display
//! - [`cli`] - the `ccsettings` command line
//! - [`utils`] - JSON file helpers and atomic writes
//!
//! # Example
//!
//! ```rust,no_run
//! use ccsettings_cli::store::{MemorySettingsStore, ScopeSnapshot};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = MemorySettingsStore::new();
//! let snapshot = ScopeSnapshot::load(&store, None).await?;
//! for issue in snapshot.issues() {
//!     println!("{}", issue.describe());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod issues;
pub mod mcp;
pub mod permissions;
pub mod presets;
pub mod settings;
pub mod store;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
