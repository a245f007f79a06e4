//! Command-line interface for ccsettings.
//!
//! # Commands
//!
//! - `show` - effective settings, provenance and scope file status
//! - `mcp` - unified MCP servers and name conflicts
//! - `check` - run the issue battery; fails on error findings
//! - `permissions` - read or set permission sliders
//! - `preset` - save, inspect and apply presets
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - debug logging on stderr
//! - `--quiet` / `-q` - errors only
//! - `--config` / `-c` - config file (also `CCSETTINGS_CONFIG`)
//! - `--project` - project directory, default the current directory
//!
//! Every command loads a fresh [`ScopeSnapshot`] from the filesystem store
//! and computes from it; nothing is cached between invocations.

mod check;
mod mcp;
mod permissions;
mod preset;
mod show;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::store::{FsSettingsStore, ScopeSnapshot};

/// Output format shared by the read-only commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with colors
    #[default]
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

/// Inspect and edit Claude Code settings across scopes.
#[derive(Parser)]
#[command(
    name = "ccsettings",
    about = "Inspect and edit Claude Code settings across scopes",
    version,
    long_about = "ccsettings merges the managed, local, project and user settings files, \
                  unifies MCP servers from every location, flags conflicts, and manages presets."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the ccsettings config file
    #[arg(short, long, global = true, env = "CCSETTINGS_CONFIG")]
    config: Option<PathBuf>,

    /// Project directory for the project and local scopes
    #[arg(long, global = true)]
    project: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show effective settings and where each value comes from
    Show(show::ShowCommand),

    /// List MCP servers from every source
    Mcp(mcp::McpCommand),

    /// Detect conflicts and risky settings
    Check(check::CheckCommand),

    /// Read or set permission sliders
    Permissions(permissions::PermissionsCommand),

    /// Manage presets
    Preset(preset::PresetCommand),
}

impl Cli {
    /// Initialize logging and run the selected command.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();
        let context = CommandContext::load(self.config, self.project).await?;
        match self.command {
            Commands::Show(cmd) => cmd.execute(&context).await,
            Commands::Mcp(cmd) => cmd.execute(&context).await,
            Commands::Check(cmd) => cmd.execute(&context).await,
            Commands::Permissions(cmd) => cmd.execute(&context).await,
            Commands::Preset(cmd) => cmd.execute(&context).await,
        }
    }

    fn init_logging(&self) {
        let filter = if self.verbose {
            EnvFilter::new("debug")
        } else if self.quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// What every command needs: configuration, a store and the project.
pub struct CommandContext {
    /// Loaded configuration
    pub config: AppConfig,
    /// Filesystem store over the configured locations
    pub store: FsSettingsStore,
    /// Absolute project directory
    pub project: PathBuf,
}

impl CommandContext {
    /// Load configuration and fix the project directory.
    pub async fn load(config_path: Option<PathBuf>, project: Option<PathBuf>) -> Result<Self> {
        let config = AppConfig::load_with_optional(config_path).await?;
        let store = FsSettingsStore::new(config.store_paths()?);
        let project = match project {
            Some(project) => std::path::absolute(&project)
                .with_context(|| format!("Invalid project path {}", project.display()))?,
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        debug!("Using project {}", project.display());
        Ok(Self {
            config,
            store,
            project,
        })
    }

    /// The project directory.
    #[must_use]
    pub fn project(&self) -> &Path {
        &self.project
    }

    /// Load every scope and MCP source for the project.
    pub async fn snapshot(&self) -> Result<ScopeSnapshot> {
        ScopeSnapshot::load(&self.store, Some(&self.project)).await
    }
}

/// Print a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
