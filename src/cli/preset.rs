//! `ccsettings preset`: save, inspect and apply presets.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use super::{CommandContext, OutputFormat, print_json};
use crate::presets::{self, PresetLibrary, PresetSummary, UnifiedPreset};
use crate::settings::Scope;

/// Manage presets.
#[derive(Args)]
pub struct PresetCommand {
    #[command(subcommand)]
    command: PresetSubcommand,
}

#[derive(Subcommand)]
enum PresetSubcommand {
    /// List saved presets
    List {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Save the current effective settings and MCP servers as a preset
    Save {
        /// Preset name
        name: String,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,
    },

    /// Show one preset
    Show {
        /// Preset name or id
        name: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Write a preset to a scope
    Apply {
        /// Preset name or id
        name: String,

        /// Scope to write
        #[arg(long, value_enum)]
        scope: Scope,
    },

    /// Copy a preset under a new name
    Duplicate {
        /// Preset name or id
        name: String,
    },

    /// Delete a preset
    Delete {
        /// Preset name or id
        name: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PresetListEntry<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    summary: &'a PresetSummary,
    updated_at: String,
}

impl PresetCommand {
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        let path = context.config.presets_path()?;
        let mut library = PresetLibrary::load(&path)
            .with_context(|| format!("Failed to load presets from {}", path.display()))?;

        match self.command {
            PresetSubcommand::List {
                format,
            } => list(&library, format),
            PresetSubcommand::Save {
                name,
                description,
            } => {
                let snapshot = context.snapshot().await?;
                let preset = UnifiedPreset::capture(
                    &name,
                    description,
                    &snapshot.merged(),
                    &snapshot.resolution(),
                )?;
                let saved = library.insert(preset)?.clone();
                library.save(&path)?;
                info!("Saved preset {} ({})", saved.name(), saved.id());
                println!("{} Saved preset '{}'", "✓".green(), saved.name());
                print_summary(saved.summary());
                Ok(())
            }
            PresetSubcommand::Show {
                name,
                format,
            } => {
                let preset = library.resolve(&name)?;
                match format {
                    OutputFormat::Json => print_json(preset),
                    OutputFormat::Text => {
                        print_preset(preset);
                        Ok(())
                    }
                }
            }
            PresetSubcommand::Apply {
                name,
                scope,
            } => {
                let preset = library.resolve(&name)?;
                let outcome = presets::apply(preset, scope, Some(context.project()), &context.store)
                    .await
                    .with_context(|| format!("Failed to apply preset '{}'", preset.name()))?;
                info!("Applied preset {} to {scope}", preset.name());

                println!("{} Applied '{}' to {scope}", "✓".green(), preset.name());
                if outcome.settings_written {
                    println!("  settings written");
                }
                if let Some(source) = outcome.mcp_source {
                    println!("  MCP servers written to {source}");
                }
                if !outcome.settings_written && !outcome.mcp_servers_written {
                    println!("  {}", "preset is empty, nothing written".dimmed());
                }
                Ok(())
            }
            PresetSubcommand::Duplicate {
                name,
            } => {
                let id = library.resolve(&name)?.id().to_string();
                let copy = library.duplicate(&id)?.name().to_string();
                library.save(&path)?;
                println!("{} Created '{copy}'", "✓".green());
                Ok(())
            }
            PresetSubcommand::Delete {
                name,
            } => {
                let id = library.resolve(&name)?.id().to_string();
                let removed = library.delete(&id)?;
                library.save(&path)?;
                println!("{} Deleted '{}'", "✓".green(), removed.name());
                Ok(())
            }
        }
    }
}

fn list(library: &PresetLibrary, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let entries: Vec<PresetListEntry<'_>> = library
            .presets()
            .iter()
            .map(|p| PresetListEntry {
                id: p.id(),
                name: p.name(),
                description: p.description(),
                summary: p.summary(),
                updated_at: p.updated_at().to_rfc3339(),
            })
            .collect();
        return print_json(&entries);
    }

    if library.is_empty() {
        println!("No presets saved");
        return Ok(());
    }
    for preset in library.presets() {
        let summary = preset.summary();
        println!(
            "{} {} {}",
            preset.name().bold(),
            format!(
                "{} settings, {} MCP servers",
                summary.settings_count, summary.mcp_server_count
            )
            .dimmed(),
            preset.id().dimmed()
        );
        if let Some(description) = preset.description() {
            println!("  {description}");
        }
    }
    Ok(())
}

fn print_preset(preset: &UnifiedPreset) {
    println!("{} {}", preset.name().bold(), preset.id().dimmed());
    if let Some(description) = preset.description() {
        println!("{description}");
    }
    println!("Created {}  Updated {}", preset.created_at().to_rfc3339(), preset.updated_at().to_rfc3339());
    print_summary(preset.summary());
    println!();
    println!("{}", "Settings".cyan());
    println!("{}", preset.settings());
    println!("{}", "MCP servers".cyan());
    println!("{}", preset.mcp_servers());
}

fn print_summary(summary: &PresetSummary) {
    println!("  {} top-level settings", summary.settings_count);
    if let Some(model) = &summary.model {
        println!("  model: {model}");
    }
    println!("  {} MCP servers", summary.mcp_server_count);
    if summary.has_permissions {
        println!("  includes permissions");
    }
    if summary.has_hooks {
        println!("  includes hooks");
    }
}
