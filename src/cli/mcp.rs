//! `ccsettings mcp`: the unified MCP server table.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::{CommandContext, OutputFormat, print_json};

/// List MCP servers from all five sources.
#[derive(Args)]
pub struct McpCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl McpCommand {
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        let resolution = context.snapshot().await?.resolution();

        if self.format == OutputFormat::Json {
            return print_json(&resolution);
        }

        if resolution.servers.is_empty() {
            println!("No MCP servers configured");
            return Ok(());
        }

        let names = resolution.names().len();
        println!(
            "{} {}",
            "MCP servers".bold(),
            format!("({} entries, {names} names)", resolution.servers.len()).dimmed()
        );
        for server in &resolution.servers {
            let marker = if resolution.is_conflicted(&server.name) {
                "⚠".yellow()
            } else {
                "✓".green()
            };
            println!(
                "  {marker} {:<20} {:<18} {}",
                server.name,
                server.source.to_string().dimmed(),
                server.config.describe()
            );
        }

        if !resolution.conflicts.is_empty() {
            println!();
            println!("{}", "Conflicts".yellow().bold());
            for (name, copies) in &resolution.conflicts {
                let sources: Vec<String> = copies.iter().map(|c| c.source.to_string()).collect();
                println!("  {name} is defined in {}", sources.join(", "));
            }
        }
        Ok(())
    }
}
