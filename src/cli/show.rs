//! `ccsettings show`: effective settings with provenance.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::{CommandContext, OutputFormat, print_json};
use crate::settings::{Scope, ScopeStatus, SettingsDocument};
use crate::store::UnreadableLocation;

/// Show effective settings.
#[derive(Args)]
pub struct ShowCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowReport<'a> {
    project: String,
    scopes: Vec<ScopeStatus>,
    effective: &'a SettingsDocument,
    provenance: &'a BTreeMap<String, Scope>,
    unreadable: Vec<String>,
}

impl ShowCommand {
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        let snapshot = context.snapshot().await?;
        let merged = snapshot.merged();
        let statuses = snapshot.documents.statuses();

        match self.format {
            OutputFormat::Json => print_json(&ShowReport {
                project: context.project().display().to_string(),
                scopes: statuses,
                effective: &merged.effective,
                provenance: &merged.provenance,
                unreadable: snapshot
                    .unreadable
                    .iter()
                    .map(|(location, reason)| format!("{}: {reason}", location_label(location)))
                    .collect(),
            }),
            OutputFormat::Text => {
                println!("{}", "Scopes (highest precedence first)".bold());
                for status in &statuses {
                    let path = context
                        .store
                        .settings_path(status.scope, Some(context.project()))?
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    println!("  {} {:<8} {}", status_marker(status), status.scope.as_str(), path.dimmed());
                }
                for (location, reason) in &snapshot.unreadable {
                    println!("  {} {} could not be parsed: {reason}", "⚠".yellow(), location_label(location));
                }

                println!();
                println!("{}", "Effective settings".bold());
                let effective = serde_json::to_value(&merged.effective)?;
                let Some(fields) = effective.as_object().filter(|f| !f.is_empty()) else {
                    println!("  {}", "(none)".dimmed());
                    return Ok(());
                };
                for (key, value) in fields {
                    print_field(key, value, &merged.provenance);
                }
                Ok(())
            }
        }
    }
}

fn status_marker(status: &ScopeStatus) -> String {
    if !status.exists {
        format!("{} {}", "✗".dimmed(), "not found".dimmed())
    } else if status.is_empty_file() {
        format!("{} {}", "○".yellow(), "empty".yellow())
    } else {
        format!("{} {:<9}", "✓".green(), format!("{} keys", status.content_count))
    }
}

fn print_field(key: &str, value: &Value, provenance: &BTreeMap<String, Scope>) {
    match (key, value) {
        ("env" | "hooks", Value::Object(entries)) => {
            println!("  {}", key.cyan());
            for (name, entry) in entries {
                let origin = provenance.get(&format!("{key}.{name}"));
                println!("    {name} = {}{}", compact(entry), origin_suffix(origin));
            }
        }
        ("permissions", Value::Object(entries)) => {
            println!("  {}", key.cyan());
            for (name, entry) in entries {
                let origin = provenance.get(&format!("permissions.{name}"));
                println!("    {name} = {}{}", compact(entry), origin_suffix(origin));
            }
        }
        _ => println!("  {} = {}{}", key.cyan(), compact(value), origin_suffix(provenance.get(key))),
    }
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn origin_suffix(origin: Option<&Scope>) -> String {
    origin.map(|scope| format!("  {}", format!("({scope})").dimmed())).unwrap_or_default()
}

pub(super) fn location_label(location: &UnreadableLocation) -> String {
    match location {
        UnreadableLocation::Scope(scope) => format!("{scope} settings"),
        UnreadableLocation::Mcp(source) => format!("MCP source {source}"),
    }
}
