//! `ccsettings check`: run the issue battery.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::show::location_label;
use super::{CommandContext, OutputFormat, print_json};
use crate::core::SettingsError;
use crate::issues::{IssueSeverity, SettingsIssue};

/// Detect conflicts and risky settings. Fails if any error is found.
#[derive(Args)]
pub struct CheckCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport<'a> {
    valid: bool,
    issues: &'a [SettingsIssue],
    unreadable: Vec<String>,
}

impl CheckCommand {
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        let snapshot = context.snapshot().await?;
        let issues = snapshot.issues();
        let errors = issues.iter().filter(|i| i.severity == IssueSeverity::Error).count();

        match self.format {
            OutputFormat::Json => print_json(&CheckReport {
                valid: errors == 0,
                issues: &issues,
                unreadable: snapshot
                    .unreadable
                    .iter()
                    .map(|(location, reason)| format!("{}: {reason}", location_label(location)))
                    .collect(),
            })?,
            OutputFormat::Text => {
                for (location, reason) in &snapshot.unreadable {
                    println!("{} {} could not be parsed: {reason}", "⚠".yellow(), location_label(location));
                }
                if issues.is_empty() {
                    println!("{} No issues found", "✓".green());
                }
                for issue in &issues {
                    let marker = match issue.severity {
                        IssueSeverity::Error => "✗".red(),
                        IssueSeverity::Warning => "⚠".yellow(),
                        IssueSeverity::Info => "ℹ".blue(),
                    };
                    let scopes: Vec<&str> = issue.affected_scopes.iter().map(|s| s.as_str()).collect();
                    println!(
                        "{marker} {} {}",
                        issue.describe(),
                        format!("[{}]", scopes.join(", ")).dimmed()
                    );
                }
            }
        }

        if errors > 0 {
            return Err(SettingsError::IssuesFound {
                count: errors,
            }
            .into());
        }
        Ok(())
    }
}
