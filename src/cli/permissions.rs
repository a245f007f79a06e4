//! `ccsettings permissions`: the slider view of permission rules.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tracing::info;

use super::{CommandContext, OutputFormat, print_json};
use crate::permissions::{
    SliderValue, SliderValues, apply_sliders, are_slider_values_equal, parse_assignment,
    rules_to_slider,
};
use crate::settings::Scope;
use crate::store::SettingsStore;

/// Read or set permission sliders.
#[derive(Args)]
pub struct PermissionsCommand {
    #[command(subcommand)]
    command: PermissionsSubcommand,
}

#[derive(Subcommand)]
enum PermissionsSubcommand {
    /// Show slider values
    Show {
        /// Read one scope instead of the effective permissions
        #[arg(long, value_enum)]
        scope: Option<Scope>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Set sliders in one scope, e.g. `fileEdit=allow gitCommands=ask`
    Set {
        /// Scope to write
        #[arg(long, value_enum)]
        scope: Scope,

        /// `<category>=<block|ask|allow>` assignments
        #[arg(required = true, value_name = "CATEGORY=VALUE")]
        assignments: Vec<String>,
    },
}

impl PermissionsCommand {
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        match self.command {
            PermissionsSubcommand::Show {
                scope,
                format,
            } => show(context, scope, format).await,
            PermissionsSubcommand::Set {
                scope,
                assignments,
            } => set(context, scope, &assignments).await,
        }
    }
}

async fn show(context: &CommandContext, scope: Option<Scope>, format: OutputFormat) -> Result<()> {
    let values = match scope {
        Some(scope) => {
            let document = context.store.load(scope, Some(context.project())).await?;
            rules_to_slider(document.as_ref().and_then(|d| d.permissions.as_ref()))
        }
        None => {
            let merged = context.snapshot().await?.merged();
            rules_to_slider(merged.effective.permissions.as_ref())
        }
    };

    match format {
        OutputFormat::Json => print_json(&values),
        OutputFormat::Text => {
            print_sliders(&values);
            Ok(())
        }
    }
}

async fn set(context: &CommandContext, scope: Scope, assignments: &[String]) -> Result<()> {
    let mut changes = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        changes.push(parse_assignment(assignment)?);
    }

    let project = Some(context.project());
    let mut document = context
        .store
        .load(scope, project)
        .await
        .with_context(|| format!("Failed to read {scope} settings"))?
        .unwrap_or_default();

    let current = rules_to_slider(document.permissions.as_ref());
    let mut values = current.clone();
    for (category, value) in changes {
        values.set(category, value);
    }

    if are_slider_values_equal(&current, &values) && document.permissions.is_some() {
        println!("{} {scope} permissions already match", "✓".green());
        return Ok(());
    }

    document.permissions = Some(apply_sliders(document.permissions.as_ref(), &values));
    // A non-object `permissions` value is replaced by the rewritten block
    document.other.remove("permissions");
    context.store.save(scope, &document, project).await?;
    info!("Updated {scope} permissions");

    println!("{} Updated {scope} permissions", "✓".green());
    print_sliders(&values);
    Ok(())
}

fn print_sliders(values: &SliderValues) {
    for (category, value) in values.iter() {
        let label = match value {
            SliderValue::Block => value.as_str().red(),
            SliderValue::Ask => value.as_str().yellow(),
            SliderValue::Allow => value.as_str().green(),
        };
        println!("  {:<15} {label}", category.as_str());
    }
}
