//! `sheetpilot apply` command.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use console::style;
use sheetpilot_core::{AnalysisResult, ApplyOutcome};

use super::read_json_arg;
use crate::app::App;

#[derive(Args)]
pub struct ApplyArgs {
    /// Analysis JSON as printed by `analyze` (inline or @file.json)
    pub analysis: String,

    /// Recommendation to apply
    #[arg(long)]
    pub id: String,

    /// Refine the action with these notes before applying
    #[arg(short, long)]
    pub notes: Option<String>,
}

pub async fn run(app: &App, args: &ApplyArgs) -> Result<()> {
    let analysis: AnalysisResult = read_json_arg(&args.analysis)?;
    let recommendation = analysis
        .recommendation(&args.id)
        .ok_or_else(|| anyhow!("no recommendation with id '{}' in the analysis", args.id))?;

    let notes = args.notes.as_deref().unwrap_or_default().trim();
    let was_modified = !notes.is_empty();
    let action = if was_modified {
        app.refiner()
            .refine(recommendation, notes)
            .await
            .context("failed to refine recommendation")?
    } else {
        recommendation.action.clone()
    };

    println!(
        "{} Applying {}: {}!{} = {}",
        style("→").cyan(),
        style(&recommendation.id).bold(),
        action.tab,
        action.range,
        style(&action.new_value).bold()
    );

    let outcome = app
        .pipeline()
        .apply(recommendation, &action, notes, was_modified)
        .await?;
    print_outcome(&outcome);
    Ok(())
}

pub fn print_outcome(outcome: &ApplyOutcome) {
    println!(
        "{} {}!{}: '{}' -> '{}'",
        style("✓").green().bold(),
        outcome.tab,
        outcome.range,
        outcome.original_value,
        outcome.new_value
    );
    match (&outcome.receipt_id, &outcome.receipt_error) {
        (Some(id), _) => println!("  receipt {}", style(id).bold()),
        (None, Some(error)) => println!(
            "{} change applied but no receipt was recorded: {error}",
            style("!").yellow().bold()
        ),
        (None, None) => {}
    }
}
