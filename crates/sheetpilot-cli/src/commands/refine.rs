//! `sheetpilot refine` command.

use anyhow::{Context, Result};
use clap::Args;
use sheetpilot_core::Recommendation;

use super::read_json_arg;
use crate::app::App;

#[derive(Args)]
pub struct RefineArgs {
    /// Recommendation JSON (inline or @file.json)
    pub recommendation: String,

    /// How the proposed change should be adjusted
    #[arg(short, long)]
    pub notes: String,
}

pub async fn run(app: &App, args: &RefineArgs) -> Result<()> {
    let recommendation: Recommendation = read_json_arg(&args.recommendation)?;
    let action = app
        .refiner()
        .refine(&recommendation, &args.notes)
        .await
        .context("failed to refine recommendation")?;
    println!("{}", serde_json::to_string_pretty(&action)?);
    Ok(())
}
