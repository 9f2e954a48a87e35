//! `sheetpilot analyze` command.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use console::style;

use crate::app::App;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Analysis mode: `single-source` or `cross-reference` (default from config)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Write the analysis JSON to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(app: &App, args: &AnalyzeArgs) -> Result<()> {
    let mode = app.mode_or_default(args.mode.as_deref())?;
    let analyzer = app.analyzer(mode);

    eprintln!(
        "{} Analyzing ({} to {} recommendations)...",
        style("→").cyan(),
        analyzer.profile().min_recommendations,
        analyzer.profile().max_recommendations
    );
    let result = analyzer.analyze().await;

    if let Some(error) = &result.error {
        bail!("analysis failed: {error}");
    }

    let json = serde_json::to_string_pretty(&result)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write analysis: {}", path.display()))?;
            println!(
                "{} {} recommendation(s) written to {}",
                style("✓").green().bold(),
                result.recommendations.len(),
                style(path.display()).bold()
            );
            println!("\n{}", result.summary);
        }
        None => println!("{json}"),
    }
    Ok(())
}
