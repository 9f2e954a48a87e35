//! `sheetpilot read-cell` and `sheetpilot write-cell` commands.

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use crate::app::App;

#[derive(Args)]
pub struct ReadCellArgs {
    pub tab: String,

    /// Single-cell reference, e.g. `C3`
    pub cell: String,
}

#[derive(Args)]
pub struct WriteCellArgs {
    pub tab: String,

    /// Single-cell reference, e.g. `C3`
    pub cell: String,

    pub value: String,
}

pub async fn run_read(app: &App, args: &ReadCellArgs) -> Result<()> {
    let value = app
        .gateway
        .read_cell(&args.tab, &args.cell)
        .await
        .with_context(|| format!("failed to read {}!{}", args.tab, args.cell))?;
    println!("{value}");
    Ok(())
}

pub async fn run_write(app: &App, args: &WriteCellArgs) -> Result<()> {
    app.gateway
        .write_cell(&args.tab, &args.cell, &args.value)
        .await
        .with_context(|| format!("failed to write {}!{}", args.tab, args.cell))?;
    println!(
        "{} Wrote {} to {}!{}",
        style("✓").green().bold(),
        style(&args.value).bold(),
        args.tab,
        args.cell
    );
    Ok(())
}
