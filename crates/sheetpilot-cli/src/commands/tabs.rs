//! `sheetpilot tabs` and `sheetpilot tab` commands.

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use super::{OutputFormat, print_table};
use crate::app::App;

#[derive(Args)]
pub struct TabArgs {
    /// Tab name as shown in the spreadsheet
    pub name: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub async fn run_list(app: &App) -> Result<()> {
    let tabs = app.gateway.list_tabs().await.context("failed to list tabs")?;
    if tabs.is_empty() {
        println!("No tabs found");
        return Ok(());
    }

    for tab in &tabs {
        println!("{tab}");
    }
    println!("\n{} {} tab(s)", style("✓").green(), tabs.len());
    Ok(())
}

pub async fn run_show(app: &App, args: &TabArgs) -> Result<()> {
    let data = app
        .gateway
        .get_tab_data(&args.name)
        .await
        .with_context(|| format!("failed to read tab '{}'", args.name))?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&data)?),
        OutputFormat::Table if data.headers.is_empty() => println!("Tab '{}' is empty", args.name),
        OutputFormat::Table => {
            print_table(&data.headers, &data.rows);
            println!("\n{} {} row(s)", style("✓").green(), data.rows.len());
        }
    }
    Ok(())
}
