//! `sheetpilot next-receipt-id` and `sheetpilot receipts` commands.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use sheetpilot_core::receipts::RECEIPT_HEADERS;

use super::{OutputFormat, print_table};
use crate::app::App;

/// Ledger columns shown in table output.
const TABLE_COLUMNS: [usize; 8] = [0, 1, 2, 5, 6, 7, 8, 10];

#[derive(Args)]
pub struct ReceiptsArgs {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub async fn run_next_id(app: &App) -> Result<()> {
    let id = app
        .gateway
        .next_receipt_id()
        .await
        .context("failed to compute the next receipt id")?;
    println!("{id}");
    Ok(())
}

pub async fn run_list(app: &App, args: &ReceiptsArgs) -> Result<()> {
    let receipts = app
        .gateway
        .list_receipts()
        .await
        .context("failed to read receipts")?;

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&receipts)?);
        return Ok(());
    }
    if receipts.is_empty() {
        println!("No receipts recorded");
        return Ok(());
    }

    let headers: Vec<String> = TABLE_COLUMNS
        .iter()
        .map(|&idx| RECEIPT_HEADERS[idx].to_string())
        .collect();
    let rows: Vec<Vec<String>> = receipts
        .iter()
        .map(|receipt| {
            let row = receipt.to_row();
            TABLE_COLUMNS
                .iter()
                .map(|&idx| row[idx].clone())
                .collect()
        })
        .collect();
    print_table(&headers, &rows);
    println!("\n{} {} receipt(s)", style("✓").green(), receipts.len());
    Ok(())
}
