//! Sheetpilot command-line front end.
//!
//! Usage:
//! ```bash
//! sheetpilot tabs                                  # List tabs
//! sheetpilot tab Tickets --format json             # Dump one tab
//! sheetpilot doc                                   # Show the flattened document
//! sheetpilot read-cell Tickets C3                  # Read one cell
//! sheetpilot write-cell Tickets C3 Bo              # Write (and highlight) one cell
//! sheetpilot next-receipt-id                       # Next REC-NNN identifier
//! sheetpilot receipts                              # Show the audit ledger
//! sheetpilot analyze --output analysis.json        # Ask the model for recommendations
//! sheetpilot refine @rec.json --notes "use Cy"     # Revise one recommendation
//! sheetpilot apply @analysis.json --id rec-2       # Apply one recommendation
//! sheetpilot review                                # Walk recommendations interactively
//! ```
//!
//! Logs go to stderr (`RUST_LOG` controls verbosity); command output goes to
//! stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;

#[derive(Debug, Parser)]
#[command(name = "sheetpilot", author, version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every command.
#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Path to `sheetpilot.toml` (skips the directory search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Spreadsheet to use instead of the configured one
    #[arg(long, global = true)]
    pub spreadsheet_id: Option<String>,

    /// Document to use instead of the configured one
    #[arg(long, global = true)]
    pub document_id: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List the spreadsheet's tabs
    Tabs,

    /// Show one tab's headers and rows
    Tab(commands::tabs::TabArgs),

    /// Show the configured document
    Doc,

    /// Read one cell
    ReadCell(commands::cells::ReadCellArgs),

    /// Write one cell and highlight it
    WriteCell(commands::cells::WriteCellArgs),

    /// Print the next receipt identifier
    NextReceiptId,

    /// Show the receipt ledger
    Receipts(commands::receipts::ReceiptsArgs),

    /// Analyze the spreadsheet and document
    Analyze(commands::analyze::AnalyzeArgs),

    /// Revise a recommendation's action from notes
    Refine(commands::refine::RefineArgs),

    /// Apply one recommendation from a saved analysis
    Apply(commands::apply::ApplyArgs),

    /// Analyze, then review each recommendation interactively
    Review(commands::review::ReviewArgs),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tabs => f.debug_tuple("Tabs").finish(),
            Self::Tab(_) => f.debug_tuple("Tab").finish(),
            Self::Doc => f.debug_tuple("Doc").finish(),
            Self::ReadCell(_) => f.debug_tuple("ReadCell").finish(),
            Self::WriteCell(_) => f.debug_tuple("WriteCell").finish(),
            Self::NextReceiptId => f.debug_tuple("NextReceiptId").finish(),
            Self::Receipts(_) => f.debug_tuple("Receipts").finish(),
            Self::Analyze(_) => f.debug_tuple("Analyze").finish(),
            Self::Refine(_) => f.debug_tuple("Refine").finish(),
            Self::Apply(_) => f.debug_tuple("Apply").finish(),
            Self::Review(_) => f.debug_tuple("Review").finish(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("info"))
                .context("failed to parse log directive")?,
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = app::App::bootstrap(&cli.global)?;

    match &cli.command {
        Command::Tabs => commands::tabs::run_list(&app).await,
        Command::Tab(args) => commands::tabs::run_show(&app, args).await,
        Command::Doc => commands::doc::run(&app).await,
        Command::ReadCell(args) => commands::cells::run_read(&app, args).await,
        Command::WriteCell(args) => commands::cells::run_write(&app, args).await,
        Command::NextReceiptId => commands::receipts::run_next_id(&app).await,
        Command::Receipts(args) => commands::receipts::run_list(&app, args).await,
        Command::Analyze(args) => commands::analyze::run(&app, args).await,
        Command::Refine(args) => commands::refine::run(&app, args).await,
        Command::Apply(args) => commands::apply::run(&app, args).await,
        Command::Review(args) => commands::review::run(&app, args).await,
    }
}
