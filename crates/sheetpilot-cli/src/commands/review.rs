//! `sheetpilot review`: analyze, then walk each recommendation card.
//!
//! Each card offers apply, modify (refine with notes), skip or quit. Card
//! state lives in a [`Session`], so an applied card cannot be applied twice
//! and a refined action replaces the original one for the apply.

use std::io::Write as _;

use anyhow::{Result, bail};
use clap::Args;
use console::style;
use sheetpilot_core::Session;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use super::apply::print_outcome;
use crate::app::App;

#[derive(Args)]
pub struct ReviewArgs {
    /// Analysis mode: `single-source` or `cross-reference` (default from config)
    #[arg(short, long)]
    pub mode: Option<String>,
}

pub async fn run(app: &App, args: &ReviewArgs) -> Result<()> {
    let mode = app.mode_or_default(args.mode.as_deref())?;

    eprintln!("{} Analyzing...", style("→").cyan());
    let result = app.analyzer(mode).analyze().await;
    if let Some(error) = &result.error {
        bail!("analysis failed: {error}");
    }
    if result.recommendations.is_empty() {
        println!("{}\n\nNo recommendations.", result.summary);
        return Ok(());
    }
    println!("{}\n", style(&result.summary).italic());

    let mut session = Session::new(result);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    review(app, &mut session, &mut lines).await?;

    let applied = applied_count(&session);
    println!(
        "\n{} {applied} of {} recommendation(s) applied",
        style("✓").green().bold(),
        session.result().recommendations.len()
    );
    Ok(())
}

async fn review<R>(app: &App, session: &mut Session, lines: &mut Lines<R>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let ids: Vec<String> = session
        .result()
        .recommendations
        .iter()
        .map(|rec| rec.id.clone())
        .collect();
    let total = ids.len();

    for (idx, id) in ids.iter().enumerate() {
        loop {
            print_card(session, id, idx + 1, total);
            let Some(choice) = prompt(lines, "[a]pply  [m]odify  [s]kip  [q]uit > ").await? else {
                return Ok(());
            };

            match choice.trim().to_ascii_lowercase().as_str() {
                "a" | "apply" => {
                    if apply_card(app, session, id).await? {
                        break;
                    }
                }
                "m" | "modify" => {
                    let Some(notes) = prompt(lines, "notes > ").await? else {
                        return Ok(());
                    };
                    if notes.trim().is_empty() {
                        println!("No notes given, keeping the current action");
                        continue;
                    }
                    modify_card(app, session, id, notes).await?;
                }
                "" | "s" | "skip" => break,
                "q" | "quit" => return Ok(()),
                other => println!("Unknown choice '{other}'"),
            }
        }
    }
    Ok(())
}

/// Returns whether the card ended up applied.
async fn apply_card(app: &App, session: &mut Session, id: &str) -> Result<bool> {
    let pending = session.begin_apply(id)?;
    let outcome = app
        .pipeline()
        .apply(
            &pending.recommendation,
            &pending.action,
            &pending.notes,
            pending.was_modified,
        )
        .await;

    match outcome {
        Ok(outcome) => {
            print_outcome(&outcome);
            session.finish_apply(id, Ok(()))?;
            Ok(true)
        }
        Err(error) => {
            session.finish_apply(id, Err(error.to_string()))?;
            Ok(false)
        }
    }
}

async fn modify_card(app: &App, session: &mut Session, id: &str, notes: String) -> Result<()> {
    session.set_notes(id, notes)?;
    let pending = session.begin_modify(id)?;
    let outcome = app
        .refiner()
        .refine(&pending.recommendation, &pending.notes)
        .await
        .map_err(|e| e.to_string());
    session.finish_modify(id, outcome)?;
    Ok(())
}

fn print_card(session: &Session, id: &str, position: usize, total: usize) {
    let Some(rec) = session.result().recommendation(id) else {
        return;
    };

    println!(
        "{} {} {}",
        style(format!("[{position}/{total}]")).dim(),
        style(&rec.title).bold(),
        style(format!("({})", rec.category)).cyan()
    );
    println!("  {}", rec.description);
    if !rec.source_references.is_empty() {
        println!("  sources: {}", rec.source_references.join("; "));
    }
    if let Some(action) = session.effective_action(id) {
        let marker = if session.was_modified(id) { " (modified)" } else { "" };
        println!(
            "  {}!{} -> {}{marker}",
            action.tab,
            action.range,
            style(&action.new_value).bold()
        );
    }
    if let Some(error) = session.card(id).and_then(|card| card.error.as_deref()) {
        println!("  {} {error}", style("error:").red().bold());
    }
}

async fn prompt<R>(lines: &mut Lines<R>, label: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

fn applied_count(session: &Session) -> usize {
    session
        .result()
        .recommendations
        .iter()
        .filter(|rec| session.card(&rec.id).is_some_and(|card| card.applied))
        .count()
}
