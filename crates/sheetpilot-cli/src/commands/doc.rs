//! `sheetpilot doc` command.

use anyhow::Result;
use console::style;
use sheetpilot_core::DocElement;

use crate::app::App;

pub async fn run(app: &App) -> Result<()> {
    let Some(document) = app.gateway.get_document().await else {
        println!("No document available");
        return Ok(());
    };

    println!("{}\n", style(&document.title).bold());
    for element in &document.elements {
        match element {
            DocElement::Heading { text, level } => {
                println!("{} {}", "#".repeat(usize::from(*level)), style(text).bold());
            }
            DocElement::ListItem { text } => println!("  • {text}"),
            DocElement::Paragraph { text } | DocElement::Table { text } => println!("{text}"),
        }
    }
    Ok(())
}
