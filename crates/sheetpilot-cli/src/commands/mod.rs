//! CLI command implementations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ValueEnum;
use console::style;
use serde::de::DeserializeOwned;

pub mod analyze;
pub mod apply;
pub mod cells;
pub mod doc;
pub mod receipts;
pub mod refine;
pub mod review;
pub mod tabs;

/// How listing commands print their results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Parses a JSON argument given inline or as `@path/to/file.json`.
pub fn read_json_arg<T: DeserializeOwned>(input: &str) -> Result<T> {
    let text = match input.strip_prefix('@') {
        Some(path) => {
            let path = PathBuf::from(path);
            std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read input file: {}", path.display()))?
        }
        None => input.to_string(),
    };
    serde_json::from_str(&text).context("invalid input JSON")
}

/// Prints rows under bold headers, padding each column to its widest cell.
pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![0usize; columns];
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let header_line = widths
        .iter()
        .enumerate()
        .map(|(idx, width)| {
            let cell = headers.get(idx).map_or("", String::as_str);
            format!("{:<width$}", style(cell).bold())
        })
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", header_line.trim_end());
    println!("{}", "-".repeat(widths.iter().sum::<usize>() + 2 * columns.saturating_sub(1)));

    for row in rows {
        let line = widths
            .iter()
            .enumerate()
            .map(|(idx, width)| format!("{:<width$}", row.get(idx).map_or("", String::as_str)))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", line.trim_end());
    }
}
