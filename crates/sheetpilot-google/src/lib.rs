//! Google Sheets and Google Docs backends for Sheetpilot.
//!
//! - [`GoogleSheets`] implements [`sheetpilot_core::SpreadsheetBackend`]
//!   against the Sheets v4 REST API.
//! - [`GoogleDocs`] implements [`sheetpilot_core::DocumentBackend`] against
//!   the Docs v1 REST API.
//!
//! Both authenticate with an OAuth bearer token ([`GoogleAuth`]) and accept a
//! shared [`reqwest::Client`] so one connection pool serves the process.

mod client;
mod docs;
mod sheets;
mod types;

pub use client::GoogleAuth;
pub use docs::{DEFAULT_DOCS_ENDPOINT, GoogleDocs, flatten_document};
pub use sheets::{DEFAULT_SHEETS_ENDPOINT, GoogleSheets};
pub use types::{
    Body, Document, Paragraph, ParagraphElement, ParagraphStyle, StructuralElement, Table,
    TableCell, TableRow, TextRun,
};
