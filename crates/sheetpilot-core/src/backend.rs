//! Capability interfaces the pipeline depends on.
//!
//! The spreadsheet, document and language-model services are external
//! collaborators. Only the contract below is relied upon; authentication,
//! transport and rate limiting are the implementor's concern.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::{CellRef, DocumentContent};

/// Errors reported by a spreadsheet or document backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    /// The backend answered with a non-success status.
    #[error("request failed ({status}): {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be decoded.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// A tab referenced by name does not exist.
    #[error("tab '{0}' not found")]
    MissingTab(String),
}

/// Errors reported by a language-model backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    #[error("model API key is not configured")]
    MissingApiKey,

    #[error("model request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("model transport error: {0}")]
    Transport(String),

    #[error("unexpected model response: {0}")]
    Decode(String),
}

/// A tab as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub title: String,
    /// Backend-internal numeric id, needed for presentation updates.
    pub sheet_id: i64,
}

/// RGB colour with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

/// Background applied to a cell after a successful write.
pub const CHANGED_CELL_BACKGROUND: Rgb = Rgb {
    red: 217.0 / 255.0,
    green: 234.0 / 255.0,
    blue: 211.0 / 255.0,
};

/// Spreadsheet capability: read, write and annotate one spreadsheet.
#[async_trait]
pub trait SpreadsheetBackend: fmt::Debug + Send + Sync {
    /// Lists tabs in display order.
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BackendError>;

    /// Reads a range as formatted strings. Missing trailing cells are
    /// omitted, so rows may be ragged.
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, BackendError>;

    /// Writes values as if typed by a user (formulas and dates are parsed).
    async fn write_range(&self, range: &str, values: Vec<Vec<String>>) -> Result<(), BackendError>;

    /// Appends one row after the last row with data in `tab`. Values are
    /// stored verbatim: formulas and date-like text are not evaluated.
    async fn append_row(&self, tab: &str, values: Vec<String>) -> Result<(), BackendError>;

    /// Sets the background colour of a single cell.
    async fn set_background(&self, tab: &str, cell: CellRef, color: Rgb)
    -> Result<(), BackendError>;

    /// Creates a new empty tab at the end of the spreadsheet.
    async fn add_tab(&self, title: &str) -> Result<(), BackendError>;
}

/// Document capability: fetch one configured document.
#[async_trait]
pub trait DocumentBackend: fmt::Debug + Send + Sync {
    async fn get_document(&self) -> Result<DocumentContent, BackendError>;
}

/// A single-turn prompt for the model backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// One content block of a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text { text: String },
    /// Any non-text block; ignored by the pipeline.
    Other { kind: String },
}

/// Model output as an ordered list of content blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub content: Vec<ContentBlock>,
}

impl ModelResponse {
    /// Convenience constructor for a single text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Returns the first text-type block, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other { .. } => None,
        })
    }
}

/// Language-model capability.
#[async_trait]
pub trait ModelBackend: fmt::Debug + Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError>;
}
