//! Google Docs v1 implementation of [`DocumentBackend`].
//!
//! The structured document is flattened into [`DocElement`]s: headings keep
//! their level, bulleted paragraphs become list items, tables become one
//! line per row with cells joined by ` | `, and blank paragraphs are dropped.

use async_trait::async_trait;
use sheetpilot_core::{BackendError, DocElement, DocumentBackend, DocumentContent};
use tracing::instrument;

use crate::{
    client::{GoogleAuth, GoogleClient},
    types::{Document, Paragraph, StructuralElement, Table},
};

pub const DEFAULT_DOCS_ENDPOINT: &str = "https://docs.googleapis.com/v1";

/// One document reached through the Docs API.
#[derive(Debug, Clone)]
pub struct GoogleDocs {
    client: GoogleClient,
    document_id: String,
}

impl GoogleDocs {
    /// Creates a backend for `document_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the access token is empty or the
    /// endpoint is malformed.
    pub fn new(
        http: reqwest::Client,
        auth: GoogleAuth,
        document_id: impl Into<String>,
        endpoint: Option<&str>,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client: GoogleClient::new(http, endpoint.unwrap_or(DEFAULT_DOCS_ENDPOINT), auth)?,
            document_id: document_id.into(),
        })
    }
}

#[async_trait]
impl DocumentBackend for GoogleDocs {
    #[instrument(skip(self), fields(document_id = %self.document_id))]
    async fn get_document(&self) -> Result<DocumentContent, BackendError> {
        let url = self
            .client
            .url_with_segments(&["documents", &self.document_id])?;
        let document: Document = self.client.get_json(url, &[]).await?;
        Ok(flatten_document(&document))
    }
}

/// Flattens a Docs API document into ordered text elements.
#[must_use]
pub fn flatten_document(document: &Document) -> DocumentContent {
    let elements = document
        .body
        .iter()
        .flat_map(|body| &body.content)
        .filter_map(flatten_element)
        .collect();

    DocumentContent {
        title: document.title.clone(),
        elements,
    }
}

fn flatten_element(element: &StructuralElement) -> Option<DocElement> {
    if let Some(paragraph) = &element.paragraph {
        return flatten_paragraph(paragraph);
    }
    element.table.as_ref().and_then(flatten_table)
}

fn flatten_paragraph(paragraph: &Paragraph) -> Option<DocElement> {
    let text = paragraph_text(paragraph);
    if text.is_empty() {
        return None;
    }

    let style = paragraph
        .paragraph_style
        .as_ref()
        .and_then(|style| style.named_style_type.as_deref());

    if let Some(level) = style.and_then(heading_level) {
        return Some(DocElement::Heading { text, level });
    }
    if paragraph.bullet.is_some() {
        return Some(DocElement::ListItem { text });
    }
    Some(DocElement::Paragraph { text })
}

fn heading_level(style: &str) -> Option<u8> {
    match style {
        "TITLE" => Some(1),
        _ => style
            .strip_prefix("HEADING_")?
            .parse()
            .ok()
            .filter(|level| (1..=6).contains(level)),
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    paragraph
        .elements
        .iter()
        .filter_map(|element| element.text_run.as_ref())
        .map(|run| run.content.as_str())
        .collect::<String>()
        .trim()
        .to_string()
}

fn flatten_table(table: &Table) -> Option<DocElement> {
    let rows: Vec<String> = table
        .table_rows
        .iter()
        .map(|row| {
            row.table_cells
                .iter()
                .map(|cell| {
                    cell.content
                        .iter()
                        .filter_map(|element| element.paragraph.as_ref())
                        .map(paragraph_text)
                        .filter(|text| !text.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect();

    if rows.iter().all(|row| row.replace('|', "").trim().is_empty()) {
        return None;
    }
    Some(DocElement::Table {
        text: rows.join("\n"),
    })
}
