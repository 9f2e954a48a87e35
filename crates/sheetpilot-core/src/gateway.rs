//! Uniform read/write access to the spreadsheet and document backends.
//!
//! The [`Gateway`] converts backend failures into the [`GatewayError`]
//! taxonomy and serves canned data when no spreadsheet is configured.
//! Document problems are always soft: [`Gateway::get_document`] logs and
//! returns `None`.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::{
    BackendError, CHANGED_CELL_BACKGROUND, DocumentBackend, DocumentContent, SpreadsheetBackend,
    TabData,
    demo::{DEMO_TABS, demo_tab_data},
    range::{parse_cell_ref, qualified_range},
};

/// Errors surfaced by gateway operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    /// Credential or permission failure against a backend.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The spreadsheet or tab does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Any other backend failure, with the backend message passed through.
    #[error("{context}: {message}")]
    Backend { context: String, message: String },

    /// The range is not a single A1 cell reference.
    #[error("invalid cell reference '{0}': expected column letters followed by a row number")]
    InvalidRange(String),

    /// A write was attempted without a configured spreadsheet.
    #[error("no spreadsheet is configured (demo mode)")]
    DemoMode,
}

/// Where spreadsheet data comes from.
#[derive(Debug, Clone)]
pub enum SheetSource {
    /// Offline mode serving canned tabs; writes are rejected.
    Demo,
    /// A live spreadsheet backend.
    Live(Arc<dyn SpreadsheetBackend>),
}

/// Read/write facade over the configured backends.
#[derive(Debug, Clone)]
pub struct Gateway {
    sheets: SheetSource,
    documents: Option<Arc<dyn DocumentBackend>>,
}

impl Gateway {
    #[must_use]
    pub fn new(sheets: SheetSource, documents: Option<Arc<dyn DocumentBackend>>) -> Self {
        Self { sheets, documents }
    }

    /// A gateway with no spreadsheet and no document configured.
    #[must_use]
    pub fn demo() -> Self {
        Self::new(SheetSource::Demo, None)
    }

    #[must_use]
    pub fn is_demo(&self) -> bool {
        matches!(self.sheets, SheetSource::Demo)
    }

    pub(crate) fn live(&self) -> Result<&Arc<dyn SpreadsheetBackend>, GatewayError> {
        match &self.sheets {
            SheetSource::Live(backend) => Ok(backend),
            SheetSource::Demo => Err(GatewayError::DemoMode),
        }
    }

    /// Lists tab names in display order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Auth`], [`GatewayError::NotFound`] or
    /// [`GatewayError::Backend`] when the backend call fails.
    #[instrument(skip(self))]
    pub async fn list_tabs(&self) -> Result<Vec<String>, GatewayError> {
        let backend = match &self.sheets {
            SheetSource::Demo => {
                debug!("no spreadsheet configured, serving demo tabs");
                return Ok(DEMO_TABS.iter().map(ToString::to_string).collect());
            }
            SheetSource::Live(backend) => backend,
        };

        let tabs = backend
            .list_tabs()
            .await
            .map_err(|e| classify(e, "failed to fetch tabs", || "Spreadsheet not found".into()))?;
        Ok(tabs.into_iter().map(|tab| tab.title).collect())
    }

    /// Fetches a tab as header row plus data rows.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when the tab does not exist, and
    /// [`GatewayError::Auth`] or [`GatewayError::Backend`] for other failures.
    #[instrument(skip(self))]
    pub async fn get_tab_data(&self, tab: &str) -> Result<TabData, GatewayError> {
        let backend = match &self.sheets {
            SheetSource::Demo => return Ok(demo_tab_data(tab)),
            SheetSource::Live(backend) => backend,
        };

        let rows = backend
            .read_range(&crate::range::quote_tab(tab))
            .await
            .map_err(|e| {
                classify(e, &format!("failed to fetch tab '{tab}'"), || {
                    format!("Tab '{tab}' not found")
                })
            })?;
        debug!(rows = rows.len(), "fetched tab data");
        Ok(TabData::from_rows(rows))
    }

    /// Fetches the configured document, if any.
    ///
    /// Returns `None` when no document is configured or the fetch fails.
    #[instrument(skip(self))]
    pub async fn get_document(&self) -> Option<DocumentContent> {
        let documents = self.documents.as_ref()?;
        match documents.get_document().await {
            Ok(document) => {
                debug!(elements = document.elements.len(), "fetched document");
                Some(document)
            }
            Err(error) => {
                warn!(%error, "failed to fetch document, continuing without it");
                None
            }
        }
    }

    /// Writes a single cell, then marks it with the changed-cell background.
    ///
    /// The highlight is best-effort: its failure is logged and never turns a
    /// successful write into an error.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRange`] for a non-cell range,
    /// [`GatewayError::DemoMode`] without a spreadsheet, or the classified
    /// backend failure of the value write.
    #[instrument(skip(self, value))]
    pub async fn write_cell(&self, tab: &str, range: &str, value: &str) -> Result<(), GatewayError> {
        let cell = parse_cell_ref(range).ok_or_else(|| GatewayError::InvalidRange(range.into()))?;
        let backend = self.live()?;
        let target = qualified_range(tab, range);

        backend
            .write_range(&target, vec![vec![value.to_string()]])
            .await
            .map_err(|e| {
                classify(e, &format!("failed to write {target}"), || {
                    format!("Tab '{tab}' not found")
                })
            })?;
        debug!(%target, "cell written");

        if let Err(error) = backend
            .set_background(tab, cell, CHANGED_CELL_BACKGROUND)
            .await
        {
            warn!(%target, %error, "failed to highlight written cell");
        }

        Ok(())
    }

    /// Appends one row to the end of `tab`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DemoMode`] without a spreadsheet, or the
    /// classified backend failure.
    #[instrument(skip(self, values))]
    pub async fn append_row(&self, tab: &str, values: Vec<String>) -> Result<(), GatewayError> {
        self.live()?.append_row(tab, values).await.map_err(|e| {
            classify(e, &format!("failed to append to '{tab}'"), || {
                format!("Tab '{tab}' not found")
            })
        })
    }

    /// Reads one cell's current value; an empty cell reads as `""`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRange`] for a non-cell range, or the
    /// classified backend failure.
    #[instrument(skip(self))]
    pub async fn read_cell(&self, tab: &str, range: &str) -> Result<String, GatewayError> {
        let cell = parse_cell_ref(range).ok_or_else(|| GatewayError::InvalidRange(range.into()))?;

        let backend = match &self.sheets {
            SheetSource::Demo => return Ok(demo_cell(tab, cell.row, cell.col)),
            SheetSource::Live(backend) => backend,
        };

        let target = qualified_range(tab, range);
        let rows = backend.read_range(&target).await.map_err(|e| {
            classify(e, &format!("failed to read {target}"), || {
                format!("Tab '{tab}' not found")
            })
        })?;

        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or_default())
    }

    /// Creates a new tab.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DemoMode`] without a spreadsheet, or the
    /// classified backend failure.
    pub async fn add_tab(&self, title: &str) -> Result<(), GatewayError> {
        self.live()?
            .add_tab(title)
            .await
            .map_err(|e| classify(e, &format!("failed to create tab '{title}'"), || {
                "Spreadsheet not found".into()
            }))
    }
}

fn demo_cell(tab: &str, row: u32, col: u32) -> String {
    let data = demo_tab_data(tab);
    let (Ok(row), Ok(col)) = (usize::try_from(row), usize::try_from(col)) else {
        return String::new();
    };
    let line = if row == 0 {
        Some(&data.headers)
    } else {
        data.rows.get(row - 1)
    };
    line.and_then(|cells| cells.get(col))
        .cloned()
        .unwrap_or_default()
}

/// Maps a backend failure onto the gateway taxonomy.
pub(crate) fn classify(
    error: BackendError,
    context: &str,
    not_found: impl FnOnce() -> String,
) -> GatewayError {
    let message = error.to_string();
    let lowered = message.to_ascii_lowercase();

    match &error {
        BackendError::Status { status: 401, .. } => GatewayError::Auth(message),
        _ if lowered.contains("invalid_grant") || lowered.contains("invalid grant") => {
            GatewayError::Auth(message)
        }
        BackendError::Status { status: 404, .. } | BackendError::MissingTab(_) => {
            GatewayError::NotFound(not_found())
        }
        _ if lowered.contains("not found") => GatewayError::NotFound(not_found()),
        _ => GatewayError::Backend {
            context: context.to_string(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CellRef, DocElement,
        testing::{StubDocuments, StubSpreadsheet},
    };

    #[tokio::test]
    async fn test_demo_list_tabs_returns_fixed_set() {
        let gateway = Gateway::demo();
        assert_eq!(
            gateway.list_tabs().await.unwrap(),
            ["Pipeline", "Approved", "Rejected"]
        );
    }

    #[tokio::test]
    async fn test_demo_get_tab_data_returns_canned_table() {
        let data = Gateway::demo().get_tab_data("Approved").await.unwrap();
        assert_eq!(data.headers, ["Company", "Amount", "Close Date", "Owner"]);
        assert_eq!(data.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_demo_read_cell_uses_display_coordinates() {
        let gateway = Gateway::demo();
        assert_eq!(gateway.read_cell("Approved", "A1").await.unwrap(), "Company");
        assert_eq!(gateway.read_cell("Approved", "D3").await.unwrap(), "Sarah");
        assert_eq!(gateway.read_cell("Approved", "Z99").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_demo_write_cell_is_rejected() {
        let err = Gateway::demo()
            .write_cell("Pipeline", "B2", "x")
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::DemoMode);
    }

    #[tokio::test]
    async fn test_get_tab_data_zero_rows_is_empty_not_error() {
        let stub = StubSpreadsheet::new().with_tab("Empty", Vec::new());
        let gateway = stub.gateway();

        let data = gateway.get_tab_data("Empty").await.unwrap();
        assert!(data.headers.is_empty());
        assert!(data.rows.is_empty());
    }

    #[tokio::test]
    async fn test_get_tab_data_missing_tab_is_not_found() {
        let gateway = StubSpreadsheet::new().gateway();
        let err = gateway.get_tab_data("Nope").await.unwrap_err();
        assert_eq!(err, GatewayError::NotFound("Tab 'Nope' not found".into()));
    }

    #[tokio::test]
    async fn test_list_tabs_classifies_unauthorized_as_auth() {
        let stub = StubSpreadsheet::new();
        stub.fail_list_with(BackendError::Status {
            status: 401,
            message: "Request had invalid authentication credentials.".into(),
        });
        let err = stub.gateway().list_tabs().await.unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));
    }

    #[tokio::test]
    async fn test_list_tabs_classifies_invalid_grant_as_auth() {
        let stub = StubSpreadsheet::new();
        stub.fail_list_with(BackendError::Status {
            status: 400,
            message: r#"{"error":"invalid_grant"}"#.into(),
        });
        let err = stub.gateway().list_tabs().await.unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));
    }

    #[tokio::test]
    async fn test_list_tabs_classifies_404_as_not_found() {
        let stub = StubSpreadsheet::new();
        stub.fail_list_with(BackendError::Status {
            status: 404,
            message: "Requested entity was not found.".into(),
        });
        let err = stub.gateway().list_tabs().await.unwrap_err();
        assert_eq!(err, GatewayError::NotFound("Spreadsheet not found".into()));
    }

    #[tokio::test]
    async fn test_list_tabs_wraps_other_failures_with_message() {
        let stub = StubSpreadsheet::new();
        stub.fail_list_with(BackendError::Transport("connection reset".into()));
        let err = stub.gateway().list_tabs().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to fetch tabs: transport error: connection reset"
        );
    }

    #[tokio::test]
    async fn test_write_cell_writes_value_and_highlights() {
        let stub = StubSpreadsheet::new().with_tab("Pipeline", vec![vec!["Company".into()]]);
        let gateway = stub.gateway();

        gateway.write_cell("Pipeline", "B5", "=SUM(1,2)").await.unwrap();

        assert_eq!(stub.cell("Pipeline", CellRef::new(4, 1)), Some("=SUM(1,2)".into()));
        assert_eq!(
            stub.highlighted(),
            vec![("Pipeline".to_string(), CellRef::new(4, 1))]
        );
    }

    #[tokio::test]
    async fn test_write_cell_highlight_failure_keeps_success() {
        let stub = StubSpreadsheet::new().with_tab("Pipeline", Vec::new());
        stub.fail_highlight();
        let gateway = stub.gateway();

        assert!(gateway.write_cell("Pipeline", "A2", "Kim").await.is_ok());
        assert_eq!(stub.cell("Pipeline", CellRef::new(1, 0)), Some("Kim".into()));
        assert!(stub.highlighted().is_empty());
    }

    #[tokio::test]
    async fn test_write_cell_rejects_multi_cell_range() {
        let stub = StubSpreadsheet::new().with_tab("Pipeline", Vec::new());
        let err = stub
            .gateway()
            .write_cell("Pipeline", "A1:B2", "x")
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::InvalidRange("A1:B2".into()));
        assert!(stub.writes().is_empty());
    }

    #[tokio::test]
    async fn test_read_cell_returns_empty_string_for_empty_cell() {
        let stub = StubSpreadsheet::new().with_tab(
            "Pipeline",
            vec![vec!["Company".into(), "Owner".into()], vec!["Acme".into()]],
        );
        let gateway = stub.gateway();
        assert_eq!(gateway.read_cell("Pipeline", "A2").await.unwrap(), "Acme");
        assert_eq!(gateway.read_cell("Pipeline", "B2").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_get_document_none_when_not_configured() {
        assert!(Gateway::demo().get_document().await.is_none());
    }

    #[tokio::test]
    async fn test_get_document_failure_is_soft() {
        let docs = StubDocuments::failing();
        let gateway = Gateway::new(SheetSource::Demo, Some(Arc::new(docs)));
        assert!(gateway.get_document().await.is_none());
    }

    #[tokio::test]
    async fn test_get_document_returns_content() {
        let docs = StubDocuments::with(DocumentContent {
            title: "Standup".into(),
            elements: vec![DocElement::Paragraph {
                text: "Kim owns Globex".into(),
            }],
        });
        let gateway = Gateway::new(SheetSource::Demo, Some(Arc::new(docs)));
        let document = gateway.get_document().await.unwrap();
        assert_eq!(document.title, "Standup");
    }
}
