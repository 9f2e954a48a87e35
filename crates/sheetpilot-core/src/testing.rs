//! In-memory backends for unit tests.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    BackendError, CellRef, DocumentBackend, DocumentContent, Gateway, ModelBackend, ModelError,
    ModelRequest, ModelResponse, Rgb, SheetSource, SpreadsheetBackend, TabInfo,
    range::parse_cell_ref,
};

#[derive(Debug, Default)]
struct SheetState {
    tabs: Vec<(String, Vec<Vec<String>>)>,
    writes: Vec<String>,
    appends: Vec<(String, Vec<String>)>,
    highlights: Vec<(String, CellRef)>,
    broken_tabs: Vec<String>,
    list_error: Option<BackendError>,
    fail_reads: bool,
    fail_writes: bool,
    fail_appends: bool,
    fail_highlight: bool,
}

/// Spreadsheet stub keeping every tab as a ragged grid.
#[derive(Debug, Clone, Default)]
pub(crate) struct StubSpreadsheet {
    state: Arc<Mutex<SheetState>>,
}

fn split_range(range: &str) -> (String, Option<&str>) {
    match range.rfind("'!") {
        Some(idx) => (
            range[1..idx].replace("''", "'"),
            Some(&range[idx + 2..]),
        ),
        None => (
            range.trim_matches('\'').replace("''", "'"),
            None,
        ),
    }
}

impl StubSpreadsheet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_tab(self, name: &str, rows: Vec<Vec<String>>) -> Self {
        self.state.lock().unwrap().tabs.push((name.to_string(), rows));
        self
    }

    /// Adds a tab that is listed but fails every read.
    pub(crate) fn with_broken_tab(self, name: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.tabs.push((name.to_string(), Vec::new()));
            state.broken_tabs.push(name.to_string());
        }
        self
    }

    pub(crate) fn gateway(&self) -> Gateway {
        Gateway::new(SheetSource::Live(Arc::new(self.clone())), None)
    }

    pub(crate) fn fail_list_with(&self, error: BackendError) {
        self.state.lock().unwrap().list_error = Some(error);
    }

    pub(crate) fn fail_reads(&self) {
        self.state.lock().unwrap().fail_reads = true;
    }

    pub(crate) fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    pub(crate) fn fail_appends(&self) {
        self.state.lock().unwrap().fail_appends = true;
    }

    pub(crate) fn fail_highlight(&self) {
        self.state.lock().unwrap().fail_highlight = true;
    }

    pub(crate) fn cell(&self, tab: &str, cell: CellRef) -> Option<String> {
        let state = self.state.lock().unwrap();
        let (_, rows) = state.tabs.iter().find(|(name, _)| name == tab)?;
        rows.get(cell.row as usize)?.get(cell.col as usize).cloned()
    }

    pub(crate) fn rows(&self, tab: &str) -> Vec<Vec<String>> {
        let state = self.state.lock().unwrap();
        state
            .tabs
            .iter()
            .find(|(name, _)| name == tab)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default()
    }

    pub(crate) fn writes(&self) -> Vec<String> {
        self.state.lock().unwrap().writes.clone()
    }

    pub(crate) fn appends(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().unwrap().appends.clone()
    }

    pub(crate) fn highlighted(&self) -> Vec<(String, CellRef)> {
        self.state.lock().unwrap().highlights.clone()
    }

    pub(crate) fn tab_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.tabs.iter().map(|(name, _)| name.clone()).collect()
    }
}

#[async_trait]
impl SpreadsheetBackend for StubSpreadsheet {
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BackendError> {
        let state = self.state.lock().unwrap();
        if let Some(error) = &state.list_error {
            return Err(error.clone());
        }
        Ok(state
            .tabs
            .iter()
            .enumerate()
            .map(|(idx, (title, _))| TabInfo {
                title: title.clone(),
                sheet_id: i64::try_from(idx).unwrap(),
            })
            .collect())
    }

    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, BackendError> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(BackendError::Transport("read refused".into()));
        }
        let (tab, cells) = split_range(range);
        if state.broken_tabs.contains(&tab) {
            return Err(BackendError::Status {
                status: 500,
                message: "Internal error encountered.".into(),
            });
        }
        let (_, rows) = state
            .tabs
            .iter()
            .find(|(name, _)| *name == tab)
            .ok_or(BackendError::MissingTab(tab.clone()))?;

        match cells {
            None => Ok(rows.clone()),
            Some("A:A") => Ok(rows
                .iter()
                .map(|row| row.first().cloned().into_iter().collect())
                .collect()),
            Some(cell) => {
                let cell = parse_cell_ref(cell).unwrap();
                Ok(rows
                    .get(cell.row as usize)
                    .and_then(|row| row.get(cell.col as usize))
                    .filter(|value| !value.is_empty())
                    .map(|value| vec![vec![value.clone()]])
                    .unwrap_or_default())
            }
        }
    }

    async fn write_range(&self, range: &str, values: Vec<Vec<String>>) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(BackendError::Status {
                status: 500,
                message: "write refused".into(),
            });
        }
        state.writes.push(range.to_string());
        let (tab, cell) = split_range(range);
        let cell = parse_cell_ref(cell.unwrap()).unwrap();
        let (_, rows) = state
            .tabs
            .iter_mut()
            .find(|(name, _)| *name == tab)
            .ok_or(BackendError::MissingTab(tab.clone()))?;

        let (row, col) = (cell.row as usize, cell.col as usize);
        if rows.len() <= row {
            rows.resize(row + 1, Vec::new());
        }
        if rows[row].len() <= col {
            rows[row].resize(col + 1, String::new());
        }
        rows[row][col] = values[0][0].clone();
        Ok(())
    }

    async fn append_row(&self, tab: &str, values: Vec<String>) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_appends {
            return Err(BackendError::Status {
                status: 403,
                message: "append refused".into(),
            });
        }
        state.appends.push((tab.to_string(), values.clone()));
        let (_, rows) = state
            .tabs
            .iter_mut()
            .find(|(name, _)| name == tab)
            .ok_or(BackendError::MissingTab(tab.to_string()))?;
        rows.push(values);
        Ok(())
    }

    async fn set_background(
        &self,
        tab: &str,
        cell: CellRef,
        _color: Rgb,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_highlight {
            return Err(BackendError::Transport("format refused".into()));
        }
        state.highlights.push((tab.to_string(), cell));
        Ok(())
    }

    async fn add_tab(&self, title: &str) -> Result<(), BackendError> {
        self.state
            .lock()
            .unwrap()
            .tabs
            .push((title.to_string(), Vec::new()));
        Ok(())
    }
}

/// Document stub returning a fixed document or a failure.
#[derive(Debug)]
pub(crate) struct StubDocuments {
    document: Option<DocumentContent>,
}

impl StubDocuments {
    pub(crate) fn with(document: DocumentContent) -> Self {
        Self {
            document: Some(document),
        }
    }

    pub(crate) fn failing() -> Self {
        Self { document: None }
    }
}

#[async_trait]
impl DocumentBackend for StubDocuments {
    async fn get_document(&self) -> Result<DocumentContent, BackendError> {
        self.document.clone().ok_or(BackendError::Status {
            status: 403,
            message: "The caller does not have permission".into(),
        })
    }
}

/// Model stub replaying queued responses and recording requests.
#[derive(Debug, Clone, Default)]
pub(crate) struct StubModel {
    responses: Arc<Mutex<VecDeque<Result<ModelResponse, ModelError>>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl StubModel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn replying(self, text: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(ModelResponse::text(text)));
        self
    }

    pub(crate) fn failing(self, error: ModelError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub(crate) fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for StubModel {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Transport("no queued response".into())))
    }
}
