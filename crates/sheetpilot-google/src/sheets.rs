//! Google Sheets v4 implementation of [`SpreadsheetBackend`].

use async_trait::async_trait;
use sheetpilot_core::{BackendError, CellRef, Rgb, SpreadsheetBackend, TabInfo, range::quote_tab};
use tracing::{debug, instrument};

use crate::{
    client::{GoogleAuth, GoogleClient},
    types::{
        AddSheet, AppendInput, BatchUpdateRequest, CellData, CellFormat, Color, GridRange, Ignored,
        NewSheetProperties, RepeatCell, Request, Spreadsheet, ValueRange, ValueRangeInput,
    },
};

pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4";

const USER_ENTERED: &str = "USER_ENTERED";
const RAW: &str = "RAW";

/// One spreadsheet reached through the Sheets API.
#[derive(Debug, Clone)]
pub struct GoogleSheets {
    client: GoogleClient,
    spreadsheet_id: String,
}

impl GoogleSheets {
    /// Creates a backend for `spreadsheet_id`, sharing `http` with other
    /// backends.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the access token is empty or the
    /// endpoint is malformed.
    pub fn new(
        http: reqwest::Client,
        auth: GoogleAuth,
        spreadsheet_id: impl Into<String>,
        endpoint: Option<&str>,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client: GoogleClient::new(http, endpoint.unwrap_or(DEFAULT_SHEETS_ENDPOINT), auth)?,
            spreadsheet_id: spreadsheet_id.into(),
        })
    }

    async fn batch_update(&self, requests: Vec<Request>) -> Result<(), BackendError> {
        let target = format!("{}:batchUpdate", self.spreadsheet_id);
        let url = self.client.url_with_segments(&["spreadsheets", &target])?;
        let _: Ignored = self
            .client
            .post_json(url, &BatchUpdateRequest { requests }, &[])
            .await?;
        Ok(())
    }

    async fn sheet_id(&self, tab: &str) -> Result<i64, BackendError> {
        self.list_tabs()
            .await?
            .into_iter()
            .find(|info| info.title == tab)
            .map(|info| info.sheet_id)
            .ok_or_else(|| BackendError::MissingTab(tab.to_string()))
    }
}

#[async_trait]
impl SpreadsheetBackend for GoogleSheets {
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BackendError> {
        let url = self
            .client
            .url_with_segments(&["spreadsheets", &self.spreadsheet_id])?;
        let spreadsheet: Spreadsheet = self
            .client
            .get_json(url, &[("fields", "sheets.properties(sheetId,title)")])
            .await?;

        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|sheet| TabInfo {
                title: sheet.properties.title,
                sheet_id: sheet.properties.sheet_id,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, BackendError> {
        let url = self
            .client
            .url_with_segments(&["spreadsheets", &self.spreadsheet_id, "values", range])?;
        let values: ValueRange = self.client.get_json(url, &[]).await?;

        debug!(rows = values.values.len(), "read range");
        Ok(values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    #[instrument(skip(self, values))]
    async fn write_range(&self, range: &str, values: Vec<Vec<String>>) -> Result<(), BackendError> {
        let url = self
            .client
            .url_with_segments(&["spreadsheets", &self.spreadsheet_id, "values", range])?;
        let body = ValueRangeInput {
            range,
            major_dimension: "ROWS",
            values,
        };
        let _: Ignored = self
            .client
            .put_json(url, &body, &[("valueInputOption", USER_ENTERED)])
            .await?;
        Ok(())
    }

    #[instrument(skip(self, values))]
    async fn append_row(&self, tab: &str, values: Vec<String>) -> Result<(), BackendError> {
        let target = format!("{}:append", quote_tab(tab));
        let url = self
            .client
            .url_with_segments(&["spreadsheets", &self.spreadsheet_id, "values", &target])?;
        let body = AppendInput {
            values: vec![values],
        };
        let _: Ignored = self
            .client
            .post_json(
                url,
                &body,
                &[
                    ("valueInputOption", RAW),
                    ("insertDataOption", "INSERT_ROWS"),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, color))]
    async fn set_background(
        &self,
        tab: &str,
        cell: CellRef,
        color: Rgb,
    ) -> Result<(), BackendError> {
        let sheet_id = self.sheet_id(tab).await?;
        let request = Request::RepeatCell(RepeatCell {
            range: GridRange {
                sheet_id,
                start_row_index: cell.row,
                end_row_index: cell.row + 1,
                start_column_index: cell.col,
                end_column_index: cell.col + 1,
            },
            cell: CellData {
                user_entered_format: CellFormat {
                    background_color: Color {
                        red: color.red,
                        green: color.green,
                        blue: color.blue,
                    },
                },
            },
            fields: "userEnteredFormat.backgroundColor",
        });
        self.batch_update(vec![request]).await
    }

    #[instrument(skip(self))]
    async fn add_tab(&self, title: &str) -> Result<(), BackendError> {
        self.batch_update(vec![Request::AddSheet(AddSheet {
            properties: NewSheetProperties {
                title: title.to_string(),
            },
        })])
        .await
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, body_partial_json, header, method, path, query_param},
    };

    use super::*;

    fn sheets_for(server: &MockServer) -> GoogleSheets {
        GoogleSheets::new(
            reqwest::Client::new(),
            GoogleAuth {
                access_token: "ya29.test-token".to_string(),
                project_id: Some("demo-project".to_string()),
            },
            "sheet-1",
            Some(format!("{}/v4", server.uri()).as_str()),
        )
        .unwrap()
    }

    async fn mount_tabs(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sheets": [
                    { "properties": { "sheetId": 0, "title": "Tickets" } },
                    { "properties": { "sheetId": 917, "title": "Receipts" } }
                ]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_list_tabs_returns_titles_and_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1"))
            .and(query_param("fields", "sheets.properties(sheetId,title)"))
            .and(header("authorization", "Bearer ya29.test-token"))
            .and(header("x-goog-user-project", "demo-project"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sheets": [
                    { "properties": { "sheetId": 0, "title": "Tickets" } },
                    { "properties": { "sheetId": 917, "title": "Receipts" } }
                ]
            })))
            .mount(&server)
            .await;

        let tabs = sheets_for(&server).list_tabs().await.unwrap();

        assert_eq!(
            tabs,
            vec![
                TabInfo {
                    title: "Tickets".into(),
                    sheet_id: 0
                },
                TabInfo {
                    title: "Receipts".into(),
                    sheet_id: 917
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_read_range_stringifies_cells() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1/values/'Tickets'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Tickets!A1:C2",
                "majorDimension": "ROWS",
                "values": [["Ticket", "Points", "Done"], ["T-1", 3, true]]
            })))
            .mount(&server)
            .await;

        let rows = sheets_for(&server).read_range("'Tickets'").await.unwrap();

        assert_eq!(rows, vec![vec!["Ticket", "Points", "Done"], vec!["T-1", "3", "true"]]);
    }

    #[tokio::test]
    async fn test_read_range_without_values_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1/values/'Tickets'!D9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Tickets!D9",
                "majorDimension": "ROWS"
            })))
            .mount(&server)
            .await;

        let rows = sheets_for(&server).read_range("'Tickets'!D9").await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_write_range_uses_user_entered_values() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v4/spreadsheets/sheet-1/values/'Tickets'!C3"))
            .and(query_param("valueInputOption", "USER_ENTERED"))
            .and(body_json(json!({
                "range": "'Tickets'!C3",
                "majorDimension": "ROWS",
                "values": [["=SUM(1,2)"]]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spreadsheetId": "sheet-1",
                "updatedCells": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        sheets_for(&server)
            .write_range("'Tickets'!C3", vec![vec!["=SUM(1,2)".to_string()]])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_append_row_stores_values_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-1/values/'Receipts':append"))
            .and(query_param("valueInputOption", "RAW"))
            .and(query_param("insertDataOption", "INSERT_ROWS"))
            .and(body_json(json!({ "values": [["REC-001", "=SUM(B2:B5)", "+1"]] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spreadsheetId": "sheet-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        sheets_for(&server)
            .append_row(
                "Receipts",
                vec!["REC-001".into(), "=SUM(B2:B5)".into(), "+1".into()],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_receipt_keeps_written_formula_as_text() {
        let server = MockServer::start().await;
        mount_tabs(&server).await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-1/values/'Receipts':append"))
            .and(query_param("valueInputOption", "RAW"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = sheetpilot_core::Gateway::new(
            sheetpilot_core::SheetSource::Live(std::sync::Arc::new(sheets_for(&server))),
            None,
        );
        let receipt = sheetpilot_core::Receipt {
            receipt_id: "REC-001".into(),
            timestamp: "2024-05-01T12:00:00.000Z".into(),
            recommendation_id: "rec-1".into(),
            recommendation_title: "Total the pipeline".into(),
            category: "Other".into(),
            tab: "Tickets".into(),
            cell: "B6".into(),
            original_value: String::new(),
            new_value: "=SUM(B2:B5)".into(),
            modification_notes: String::new(),
            was_modified: false,
            source_references: Vec::new(),
            applied_by: "User".into(),
            status: "Applied".into(),
        };

        let tab = gateway.append_receipt(&receipt).await.unwrap();
        assert_eq!(tab, "Receipts");

        let requests = server.received_requests().await.unwrap();
        let append = requests
            .iter()
            .find(|request| request.url.path().ends_with(":append"))
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&append.body).unwrap();
        assert_eq!(body["values"][0][8], "=SUM(B2:B5)");
    }

    #[tokio::test]
    async fn test_set_background_targets_one_cell_of_the_tab() {
        let server = MockServer::start().await;
        mount_tabs(&server).await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-1:batchUpdate"))
            .and(body_partial_json(json!({
                "requests": [{
                    "repeatCell": {
                        "range": {
                            "sheetId": 917,
                            "startRowIndex": 4,
                            "endRowIndex": 5,
                            "startColumnIndex": 1,
                            "endColumnIndex": 2
                        },
                        "fields": "userEnteredFormat.backgroundColor"
                    }
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spreadsheetId": "sheet-1",
                "replies": [{}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        sheets_for(&server)
            .set_background(
                "Receipts",
                CellRef::new(4, 1),
                sheetpilot_core::CHANGED_CELL_BACKGROUND,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_background_unknown_tab_is_missing_tab() {
        let server = MockServer::start().await;
        mount_tabs(&server).await;

        let err = sheets_for(&server)
            .set_background("Nope", CellRef::new(0, 0), sheetpilot_core::CHANGED_CELL_BACKGROUND)
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::MissingTab("Nope".into()));
    }

    #[tokio::test]
    async fn test_add_tab_posts_add_sheet() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/spreadsheets/sheet-1:batchUpdate"))
            .and(body_json(json!({
                "requests": [{ "addSheet": { "properties": { "title": "Receipts" } } }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spreadsheetId": "sheet-1",
                "replies": [{ "addSheet": { "properties": { "sheetId": 5, "title": "Receipts" } } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        sheets_for(&server).add_tab("Receipts").await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1"))
            .respond_with(ResponseTemplate::new(404).set_body_raw(
                r#"{ "error": { "code": 404, "message": "Requested entity was not found." } }"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let err = sheets_for(&server).list_tabs().await.unwrap_err();
        match err {
            BackendError::Status { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("Requested entity was not found."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let sheets = GoogleSheets::new(
            reqwest::Client::new(),
            GoogleAuth {
                access_token: "t".into(),
                project_id: None,
            },
            "sheet-1",
            Some("http://127.0.0.1:9/v4"),
        )
        .unwrap();

        let err = sheets.list_tabs().await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
