//! Receipt ledger: an append-only audit tab of applied changes.
//!
//! Receipts live in a dedicated tab whose name matches `receipts` (or the
//! common misspelling `reciepts`) ignoring case and whitespace. Column A
//! holds `REC-NNN` identifiers.
//!
//! Identifier generation scans the ledger and increments the maximum.
//! [`Gateway::next_receipt_id`] is unsynchronized on its own; callers that
//! append concurrently must serialize the scan and the append, as
//! [`ApplyPipeline`](crate::ApplyPipeline) does.
//!
//! Ledger rows are appended verbatim, so a formula that was written to a
//! cell is recorded as its text.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{Gateway, GatewayError, gateway::classify, range::qualified_range};

/// Name used when the ledger tab has to be created.
pub const RECEIPTS_TAB: &str = "Receipts";

/// Header row of the ledger tab, in column order.
pub const RECEIPT_HEADERS: [&str; 14] = [
    "Receipt ID",
    "Timestamp",
    "Recommendation ID",
    "Recommendation Title",
    "Category",
    "Tab",
    "Cell",
    "Original Value",
    "New Value",
    "Modification Notes",
    "Was Modified",
    "Source References",
    "Applied By",
    "Status",
];

const RECEIPT_PREFIX: &str = "REC-";
const SOURCE_SEPARATOR: &str = "; ";

/// Recorded for every receipt; there is no multi-user identity.
pub const APPLIED_BY: &str = "User";
/// Status of every recorded receipt.
pub const STATUS_APPLIED: &str = "Applied";

/// Audit record of one applied cell write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub receipt_id: String,
    /// ISO-8601 time of the apply.
    pub timestamp: String,
    pub recommendation_id: String,
    pub recommendation_title: String,
    pub category: String,
    pub tab: String,
    pub cell: String,
    /// Value read immediately before the write.
    pub original_value: String,
    /// Value actually written.
    pub new_value: String,
    pub modification_notes: String,
    pub was_modified: bool,
    pub source_references: Vec<String>,
    pub applied_by: String,
    pub status: String,
}

impl Receipt {
    /// Serializes the receipt in [`RECEIPT_HEADERS`] order.
    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.receipt_id.clone(),
            self.timestamp.clone(),
            self.recommendation_id.clone(),
            self.recommendation_title.clone(),
            self.category.clone(),
            self.tab.clone(),
            self.cell.clone(),
            self.original_value.clone(),
            self.new_value.clone(),
            self.modification_notes.clone(),
            if self.was_modified { "Yes" } else { "No" }.to_string(),
            self.source_references.join(SOURCE_SEPARATOR),
            self.applied_by.clone(),
            self.status.clone(),
        ]
    }

    /// Parses a ledger row. Missing trailing cells read as empty.
    #[must_use]
    pub fn from_row(row: &[String]) -> Self {
        let cell = |idx: usize| row.get(idx).cloned().unwrap_or_default();
        let sources = cell(11);

        Self {
            receipt_id: cell(0),
            timestamp: cell(1),
            recommendation_id: cell(2),
            recommendation_title: cell(3),
            category: cell(4),
            tab: cell(5),
            cell: cell(6),
            original_value: cell(7),
            new_value: cell(8),
            modification_notes: cell(9),
            was_modified: cell(10).trim().eq_ignore_ascii_case("yes"),
            source_references: sources
                .split(SOURCE_SEPARATOR.trim())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect(),
            applied_by: cell(12),
            status: cell(13),
        }
    }
}

/// Whether a tab name denotes the receipts ledger.
#[must_use]
pub fn is_receipts_tab(name: &str) -> bool {
    let normalized: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    normalized == "receipts" || normalized == "reciepts"
}

/// Formats a receipt number as `REC-NNN`.
#[must_use]
pub fn format_receipt_id(number: u64) -> String {
    format!("{RECEIPT_PREFIX}{number:03}")
}

/// Extracts the numeric suffix of a `REC-<digits>` identifier.
#[must_use]
pub fn parse_receipt_number(id: &str) -> Option<u64> {
    let digits = id.trim().strip_prefix(RECEIPT_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Computes the identifier following the largest one in `ids`.
pub fn next_receipt_id_after<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    let max = ids
        .into_iter()
        .filter_map(parse_receipt_number)
        .max()
        .unwrap_or(0);
    format_receipt_id(max.saturating_add(1))
}

impl Gateway {
    /// Finds the ledger tab, matching case- and space-insensitively.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of listing tabs.
    pub async fn find_receipts_tab(&self) -> Result<Option<String>, GatewayError> {
        let tabs = self.list_tabs().await?;
        Ok(tabs.into_iter().find(|tab| is_receipts_tab(tab)))
    }

    /// Returns the next receipt identifier (`REC-001` for an absent or empty
    /// ledger).
    ///
    /// # Errors
    ///
    /// Returns the classified failure of listing tabs or reading column A.
    #[instrument(skip(self))]
    pub async fn next_receipt_id(&self) -> Result<String, GatewayError> {
        let Some(tab) = self.find_receipts_tab().await? else {
            return Ok(format_receipt_id(1));
        };

        let column = qualified_range(&tab, "A:A");
        let rows = self
            .live()?
            .read_range(&column)
            .await
            .map_err(|e| classify(e, &format!("failed to read {column}"), || {
                format!("Tab '{tab}' not found")
            }))?;

        let id = next_receipt_id_after(rows.iter().filter_map(|row| row.first()).map(String::as_str));
        debug!(%id, "computed next receipt id");
        Ok(id)
    }

    /// Appends a receipt to the ledger, creating the ledger tab (with its
    /// header row) when none exists. Returns the tab written to.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DemoMode`] without a spreadsheet, or the
    /// classified failure of creating the tab or appending the row.
    #[instrument(skip(self, receipt), fields(receipt_id = %receipt.receipt_id))]
    pub async fn append_receipt(&self, receipt: &Receipt) -> Result<String, GatewayError> {
        self.live()?;

        let tab = if let Some(tab) = self.find_receipts_tab().await? {
            tab
        } else {
            info!(tab = RECEIPTS_TAB, "creating receipts tab");
            self.add_tab(RECEIPTS_TAB).await?;
            self.append_row(
                RECEIPTS_TAB,
                RECEIPT_HEADERS.iter().map(ToString::to_string).collect(),
            )
            .await?;
            RECEIPTS_TAB.to_string()
        };

        self.append_row(&tab, receipt.to_row()).await?;
        Ok(tab)
    }

    /// Reads every receipt in ledger order. Empty when no ledger exists.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of listing tabs or reading the ledger.
    pub async fn list_receipts(&self) -> Result<Vec<Receipt>, GatewayError> {
        let Some(tab) = self.find_receipts_tab().await? else {
            return Ok(Vec::new());
        };
        let data = self.get_tab_data(&tab).await?;
        Ok(data
            .rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|row| Receipt::from_row(row))
            .collect())
    }
}
