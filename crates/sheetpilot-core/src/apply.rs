//! Apply pipeline: read original value, write new value, record a receipt.
//!
//! Steps run strictly in order with no rollback. A failed write stops the
//! pipeline before any receipt is written. A failed receipt never turns a
//! successful write into a failure; it is logged and reported in
//! [`ApplyOutcome::receipt_error`].
//!
//! Receipt ids come from scanning the ledger, so two writers can pick the
//! same id. Clones of one [`ApplyPipeline`] serialize id selection and the
//! append; separate processes are not coordinated.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::{
    Action, Gateway, GatewayError, Recommendation,
    receipts::{APPLIED_BY, Receipt, STATUS_APPLIED},
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApplyError {
    /// The cell write failed; nothing was recorded.
    #[error("failed to apply change: {0}")]
    Write(#[source] GatewayError),
}

/// Result of a successful cell write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub tab: String,
    pub range: String,
    pub original_value: String,
    pub new_value: String,
    /// Identifier of the recorded receipt, when recording succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApplyPipeline {
    gateway: Arc<Gateway>,
    ledger: Arc<Mutex<()>>,
}

impl ApplyPipeline {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            ledger: Arc::new(Mutex::new(())),
        }
    }

    /// Whether `other` serializes receipts through the same lock.
    #[must_use]
    pub fn shares_ledger_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.ledger, &other.ledger)
    }

    /// Applies `action` on behalf of `recommendation`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::Write`] when the cell write fails.
    #[instrument(
        skip(self, recommendation, action, notes),
        fields(id = %recommendation.id, tab = %action.tab, range = %action.range)
    )]
    pub async fn apply(
        &self,
        recommendation: &Recommendation,
        action: &Action,
        notes: &str,
        was_modified: bool,
    ) -> Result<ApplyOutcome, ApplyError> {
        let original_value = match self.gateway.read_cell(&action.tab, &action.range).await {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, "could not read original value, recording it as empty");
                String::new()
            }
        };

        self.gateway
            .write_cell(&action.tab, &action.range, &action.new_value)
            .await
            .map_err(ApplyError::Write)?;
        info!("cell updated");

        let mut outcome = ApplyOutcome {
            tab: action.tab.clone(),
            range: action.range.clone(),
            original_value,
            new_value: action.new_value.clone(),
            receipt_id: None,
            receipt_error: None,
        };

        match self
            .record(recommendation, &outcome, notes, was_modified)
            .await
        {
            Ok(receipt_id) => outcome.receipt_id = Some(receipt_id),
            Err(e) => {
                error!(error = %e, "failed to record receipt, cell write stands");
                outcome.receipt_error = Some(e.to_string());
            }
        }

        Ok(outcome)
    }

    async fn record(
        &self,
        recommendation: &Recommendation,
        outcome: &ApplyOutcome,
        notes: &str,
        was_modified: bool,
    ) -> Result<String, GatewayError> {
        let _ledger = self.ledger.lock().await;
        let receipt_id = self.gateway.next_receipt_id().await?;
        let receipt = Receipt {
            receipt_id: receipt_id.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            recommendation_id: recommendation.id.clone(),
            recommendation_title: recommendation.title.clone(),
            category: recommendation.category.clone(),
            tab: outcome.tab.clone(),
            cell: outcome.range.clone(),
            original_value: outcome.original_value.clone(),
            new_value: outcome.new_value.clone(),
            modification_notes: notes.trim().to_string(),
            was_modified,
            source_references: recommendation.source_references.clone(),
            applied_by: APPLIED_BY.to_string(),
            status: STATUS_APPLIED.to_string(),
        };

        self.gateway.append_receipt(&receipt).await?;
        info!(%receipt_id, "receipt recorded");
        Ok(receipt_id)
    }
}
