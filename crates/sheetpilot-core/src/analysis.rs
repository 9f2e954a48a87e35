//! Analysis requestor.
//!
//! Gathers every tab and the configured document into one text snapshot,
//! asks the model backend for recommendations, and parses the reply into an
//! [`AnalysisResult`]. [`Analyzer::analyze`] never fails: any error becomes
//! the `error` field of the result.

use std::{fmt::Write as _, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::{
    AnalysisResult, DocElement, DocumentContent, Gateway, GatewayError, ModelBackend, ModelError,
    ModelRequest, ParseError, TabData,
    model::parse_model_json,
    range::{column_letters, parse_cell_ref},
    receipts::is_receipts_tab,
};

/// Default token budget for an analysis reply.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Errors raised while running an analysis. Flattened into
/// [`AnalysisResult::error`] at the [`Analyzer::analyze`] boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalysisError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Which prompt and response shape to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    /// Summary plus a handful of recommendations over the gathered data.
    SingleSource,
    /// Reconciles tickets, meeting notes and a message log; every
    /// recommendation carries a category and source references.
    #[default]
    CrossReference,
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single-source" | "single" => Ok(Self::SingleSource),
            "cross-reference" | "cross" => Ok(Self::CrossReference),
            other => Err(format!(
                "unknown analysis mode '{other}' (expected 'single-source' or 'cross-reference')"
            )),
        }
    }
}

const BASE_REQUIRED: &[&str] = &[
    "summary",
    "recommendations[].id",
    "recommendations[].title",
    "recommendations[].description",
    "recommendations[].action.tab",
    "recommendations[].action.range",
    "recommendations[].action.newValue",
];

const CROSS_REFERENCE_REQUIRED: &[&str] = &[
    "summary",
    "recommendations[].id",
    "recommendations[].title",
    "recommendations[].description",
    "recommendations[].category",
    "recommendations[].sourceReferences",
    "recommendations[].action.tab",
    "recommendations[].action.range",
    "recommendations[].action.newValue",
];

const SINGLE_SOURCE_INSTRUCTION: &str = "You are an operations analyst reviewing spreadsheet \
data and meeting notes. Identify concrete problems such as stale values, inconsistent \
owners, or incorrect amounts, and propose fixes that each change exactly one cell.

Respond with ONLY a JSON object, no prose, in this exact shape:
{
  \"summary\": \"2-3 sentence overview of the data\",
  \"recommendations\": [
    {
      \"id\": \"rec-1\",
      \"title\": \"Short imperative title\",
      \"description\": \"Why this change is needed\",
      \"action\": { \"tab\": \"<tab name>\", \"range\": \"<single cell, e.g. B5>\", \"newValue\": \"<value>\" }
    }
  ]
}

Rules:
- Return between {min} and {max} recommendations.
- \"range\" must be a single cell reference using column letters and the row number shown \
in the data (header is row 1).
- \"tab\" must be one of the tab names shown in the data.";

const CROSS_REFERENCE_INSTRUCTION: &str = "You are an operations analyst reconciling three \
sources of truth: ticket-tracking rows in the spreadsheet, the meeting-notes document, and \
the message-log tab. Look specifically for assignment mismatches (a ticket owned by someone \
other than who the notes or messages say), deadline conflicts (dates that disagree between \
sources), and undocumented decisions (agreed in meetings or messages but not reflected in the \
tickets). Propose fixes that each change exactly one spreadsheet cell.

Respond with ONLY a JSON object, no prose, in this exact shape:
{
  \"summary\": \"2-3 sentence overview of the discrepancies found\",
  \"recommendations\": [
    {
      \"id\": \"rec-1\",
      \"title\": \"Short imperative title\",
      \"description\": \"What the sources disagree on and why this fix resolves it\",
      \"category\": \"Assignment Mismatch | Deadline Conflict | Undocumented Decision | Other\",
      \"sourceReferences\": [\"Tickets row 4\", \"Meeting notes: Decisions\", \"Messages row 12\"],
      \"action\": { \"tab\": \"<tab name>\", \"range\": \"<single cell, e.g. B5>\", \"newValue\": \"<value>\" }
    }
  ]
}

Rules:
- Return between {min} and {max} recommendations.
- Every recommendation MUST include \"category\" and \"sourceReferences\".
- \"range\" must be a single cell reference using column letters and the row number shown \
in the data (header is row 1).
- \"tab\" must be one of the tab names shown in the data.";

/// Mode-specific instruction text and expected response fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisProfile {
    pub mode: AnalysisMode,
    pub required_fields: &'static [&'static str],
    pub min_recommendations: u32,
    pub max_recommendations: u32,
    template: &'static str,
}

impl AnalysisProfile {
    #[must_use]
    pub fn for_mode(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::SingleSource => Self {
                mode,
                required_fields: BASE_REQUIRED,
                min_recommendations: 2,
                max_recommendations: 5,
                template: SINGLE_SOURCE_INSTRUCTION,
            },
            AnalysisMode::CrossReference => Self {
                mode,
                required_fields: CROSS_REFERENCE_REQUIRED,
                min_recommendations: 3,
                max_recommendations: 7,
                template: CROSS_REFERENCE_INSTRUCTION,
            },
        }
    }

    /// The system instruction with the recommendation count filled in.
    #[must_use]
    pub fn system_instruction(&self) -> String {
        self.template
            .replace("{min}", &self.min_recommendations.to_string())
            .replace("{max}", &self.max_recommendations.to_string())
    }
}

/// Runs analyses against one gateway and model backend.
#[derive(Debug, Clone)]
pub struct Analyzer {
    gateway: Arc<Gateway>,
    model: Arc<dyn ModelBackend>,
    profile: AnalysisProfile,
    max_tokens: u32,
}

impl Analyzer {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>, model: Arc<dyn ModelBackend>, mode: AnalysisMode) -> Self {
        Self {
            gateway,
            model,
            profile: AnalysisProfile::for_mode(mode),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn profile(&self) -> &AnalysisProfile {
        &self.profile
    }

    /// Runs one analysis. Failures are reported in [`AnalysisResult::error`].
    #[instrument(skip(self), fields(mode = ?self.profile.mode))]
    pub async fn analyze(&self) -> AnalysisResult {
        match self.try_analyze().await {
            Ok(result) => {
                info!(
                    recommendations = result.recommendations.len(),
                    "analysis complete"
                );
                result
            }
            Err(error) => {
                warn!(%error, "analysis failed");
                AnalysisResult::failed(error.to_string())
            }
        }
    }

    async fn try_analyze(&self) -> Result<AnalysisResult, AnalysisError> {
        let tabs = self.gateway.list_tabs().await?;

        let mut gathered = Vec::with_capacity(tabs.len());
        for tab in tabs {
            if is_receipts_tab(&tab) {
                continue;
            }
            match self.gateway.get_tab_data(&tab).await {
                Ok(data) => gathered.push((tab, data)),
                Err(error) => warn!(%tab, %error, "skipping tab that failed to load"),
            }
        }

        let document = self.gateway.get_document().await;
        let prompt = build_snapshot(&gathered, document.as_ref());

        let request = ModelRequest {
            system: self.profile.system_instruction(),
            prompt,
            max_tokens: self.max_tokens,
        };
        let response = self.model.complete(&request).await?;
        let text = response.first_text().ok_or(ParseError::NoText)?;

        let mut result: AnalysisResult = parse_model_json(text, self.profile.required_fields)?;
        for recommendation in &result.recommendations {
            if parse_cell_ref(&recommendation.action.range).is_none() {
                return Err(ParseError::Invalid(format!(
                    "recommendation '{}' targets '{}', which is not a single cell",
                    recommendation.id, recommendation.action.range
                ))
                .into());
            }
        }
        result.error = None;
        Ok(result)
    }
}

/// Serializes gathered tabs and the document into one prompt block.
#[must_use]
pub fn build_snapshot(tabs: &[(String, TabData)], document: Option<&DocumentContent>) -> String {
    let mut out = String::from("Here is the current data.\n\n");

    for (name, data) in tabs {
        let _ = writeln!(out, "### Tab: {name}");
        if data.headers.is_empty() && data.rows.is_empty() {
            out.push_str("(empty)\n\n");
            continue;
        }
        let header = data
            .headers
            .iter()
            .zip(0u32..)
            .map(|(h, col)| format!("{}: {h}", column_letters(col)))
            .collect::<Vec<_>>()
            .join(" | ");
        let _ = writeln!(out, "Row 1 (headers): {header}");
        for (row, number) in data.rows.iter().zip(2u64..) {
            let _ = writeln!(out, "Row {number}: {}", row.join(" | "));
        }
        out.push('\n');
    }

    if let Some(document) = document {
        let _ = writeln!(out, "### Document: {}", document.title);
        for element in &document.elements {
            match element {
                DocElement::Heading { text, .. } => {
                    let _ = writeln!(out, "\n#### {text}");
                }
                DocElement::ListItem { text } => {
                    let _ = writeln!(out, "- {text}");
                }
                DocElement::Paragraph { text } | DocElement::Table { text } => {
                    let _ = writeln!(out, "{text}");
                }
            }
        }
    }

    out
}
