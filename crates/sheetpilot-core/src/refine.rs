//! Recommendation refiner: rewrites a recommendation's action from user notes.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    Action, ModelBackend, ModelError, ModelRequest, ParseError, Recommendation,
    model::parse_model_json, range::parse_cell_ref,
};

/// Token budget for a refined action; the reply is one small object.
pub const DEFAULT_REFINE_MAX_TOKENS: u32 = 1024;

const REQUIRED: &[&str] = &["tab", "range", "newValue"];

const REFINE_INSTRUCTION: &str = "You adjust a proposed spreadsheet edit according to the \
user's notes. Keep the same tab and cell unless the notes explicitly ask for a different one; \
normally only the value changes.

Respond with ONLY a JSON object, no prose, in this exact shape:
{ \"tab\": \"<tab name>\", \"range\": \"<single cell, e.g. B5>\", \"newValue\": \"<value>\" }";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RefineError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone)]
pub struct Refiner {
    model: Arc<dyn ModelBackend>,
    max_tokens: u32,
}

impl Refiner {
    #[must_use]
    pub fn new(model: Arc<dyn ModelBackend>) -> Self {
        Self {
            model,
            max_tokens: DEFAULT_REFINE_MAX_TOKENS,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Asks the model for a revised action.
    ///
    /// Blank notes return the original action without contacting the model.
    /// The returned target cell is not compared with the original one; the
    /// model is only instructed to keep it.
    ///
    /// # Errors
    ///
    /// Returns [`RefineError::Model`] when the backend call fails and
    /// [`RefineError::Parse`] when the reply is not a single-cell action.
    #[instrument(skip(self, recommendation, notes), fields(id = %recommendation.id))]
    pub async fn refine(
        &self,
        recommendation: &Recommendation,
        notes: &str,
    ) -> Result<Action, RefineError> {
        let notes = notes.trim();
        if notes.is_empty() {
            debug!("no notes, keeping original action");
            return Ok(recommendation.action.clone());
        }

        let request = ModelRequest {
            system: REFINE_INSTRUCTION.to_string(),
            prompt: refine_prompt(recommendation, notes),
            max_tokens: self.max_tokens,
        };
        let response = self.model.complete(&request).await?;
        let text = response.first_text().ok_or(ParseError::NoText)?;

        let action: Action = parse_model_json(text, REQUIRED)?;
        if parse_cell_ref(&action.range).is_none() {
            return Err(ParseError::Invalid(format!(
                "refined action targets '{}', which is not a single cell",
                action.range
            ))
            .into());
        }

        debug!(tab = %action.tab, range = %action.range, "refined action");
        Ok(action)
    }
}

fn refine_prompt(recommendation: &Recommendation, notes: &str) -> String {
    let action = &recommendation.action;
    format!(
        "Original recommendation:\n\
         Title: {}\n\
         Description: {}\n\
         Action: tab \"{}\", cell {}, new value \"{}\"\n\n\
         User notes:\n{notes}",
        recommendation.title, recommendation.description, action.tab, action.range, action.new_value
    )
}
