//! Per-recommendation interaction state for one analysis.
//!
//! A [`Session`] owns the current [`AnalysisResult`] and a [`CardState`] for
//! each recommendation. Replacing the result discards every card. Applied is
//! terminal: an applied card accepts no further modify or apply requests.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::{Action, AnalysisResult, Recommendation, range::parse_cell_ref};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no recommendation with id '{0}'")]
    UnknownRecommendation(String),

    #[error("recommendation '{0}' has already been applied")]
    AlreadyApplied(String),

    #[error("recommendation '{0}' already has a request in flight")]
    InFlight(String),
}

/// Interaction state of one recommendation card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardState {
    pub notes: String,
    pub modifying: bool,
    pub applying: bool,
    pub error: Option<String>,
    /// Refined action replacing the original one when present.
    pub modified_action: Option<Action>,
    pub applied: bool,
}

/// Inputs for a refine request started by [`Session::begin_modify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingModify {
    pub recommendation: Recommendation,
    pub notes: String,
}

/// Inputs for an apply request started by [`Session::begin_apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingApply {
    pub recommendation: Recommendation,
    pub action: Action,
    pub notes: String,
    pub was_modified: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    result: AnalysisResult,
    cards: HashMap<String, CardState>,
}

impl Session {
    #[must_use]
    pub fn new(result: AnalysisResult) -> Self {
        let mut session = Self::default();
        session.replace(result);
        session
    }

    /// Installs a new analysis, dropping all previous card state.
    pub fn replace(&mut self, result: AnalysisResult) {
        self.cards = result
            .recommendations
            .iter()
            .map(|rec| (rec.id.clone(), CardState::default()))
            .collect();
        self.result = result;
    }

    #[must_use]
    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    #[must_use]
    pub fn card(&self, id: &str) -> Option<&CardState> {
        self.cards.get(id)
    }

    /// Records the user's free-text notes for a card.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownRecommendation`] for an unknown id.
    pub fn set_notes(&mut self, id: &str, notes: impl Into<String>) -> Result<(), SessionError> {
        self.card_mut(id)?.notes = notes.into();
        Ok(())
    }

    /// Marks a refine request as in flight.
    ///
    /// # Errors
    ///
    /// Rejects unknown ids, applied cards and cards already being refined.
    pub fn begin_modify(&mut self, id: &str) -> Result<PendingModify, SessionError> {
        let recommendation = self.recommendation(id)?.clone();
        let card = self.card_mut(id)?;
        if card.applied {
            return Err(SessionError::AlreadyApplied(id.to_string()));
        }
        if card.modifying {
            return Err(SessionError::InFlight(id.to_string()));
        }
        card.modifying = true;
        card.error = None;
        Ok(PendingModify {
            recommendation,
            notes: card.notes.clone(),
        })
    }

    /// Completes a refine request with the refined action or an error message.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownRecommendation`] for an unknown id.
    pub fn finish_modify(
        &mut self,
        id: &str,
        outcome: Result<Action, String>,
    ) -> Result<(), SessionError> {
        let card = self.card_mut(id)?;
        card.modifying = false;
        match outcome {
            Ok(action) => {
                card.modified_action = Some(action);
                card.error = None;
            }
            Err(message) => card.error = Some(message),
        }
        Ok(())
    }

    /// Marks an apply request as in flight and returns what to apply.
    ///
    /// # Errors
    ///
    /// Rejects unknown ids, applied cards and cards with an apply or refine
    /// request in flight.
    pub fn begin_apply(&mut self, id: &str) -> Result<PendingApply, SessionError> {
        let recommendation = self.recommendation(id)?.clone();
        let card = self.card_mut(id)?;
        if card.applied {
            return Err(SessionError::AlreadyApplied(id.to_string()));
        }
        if card.applying || card.modifying {
            return Err(SessionError::InFlight(id.to_string()));
        }
        card.applying = true;
        card.error = None;

        let action = card
            .modified_action
            .clone()
            .unwrap_or_else(|| recommendation.action.clone());
        Ok(PendingApply {
            was_modified: card.modified_action.is_some(),
            notes: card.notes.clone(),
            action,
            recommendation,
        })
    }

    /// Completes an apply request. Success makes the card terminally applied.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownRecommendation`] for an unknown id.
    pub fn finish_apply(&mut self, id: &str, outcome: Result<(), String>) -> Result<(), SessionError> {
        let card = self.card_mut(id)?;
        card.applying = false;
        match outcome {
            Ok(()) => {
                card.applied = true;
                card.error = None;
            }
            Err(message) => card.error = Some(message),
        }
        Ok(())
    }

    /// The refined action if one exists, otherwise the original.
    #[must_use]
    pub fn effective_action(&self, id: &str) -> Option<&Action> {
        let recommendation = self.result.recommendation(id)?;
        Some(
            self.cards
                .get(id)
                .and_then(|card| card.modified_action.as_ref())
                .unwrap_or(&recommendation.action),
        )
    }

    #[must_use]
    pub fn was_modified(&self, id: &str) -> bool {
        self.cards
            .get(id)
            .is_some_and(|card| card.modified_action.is_some())
    }

    /// Whether the 0-indexed cell was written by an applied recommendation.
    #[must_use]
    pub fn is_highlighted(&self, tab: &str, row: u32, col: u32) -> bool {
        self.cards
            .iter()
            .filter(|(_, card)| card.applied)
            .filter_map(|(id, _)| self.effective_action(id))
            .any(|action| {
                action.tab == tab
                    && parse_cell_ref(&action.range).is_some_and(|cell| cell.row == row && cell.col == col)
            })
    }

    fn recommendation(&self, id: &str) -> Result<&Recommendation, SessionError> {
        self.result
            .recommendation(id)
            .ok_or_else(|| SessionError::UnknownRecommendation(id.to_string()))
    }

    fn card_mut(&mut self, id: &str) -> Result<&mut CardState, SessionError> {
        self.cards
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownRecommendation(id.to_string()))
    }
}
