//! Core pipeline for Sheetpilot: analyze spreadsheet and document content
//! with a language model, refine its proposed single-cell edits, apply them,
//! and keep an audit ledger of every applied change.
//!
//! # Key Components
//!
//! - **Range addressing**: A1 cell references ([`range`])
//! - **Gateway**: uniform, error-classifying access to the spreadsheet and
//!   document backends, with an offline demo mode ([`Gateway`])
//! - **Analysis**: snapshot → model → parsed [`AnalysisResult`] ([`Analyzer`])
//! - **Refinement**: user notes → revised [`Action`] ([`Refiner`])
//! - **Apply**: read → write → receipt ([`ApplyPipeline`])
//! - **Receipts**: the `REC-NNN` audit ledger ([`receipts`])
//! - **Session**: per-recommendation interaction state ([`Session`])
//!
//! Backends are reached only through the [`SpreadsheetBackend`],
//! [`DocumentBackend`] and [`ModelBackend`] traits; HTTP implementations live
//! in separate crates.

mod analysis;
mod apply;
mod backend;
mod gateway;
mod refine;
mod session;
mod types;

pub mod config;
pub mod demo;
pub mod model;
pub mod range;
pub mod receipts;

#[cfg(test)]
mod testing;

pub use analysis::{AnalysisError, AnalysisMode, AnalysisProfile, Analyzer, DEFAULT_MAX_TOKENS, build_snapshot};
pub use apply::{ApplyError, ApplyOutcome, ApplyPipeline};
pub use backend::{
    BackendError, CHANGED_CELL_BACKGROUND, ContentBlock, DocumentBackend, ModelBackend, ModelError,
    ModelRequest, ModelResponse, Rgb, SpreadsheetBackend, TabInfo,
};
pub use config::{Config, ConfigError, CredentialsConfig};
pub use gateway::{Gateway, GatewayError, SheetSource};
pub use model::ParseError;
pub use range::{CellRef, parse_cell_ref};
pub use receipts::Receipt;
pub use refine::{DEFAULT_REFINE_MAX_TOKENS, RefineError, Refiner};
pub use session::{CardState, PendingApply, PendingModify, Session, SessionError};
pub use types::{
    Action, AnalysisResult, DEFAULT_CATEGORY, DocElement, DocumentContent, Recommendation, TabData,
};
