//! Language-model backend for Sheetpilot.
//!
//! [`MessagesClient`] implements [`sheetpilot_core::ModelBackend`] over a
//! Messages-style HTTP API: a system instruction and one user turn go out,
//! an ordered list of typed content blocks comes back.

mod messages;

pub use messages::{API_VERSION, DEFAULT_ENDPOINT, MessagesClient};
