//! Data model shared by the gateway, the analysis requestor and the apply
//! pipeline.

use serde::{Deserialize, Deserializer, Serialize};

/// Contents of one spreadsheet tab: the first row as headers, the rest as
/// data rows in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabData {
    /// Splits raw backend rows into header and data rows.
    ///
    /// Zero rows is a legitimately empty tab, not an error.
    #[must_use]
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let headers = rows.remove(0);
        Self { headers, rows }
    }
}

/// A document flattened into an ordered list of elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub title: String,
    pub elements: Vec<DocElement>,
}

/// One flattened document element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DocElement {
    Heading { text: String, level: u8 },
    Paragraph { text: String },
    ListItem { text: String },
    /// Table rows joined by newlines, cells by `" | "`.
    Table { text: String },
}

impl DocElement {
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Heading { text, .. }
            | Self::Paragraph { text }
            | Self::ListItem { text }
            | Self::Table { text } => text,
        }
    }
}

/// The concrete single-cell edit a recommendation resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub tab: String,
    /// Single-cell A1 reference, never a multi-cell range.
    pub range: String,
    #[serde(deserialize_with = "string_from_scalar")]
    pub new_value: String,
}

/// A model-proposed edit with its explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Unique within one analysis response only.
    #[serde(deserialize_with = "string_from_scalar")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub source_references: Vec<String>,
    pub action: Action,
}

/// Category used when the model omits one.
pub const DEFAULT_CATEGORY: &str = "Other";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Outcome of one analysis run. An error implies empty summary and
/// recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Builds the failure shape: empty summary, no recommendations.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            summary: String::new(),
            recommendations: Vec::new(),
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub fn recommendation(&self, id: &str) -> Option<&Recommendation> {
        self.recommendations.iter().find(|r| r.id == id)
    }
}

/// Accepts a JSON string, number or boolean and keeps its textual form.
fn string_from_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a string, number or boolean, found {other}"
        ))),
    }
}
