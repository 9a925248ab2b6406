//! Cell values, template kinds and artifacts

use serde::{Deserialize, Serialize};
use std::fmt;

/// A loosely typed value read from a spreadsheet cell or table column
///
/// Only `Text` values are ever handed to the placeholder resolver; every
/// other variant is left untouched in the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
    Other(String),
}

impl CellValue {
    /// Text content if this is a `Text` cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Mutable text content if this is a `Text` cell
    pub fn as_text_mut(&mut self) -> Option<&mut String> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for `Blank` and for text that is empty after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => {
                // Whole numbers print without a fractional part ("2024", not "2024.0")
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Blank => Ok(()),
            CellValue::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&serde_json::Value> for CellValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Blank,
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Other(n.to_string()),
            },
            other => CellValue::Other(other.to_string()),
        }
    }
}

impl From<&CellValue> for serde_json::Value {
    fn from(cell: &CellValue) -> Self {
        match cell {
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Blank => serde_json::Value::Null,
            CellValue::Other(s) => {
                serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.clone()))
            }
        }
    }
}

/// The two template families a run can process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// Paragraph-oriented documents
    WordProcessing,

    /// Cell-oriented workbooks
    Spreadsheet,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::WordProcessing => write!(f, "word"),
            TemplateKind::Spreadsheet => write!(f, "excel"),
        }
    }
}

/// Category of a produced artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactCategory {
    /// A filled template
    Document,

    /// The exact system context used for a template family
    ContextDump,

    /// Every generated answer of the run
    MemoryLog,
}

/// One named output blob produced by a run
///
/// Consumers (archivers, writers) must preserve `name` and `category`
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub name: String,
    pub content: Vec<u8>,
    pub category: ArtifactCategory,
}

impl GeneratedArtifact {
    /// Create a new artifact
    pub fn new(name: impl Into<String>, content: Vec<u8>, category: ArtifactCategory) -> Self {
        Self {
            name: name.into(),
            content,
            category,
        }
    }

    /// Create a UTF-8 text artifact
    pub fn text(
        name: impl Into<String>,
        content: impl Into<String>,
        category: ArtifactCategory,
    ) -> Self {
        Self::new(name, content.into().into_bytes(), category)
    }
}
