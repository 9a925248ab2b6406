//! Document boundary trait
//!
//! Readers for word-processing and spreadsheet templates implement
//! [`TemplateDocument`]. The engine never parses document formats itself; it
//! only sees the text-bearing nodes a document chooses to expose.

use crate::errors::EngineError;
use crate::types::TemplateKind;

/// A loaded template whose text nodes can be rewritten in place
///
/// Word-processing documents expose one node per paragraph (including
/// paragraphs inside table cells). Spreadsheets expose one node per
/// string-valued cell; numeric, blank and other cells are not exposed.
pub trait TemplateDocument: Send {
    /// Which family this template belongs to
    fn kind(&self) -> TemplateKind;

    /// Mutable handles to every text-bearing node, in document order
    fn text_nodes_mut(&mut self) -> Vec<&mut String>;

    /// Number of text-bearing nodes
    fn node_count(&self) -> usize;

    /// Serialize the (possibly modified) document
    fn to_bytes(&self) -> Result<Vec<u8>, EngineError>;
}
