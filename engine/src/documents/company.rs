//! Company context extraction
//!
//! Uploaded company documents are written into a per-run scratch directory
//! and read back as plain text. The scratch directory is removed when the
//! extraction returns, whatever the outcome.

use super::workbook::Workbook;
use super::Upload;
use auditfill_sdk::EngineError;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub struct CompanyContextReader {
    char_limit: usize,
}

impl CompanyContextReader {
    pub fn new(char_limit: usize) -> Self {
        Self { char_limit }
    }

    /// Concatenate the text of every readable document, each truncated to the
    /// character limit and introduced by a `--- <name> ---` line.
    ///
    /// Returns `None` when no document contributed any text.
    pub fn extract(&self, documents: &[Upload]) -> Result<Option<String>, EngineError> {
        if documents.is_empty() {
            return Ok(None);
        }

        let scratch = tempfile::Builder::new()
            .prefix("auditfill-company-")
            .tempdir()?;
        debug!("Company context scratch space at {:?}", scratch.path());

        let mut context = String::new();
        for document in documents {
            match self.read_document(scratch.path(), document) {
                Ok(text) => {
                    context.push_str(&format!("--- {} ---\n{}\n\n", document.name, text));
                }
                Err(e) => warn!("Skipping company document '{}': {}", document.name, e),
            }
        }

        let context = context.trim_end().to_string();
        Ok((!context.is_empty()).then_some(context))
    }

    fn read_document(&self, scratch: &Path, document: &Upload) -> Result<String, EngineError> {
        let file_name = Path::new(&document.name)
            .file_name()
            .ok_or_else(|| EngineError::Document(format!("Invalid file name '{}'", document.name)))?;
        let path = scratch.join(file_name);
        fs::write(&path, &document.bytes)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let text = match extension.as_deref() {
            Some("txt") | Some("md") => fs::read_to_string(&path)
                .map_err(|e| EngineError::Document(format!("Not a UTF-8 text file: {}", e)))?,
            Some("json") => Workbook::parse(&fs::read(&path)?)?.flatten_text(),
            _ => format!("[Documento: {}]", document.name),
        };

        Ok(truncate_chars(text.trim(), self.char_limit))
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
