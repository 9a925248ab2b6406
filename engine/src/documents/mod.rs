//! Document adapters
//!
//! Minimal readers and writers behind the sdk [`TemplateDocument`] trait:
//! paragraph-per-line text for word-processing templates and JSON workbooks
//! for spreadsheet templates and the configuration table.

pub mod company;
pub mod text;
pub mod workbook;

pub use company::CompanyContextReader;
pub use text::TextDocument;
pub use workbook::Workbook;

use crate::catalog::ConfigRow;
use auditfill_sdk::{EngineError, TemplateDocument, TemplateKind};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Editor lock files ("~$informe.docx") are never templates
const LOCK_FILE_PREFIX: &str = "~$";

/// A named file handed to the engine by its caller
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, named after its file name
    pub fn from_path(path: &Path) -> Result<Self, EngineError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| EngineError::Document(format!("Invalid file name {:?}", path)))?
            .to_string();
        let bytes = fs::read(path)?;
        Ok(Self { name, bytes })
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// Template family for a file name, by extension
pub fn template_kind(name: &str) -> Option<TemplateKind> {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)?;

    match extension.as_str() {
        "txt" | "md" => Some(TemplateKind::WordProcessing),
        "json" => Some(TemplateKind::Spreadsheet),
        _ => None,
    }
}

/// Parse an uploaded template into a rewritable document
pub fn load_template(upload: &Upload) -> Result<Box<dyn TemplateDocument>, EngineError> {
    match template_kind(&upload.name) {
        Some(TemplateKind::WordProcessing) => Ok(Box::new(TextDocument::parse(&upload.bytes)?)),
        Some(TemplateKind::Spreadsheet) => Ok(Box::new(Workbook::parse(&upload.bytes)?)),
        None => Err(EngineError::UnsupportedTemplate(upload.name.clone())),
    }
}

/// Decode the configuration table
pub fn read_config_table(upload: &Upload) -> Result<Vec<ConfigRow>, EngineError> {
    if upload.extension().as_deref() != Some("json") {
        return Err(EngineError::ConfigTableInvalid(format!(
            "'{}' is not a JSON workbook",
            upload.name
        )));
    }

    let workbook = Workbook::parse(&upload.bytes)
        .map_err(|e| EngineError::ConfigTableInvalid(e.to_string()))?;
    workbook.config_rows()
}

/// Expand files and directories into the list of files to read.
///
/// Directory entries are sorted by name; lock files and entries rejected by
/// `accept` are skipped. Explicit file arguments are kept unless they are
/// lock files.
pub fn collect_files<F>(paths: &[PathBuf], accept: F) -> Result<Vec<PathBuf>, EngineError>
where
    F: Fn(&Path) -> bool,
{
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && !is_lock_file(p) && accept(p))
                .collect();
            entries.sort();
            debug!("{} file(s) found in {:?}", entries.len(), path);
            files.extend(entries);
        } else if !is_lock_file(path) {
            files.push(path.clone());
        }
    }

    Ok(files)
}

fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(LOCK_FILE_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template_kind() {
        assert_eq!(template_kind("_informe.txt"), Some(TemplateKind::WordProcessing));
        assert_eq!(template_kind("PLAN.MD"), Some(TemplateKind::WordProcessing));
        assert_eq!(template_kind("checklist.json"), Some(TemplateKind::Spreadsheet));
        assert_eq!(template_kind("informe.docx"), None);
        assert_eq!(template_kind("README"), None);
    }

    #[test]
    fn test_load_unsupported_template() {
        let err = load_template(&Upload::new("a.docx", vec![])).err().unwrap();
        assert!(matches!(err, EngineError::UnsupportedTemplate(_)));
    }

    #[test]
    fn test_config_table_must_be_json() {
        let err = read_config_table(&Upload::new("datos.xlsx", vec![])).unwrap_err();
        assert!(matches!(err, EngineError::ConfigTableInvalid(_)));

        let err = read_config_table(&Upload::new("datos.json", b"[]".to_vec())).unwrap_err();
        assert!(matches!(err, EngineError::ConfigTableInvalid(_)));
    }

    #[test]
    fn test_collect_files_skips_lock_files() {
        let dir = TempDir::new().unwrap();
        for name in ["b.txt", "a.json", "~$a.json", "notes.docx"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = collect_files(&[dir.path().to_path_buf()], |p| {
            template_kind(&p.to_string_lossy()).is_some()
        })
        .unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.txt"]);
    }
}
