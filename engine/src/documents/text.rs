//! Paragraph-per-line word-processing templates (`.txt`, `.md`)

use auditfill_sdk::{EngineError, TemplateDocument, TemplateKind};

/// A UTF-8 text document, one paragraph per line
///
/// The line terminator of the first line (`\r\n` or `\n`) is used for the
/// whole document when it is saved back.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDocument {
    paragraphs: Vec<String>,
    line_ending: &'static str,
    trailing_newline: bool,
}

impl TextDocument {
    pub fn parse(bytes: &[u8]) -> Result<Self, EngineError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| EngineError::Document(format!("Template is not valid UTF-8: {}", e)))?;

        let line_ending = match text.find('\n') {
            Some(i) if text[..i].ends_with('\r') => "\r\n",
            _ => "\n",
        };

        Ok(Self {
            paragraphs: text.lines().map(str::to_string).collect(),
            line_ending,
            trailing_newline: text.ends_with('\n'),
        })
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }
}

impl TemplateDocument for TextDocument {
    fn kind(&self) -> TemplateKind {
        TemplateKind::WordProcessing
    }

    fn text_nodes_mut(&mut self) -> Vec<&mut String> {
        self.paragraphs.iter_mut().collect()
    }

    fn node_count(&self) -> usize {
        self.paragraphs.len()
    }

    fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        let mut text = self.paragraphs.join(self.line_ending);
        if self.trailing_newline {
            text.push_str(self.line_ending);
        }
        Ok(text.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_are_lines() {
        let doc = TextDocument::parse(b"Title\r\n\nBody {{EMPRESA}}\n").unwrap();
        assert_eq!(doc.paragraphs(), &["Title", "", "Body {{EMPRESA}}"]);
        assert_eq!(doc.node_count(), 3);
    }

    #[test]
    fn test_edits_are_saved() {
        let mut doc = TextDocument::parse(b"a\nb").unwrap();
        for node in doc.text_nodes_mut() {
            node.push('!');
        }
        assert_eq!(doc.to_bytes().unwrap(), b"a!\nb!");
    }

    #[test]
    fn test_crlf_line_endings_are_kept() {
        let mut doc = TextDocument::parse(b"Empresa: {{EMPRESA}}\r\nRUC\r\n").unwrap();
        assert_eq!(doc.paragraphs(), &["Empresa: {{EMPRESA}}", "RUC"]);

        doc.text_nodes_mut()[0].replace_range(9.., "Acme");
        assert_eq!(doc.to_bytes().unwrap(), b"Empresa: Acme\r\nRUC\r\n");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = TextDocument::parse(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, EngineError::Document(_)));
    }
}
