//! Artifact Collector
//!
//! Gathers the filled templates of a run and, once every template is done,
//! adds the review artifacts: one context dump per template family that was
//! processed and a single memory log of every generated answer.

use crate::conductor::{MemoryEntry, SystemContext};
use auditfill_sdk::{ArtifactCategory, EngineError, GeneratedArtifact, TemplateKind};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const WORD_CONTEXT_DUMP: &str = "CONTEXTO_IA.txt";
pub const EXCEL_CONTEXT_DUMP: &str = "CONTEXTO_IA_EXCEL.txt";

const RULE_WIDTH: usize = 80;

#[derive(Debug, Default)]
pub struct ArtifactCollector {
    documents: Vec<GeneratedArtifact>,
    word_processed: bool,
    spreadsheet_processed: bool,
    memory: Vec<MemoryEntry>,
}

impl ArtifactCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filled template
    pub fn add_document(&mut self, template_name: &str, kind: TemplateKind, content: Vec<u8>) {
        match kind {
            TemplateKind::WordProcessing => self.word_processed = true,
            TemplateKind::Spreadsheet => self.spreadsheet_processed = true,
        }
        self.documents.push(GeneratedArtifact::new(
            output_name(template_name),
            content,
            ArtifactCategory::Document,
        ));
    }

    /// Append resolved directives to the run's memory log
    pub fn record_memory(&mut self, entries: Vec<MemoryEntry>) {
        self.memory.extend(entries);
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Produce the final artifact set
    ///
    /// Documents come first, in processing order, followed by the context
    /// dumps and the memory log.
    pub fn finish(self, context: &SystemContext, generated_at: DateTime<Local>) -> Vec<GeneratedArtifact> {
        let mut artifacts = self.documents;

        if self.word_processed {
            artifacts.push(context_dump(context, TemplateKind::WordProcessing, generated_at));
        }
        if self.spreadsheet_processed {
            artifacts.push(context_dump(context, TemplateKind::Spreadsheet, generated_at));
        }

        if !self.memory.is_empty() {
            let kinds = match (self.word_processed, self.spreadsheet_processed) {
                (true, true) => "WORD_EXCEL",
                (false, true) => "EXCEL",
                _ => "WORD",
            };
            artifacts.push(memory_log(&self.memory, kinds, generated_at));
        }

        artifacts
    }
}

/// Output name of a filled template: the template name without leading `_`
pub fn output_name(template_name: &str) -> String {
    template_name.trim_start_matches('_').to_string()
}

/// The system context with a review header
pub fn context_dump(
    context: &SystemContext,
    kind: TemplateKind,
    generated_at: DateTime<Local>,
) -> GeneratedArtifact {
    let (name, title) = match kind {
        TemplateKind::WordProcessing => (WORD_CONTEXT_DUMP, "CONTEXTO COMPLETO ENVIADO A LA IA"),
        TemplateKind::Spreadsheet => (
            EXCEL_CONTEXT_DUMP,
            "CONTEXTO COMPLETO ENVIADO A LA IA (EXCEL)",
        ),
    };

    let rule = "=".repeat(RULE_WIDTH);
    let content = format!(
        "{rule}\n{title}\nGenerado: {}\n{rule}\n\n{}",
        generated_at.format("%d/%m/%Y %H:%M:%S"),
        context
    );

    GeneratedArtifact::text(name, content, ArtifactCategory::ContextDump)
}

fn memory_log(entries: &[MemoryEntry], kinds: &str, generated_at: DateTime<Local>) -> GeneratedArtifact {
    let rule = "=".repeat(RULE_WIDTH);
    let dashes = "-".repeat(RULE_WIDTH);

    let mut content = format!(
        "MEMORIA COMPLETA DE GENERACIONES IA\nGenerado: {}\n{rule}\n\n",
        generated_at.format("%d/%m/%Y %H:%M:%S")
    );
    for (i, entry) in entries.iter().enumerate() {
        content.push_str(&format!("\n{}. {}\n{dashes}\n", i + 1, entry.render()));
    }

    let name = format!(
        "MEMORIA_IA_{}_{}.txt",
        kinds,
        generated_at.format("%Y%m%d_%H%M%S")
    );
    GeneratedArtifact::text(name, content, ArtifactCategory::MemoryLog)
}

/// Write every artifact into `dir`, returning the written paths
pub fn write_all(dir: &Path, artifacts: &[GeneratedArtifact]) -> Result<Vec<PathBuf>, EngineError> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let file_name = Path::new(&artifact.name).file_name().ok_or_else(|| {
            EngineError::Document(format!("Invalid artifact name '{}'", artifact.name))
        })?;
        let path = dir.join(file_name);
        fs::write(&path, &artifact.content)?;
        info!("Wrote {:?} ({:?})", path, artifact.category);
        written.push(path);
    }

    Ok(written)
}
