//! Run pipeline
//!
//! One run takes a configuration table, a batch of templates and optional
//! company documents, and produces the filled templates plus review
//! artifacts. Work is strictly sequential: one template at a time, one node
//! at a time, one backend call at a time.
//!
//! Only an unreadable configuration table aborts a run. A template that
//! fails to load or save is skipped; generation failures end up inline in
//! the text.

pub mod progress;

pub use progress::{NoProgress, ProgressReporter};

use crate::artifacts::ArtifactCollector;
use crate::catalog::FieldCatalog;
use crate::conductor::{AiOrchestrator, ContextAssembler, Memory, SystemContext};
use crate::config::{Config, MemoryScope};
use crate::documents::{self, CompanyContextReader, Upload};
use crate::llm::GenerationBackend;
use crate::resolver::Resolver;
use auditfill_sdk::{EngineError, GeneratedArtifact, TemplateKind};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

const TEMPLATES_START: u8 = 40;
const TEMPLATES_END: u8 = 90;

/// Run-level knobs, usually taken from [`Config`]
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub prompt_file: Option<PathBuf>,
    pub company_doc_char_limit: usize,
    pub memory_window: usize,
    pub memory_scope: MemoryScope,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prompt_file: config.context.prompt_file.clone(),
            company_doc_char_limit: config.context.company_doc_char_limit,
            memory_window: config.memory.window,
            memory_scope: config.memory.scope,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self::from_config(&Config::default_config())
    }
}

/// Inputs of one run
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Configuration table
    pub data: Upload,
    pub templates: Vec<Upload>,
    pub company_documents: Vec<Upload>,
}

/// Catalog and system context, built once per run
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub catalog: FieldCatalog,
    pub standards: Vec<String>,
    pub context: SystemContext,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedTemplate {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub static_fields: usize,
    pub ai_fields: usize,
    pub standards: Vec<String>,
    pub context_chars: usize,
    pub templates_processed: usize,
    pub templates_skipped: Vec<SkippedTemplate>,
    pub directives_resolved: usize,
    pub generation_failures: usize,
}

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub artifacts: Vec<GeneratedArtifact>,
    pub summary: RunSummary,
}

#[derive(Debug, Default)]
struct TemplateStats {
    nodes_changed: usize,
    directives_resolved: usize,
    generation_failures: usize,
}

/// Read the configuration table, extract company context and assemble the
/// system context.
///
/// Progress 15 → 35. Fails only on an unreadable configuration table.
pub fn prepare(
    data: &Upload,
    company_documents: &[Upload],
    settings: &RunSettings,
    progress: &dyn ProgressReporter,
) -> Result<PreparedRun, EngineError> {
    progress.report(15, "Reading configuration table...");
    let rows = documents::read_config_table(data)?;
    let catalog = FieldCatalog::from_rows(rows);
    let standards = catalog.audited_standards();

    if standards.is_empty() {
        warn!("No audited standards found (NORMA fields)");
    } else {
        info!("Audited standards: {}", standards.join(", "));
    }
    info!(
        "Catalog loaded: {} static fields, {} AI directives",
        catalog.static_count(),
        catalog.ai_count()
    );
    progress.report(
        25,
        &format!(
            "{} static fields, {} AI directives loaded",
            catalog.static_count(),
            catalog.ai_count()
        ),
    );

    progress.report(30, "Reading company documents...");
    let company_context = match CompanyContextReader::new(settings.company_doc_char_limit)
        .extract(company_documents)
    {
        Ok(context) => context,
        Err(e) => {
            warn!("Company context unavailable: {}", e);
            None
        }
    };

    progress.report(35, "Assembling system context...");
    let context = ContextAssembler::from_prompt_file(settings.prompt_file.as_deref()).assemble(
        &standards,
        &catalog,
        company_context.as_deref(),
    );
    info!("System context assembled ({} chars)", context.len());

    Ok(PreparedRun {
        catalog,
        standards,
        context,
    })
}

/// Execute a full run
pub async fn run(
    request: &RunRequest,
    backend: Arc<dyn GenerationBackend>,
    settings: &RunSettings,
    progress: &dyn ProgressReporter,
) -> Result<RunOutput, EngineError> {
    let run_id = Uuid::new_v4().to_string();
    let span = info_span!("run", run_id = %run_id);

    async move {
        let orchestrator = AiOrchestrator::new(backend);
        info!(
            templates = request.templates.len(),
            company_documents = request.company_documents.len(),
            backend = orchestrator.backend_name(),
            "Run started"
        );

        let prepared = prepare(&request.data, &request.company_documents, settings, progress)?;
        let resolver = Resolver::new(&prepared.catalog, &orchestrator, &prepared.context);

        let mut collector = ArtifactCollector::new();
        let mut memory = Memory::new(settings.memory_window);
        let mut skipped = Vec::new();
        let mut directives_resolved = 0;
        let mut generation_failures = 0;

        let total = request.templates.len();
        for (idx, template) in request.templates.iter().enumerate() {
            let start = progress::band(TEMPLATES_START, TEMPLATES_END, idx, total);
            let end = progress::band(TEMPLATES_START, TEMPLATES_END, idx + 1, total);
            progress.report(
                start,
                &format!("Processing template {}/{}: {}...", idx + 1, total, template.name),
            );

            let result = process_template(template, &resolver, &mut memory, progress, start, end)
                .instrument(info_span!("template", name = %template.name))
                .await;

            match result {
                Ok((kind, bytes, stats)) => {
                    info!(
                        template = %template.name,
                        nodes_changed = stats.nodes_changed,
                        directives = stats.directives_resolved,
                        failures = stats.generation_failures,
                        "Template processed"
                    );
                    directives_resolved += stats.directives_resolved;
                    generation_failures += stats.generation_failures;
                    collector.add_document(&template.name, kind, bytes);
                    progress.report(end, &format!("Completed: {}", template.name));
                }
                Err(e) => {
                    warn!("Skipping template '{}': {}", template.name, e);
                    skipped.push(SkippedTemplate {
                        name: template.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            if settings.memory_scope == MemoryScope::PerTemplate {
                collector.record_memory(memory.drain());
            }
        }
        collector.record_memory(memory.drain());

        progress.report(95, "Finalizing...");
        let templates_processed = collector.document_count();
        let artifacts = collector.finish(&prepared.context, chrono::Local::now());

        let summary = RunSummary {
            run_id: run_id.clone(),
            static_fields: prepared.catalog.static_count(),
            ai_fields: prepared.catalog.ai_count(),
            standards: prepared.standards.clone(),
            context_chars: prepared.context.len(),
            templates_processed,
            templates_skipped: skipped,
            directives_resolved,
            generation_failures,
        };

        info!(
            processed = summary.templates_processed,
            skipped = summary.templates_skipped.len(),
            directives = summary.directives_resolved,
            failures = summary.generation_failures,
            artifacts = artifacts.len(),
            "Run finished"
        );

        Ok(RunOutput { artifacts, summary })
    }
    .instrument(span)
    .await
}

async fn process_template(
    template: &Upload,
    resolver: &Resolver<'_>,
    memory: &mut Memory,
    progress: &dyn ProgressReporter,
    start: u8,
    end: u8,
) -> Result<(TemplateKind, Vec<u8>, TemplateStats), EngineError> {
    let to_template_error = |e: EngineError| EngineError::TemplateProcessing {
        template: template.name.clone(),
        reason: e.to_string(),
    };

    let mut document = documents::load_template(template).map_err(to_template_error)?;
    let kind = document.kind();
    let mut stats = TemplateStats::default();

    let total = document.node_count();
    {
        let nodes = document.text_nodes_mut();

        for (i, node) in nodes.into_iter().enumerate() {
            let outcome = resolver.resolve(node, memory).await;
            if outcome.changed {
                stats.nodes_changed += 1;
            }
            stats.directives_resolved += outcome.directives_resolved;
            stats.generation_failures += outcome.generation_failures;

            progress.report(
                progress::band(start, end, i + 1, total),
                &format!("Processing {}... {}%", template.name, (i + 1) * 100 / total),
            );
        }
    }

    let bytes = document.to_bytes().map_err(to_template_error)?;
    Ok((kind, bytes, stats))
}
