//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - run: Fill templates and write every artifact
//! - context: Write the system context for review, no model calls
//! - config show / validate: Inspect the effective configuration
//! - doctor: Validate configuration and check credentials

use anyhow::{Context, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::artifacts;
use crate::config::Config;
use crate::documents::{self, Upload};
use crate::llm::gemini::GeminiBackend;
use crate::llm::GenerationBackend;
use crate::pipeline::{self, NoProgress, ProgressReporter, RunRequest, RunSettings};
use crate::secrets::{SecretResolver, GEMINI_API_KEY_ENTRY, GEMINI_API_KEY_ENV, KEYCHAIN_SERVICE};
use auditfill_sdk::{AuditErrorExt, EngineError, TemplateKind};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Prints progress lines to stderr in text mode
struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn report(&self, percent: u8, message: &str) {
        eprintln!("[{:>3}%] {}", percent, message);
    }
}

fn progress_for(format: OutputFormat) -> Box<dyn ProgressReporter> {
    match format {
        OutputFormat::Text => Box::new(ConsoleProgress),
        OutputFormat::Json => Box::new(NoProgress),
    }
}

/// Attach the error's user hint so the binary prints something actionable
fn with_hint(error: EngineError) -> anyhow::Error {
    let hint = error.user_hint().to_string();
    anyhow::Error::new(error).context(hint)
}

/// Read the configuration table, distinguishing "missing" from "unreadable"
fn load_data(path: &Path) -> Result<Upload, EngineError> {
    if !path.is_file() {
        return Err(EngineError::ConfigTableMissing(path.to_path_buf()));
    }
    Upload::from_path(path).map_err(|e| EngineError::ConfigTableInvalid(e.to_string()))
}

/// Read every file under `paths`; unreadable files are logged and skipped
fn load_uploads<F>(paths: &[PathBuf], accept: F) -> Result<Vec<Upload>, EngineError>
where
    F: Fn(&Path) -> bool,
{
    let files = documents::collect_files(paths, accept)?;
    let mut uploads = Vec::with_capacity(files.len());

    for file in files {
        match Upload::from_path(&file) {
            Ok(upload) => uploads.push(upload),
            Err(e) => tracing::warn!("Skipping unreadable file {:?}: {}", file, e),
        }
    }

    Ok(uploads)
}

fn is_template(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(documents::template_kind)
        .is_some()
}

/// Build the Gemini backend; fails when no API key can be resolved
pub fn build_backend(config: &Config) -> Result<Arc<dyn GenerationBackend>, EngineError> {
    let api_key =
        SecretResolver::new(KEYCHAIN_SERVICE).resolve(GEMINI_API_KEY_ENV, GEMINI_API_KEY_ENTRY)?;
    let backend = GeminiBackend::new(config.llm.gemini.clone(), api_key)?;
    Ok(Arc::new(backend))
}

/// Fill templates and write every artifact into the output directory
pub async fn handle_run(
    data: PathBuf,
    templates: Vec<PathBuf>,
    company: Vec<PathBuf>,
    output: Option<PathBuf>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    // Credentials first: a run without a backend must not start
    let backend = build_backend(config).map_err(with_hint)?;

    let data = load_data(&data).map_err(with_hint)?;
    let templates = load_uploads(&templates, is_template).map_err(with_hint)?;
    if templates.is_empty() {
        anyhow::bail!("No templates found (supported: .txt, .md, .json)");
    }
    let company_documents = load_uploads(&company, |_| true).map_err(with_hint)?;
    let output_dir = config
        .ensure_output_dir(output.as_deref())
        .map_err(with_hint)?;

    let request = RunRequest {
        data,
        templates,
        company_documents,
    };
    let settings = RunSettings::from_config(config);
    let progress = progress_for(format);

    let output = pipeline::run(&request, backend, &settings, progress.as_ref())
        .await
        .map_err(with_hint)?;

    let written = artifacts::write_all(&output_dir, &output.artifacts)
        .map_err(with_hint)
        .context("Failed to write artifacts")?;
    progress.report(100, "Done");

    let summary = &output.summary;
    match format {
        OutputFormat::Text => {
            println!("Run {}", summary.run_id);
            println!("============================");
            println!();
            println!(
                "  {:<25} {}",
                "Standards:",
                if summary.standards.is_empty() {
                    "none".to_string()
                } else {
                    summary.standards.join(", ")
                }
            );
            println!(
                "  {:<25} {} static, {} AI",
                "Fields:", summary.static_fields, summary.ai_fields
            );
            println!("  {:<25} {} chars", "System context:", summary.context_chars);
            println!("  {:<25} {}", "Templates processed:", summary.templates_processed);
            println!("  {:<25} {}", "Directives resolved:", summary.directives_resolved);
            println!("  {:<25} {}", "Generation failures:", summary.generation_failures);
            println!();

            println!("Artifacts written to {:?}:", output_dir);
            for path in &written {
                if let Some(name) = path.file_name() {
                    println!("  {}", name.to_string_lossy());
                }
            }

            if !summary.templates_skipped.is_empty() {
                println!();
                println!("⚠ Skipped templates:");
                for (i, skipped) in summary.templates_skipped.iter().enumerate() {
                    println!("  {}. {}: {}", i + 1, skipped.name, skipped.reason);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "summary": summary,
                "output_dir": output_dir,
                "artifacts": output.artifacts.iter().zip(&written).map(|(artifact, path)| {
                    json!({
                        "name": artifact.name,
                        "category": artifact.category,
                        "path": path,
                        "bytes": artifact.content.len(),
                    })
                }).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Write only the system context dump, without calling the model
pub async fn handle_context(
    data: PathBuf,
    company: Vec<PathBuf>,
    output: Option<PathBuf>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let data = load_data(&data).map_err(with_hint)?;
    let company_documents = load_uploads(&company, |_| true).map_err(with_hint)?;
    let output_dir = config
        .ensure_output_dir(output.as_deref())
        .map_err(with_hint)?;

    let settings = RunSettings::from_config(config);
    let progress = progress_for(format);
    let prepared = pipeline::prepare(&data, &company_documents, &settings, progress.as_ref())
        .map_err(with_hint)?;

    let dump = artifacts::context_dump(
        &prepared.context,
        TemplateKind::WordProcessing,
        chrono::Local::now(),
    );
    let written = artifacts::write_all(&output_dir, std::slice::from_ref(&dump))
        .map_err(with_hint)?;
    progress.report(100, "Done");

    let path = written.first().cloned().unwrap_or_default();
    match format {
        OutputFormat::Text => {
            println!("System context written to {:?}", path);
            println!(
                "  {:<25} {} static, {} AI",
                "Fields:",
                prepared.catalog.static_count(),
                prepared.catalog.ai_count()
            );
            println!("  {:<25} {}", "Standards:", prepared.standards.join(", "));
            println!("  {:<25} {} chars", "Length:", prepared.context.len());
        }
        OutputFormat::Json => {
            let output = json!({
                "path": path,
                "static_fields": prepared.catalog.static_count(),
                "ai_fields": prepared.catalog.ai_count(),
                "standards": prepared.standards,
                "context_chars": prepared.context.len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Print the effective configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let text = toml::to_string_pretty(config).context("Failed to render configuration")?;
            println!("{}", text);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}

/// Report that the configuration loaded and validated
///
/// Loading already validates, so reaching this handler means the file is
/// valid.
pub fn handle_config_validate(
    config: &Config,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let source = config_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "~/.auditfill/config.toml".to_string());

    match format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid ({})", source);
            println!("  {:<25} {}", "Model:", config.llm.gemini.model);
            println!("  {:<25} {:?}", "Output directory:", config.core.output_dir);
            println!("  {:<25} {}", "Memory window:", config.memory.window);
        }
        OutputFormat::Json => {
            let output = json!({ "valid": true, "source": source });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Run diagnostic checks
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks = Vec::new();

    // Check 1: Configuration validation
    checks.push(("Configuration", "Valid".to_string()));

    // Check 2: Output directory
    if config.core.output_dir.exists() {
        checks.push(("Output directory", "Exists".to_string()));
    } else {
        checks.push(("Output directory", "Missing (created on first run)".to_string()));
    }

    // Check 3: Base prompt template
    match &config.context.prompt_file {
        Some(path) if path.is_file() => checks.push(("Prompt file", "Found".to_string())),
        Some(path) => {
            checks.push(("Prompt file", "Missing".to_string()));
            issues.push(format!(
                "Prompt file {:?} not found; the built-in template will be used",
                path
            ));
        }
        None => checks.push(("Prompt file", "Built-in".to_string())),
    }

    // Check 4: Gemini credentials and backend health
    checks.push(("Model", config.llm.gemini.model.clone()));
    match build_backend(config) {
        Ok(backend) => {
            checks.push(("Gemini API key", "Configured".to_string()));
            if backend.check_health().await {
                checks.push(("Gemini backend", "Ready".to_string()));
            } else {
                checks.push(("Gemini backend", "Not ready".to_string()));
                issues.push(format!(
                    "Gemini backend at {} is not usable",
                    config.llm.gemini.base_url
                ));
            }
        }
        Err(e) => {
            checks.push(("Gemini API key", "Not configured".to_string()));
            issues.push(format!("{} ({})", e, e.user_hint()));
        }
    }

    // Output results
    match format {
        OutputFormat::Text => {
            println!("auditfill Diagnostics");
            println!("============================");
            println!();

            println!("System Checks:");
            for (check, status) in &checks {
                println!("  {:<25} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({"name": name, "status": status})
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
