//! auditfill Engine Library
//!
//! Template injection engine for audit documents. Templates carry
//! `{{NAME}}` placeholders filled from a configuration table and
//! `{{IA:NAME}}` directives generated by a language model; every run also
//! produces the system context it used and a log of every generated answer.
//!
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// Telemetry and Observability
pub mod telemetry;

/// Generation backend abstraction
pub mod llm;

/// Field catalog built from the configuration table
pub mod catalog;

/// Placeholder tokenizer
pub mod placeholder;

/// Substitution cleanup rules
pub mod postprocess;

/// System context, rolling memory and prompt orchestration
pub mod conductor;

/// Per-node placeholder resolution
pub mod resolver;

/// Document adapters and company context extraction
pub mod documents;

/// Output artifacts
pub mod artifacts;

/// Run pipeline
pub mod pipeline;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
