//! Error types and handling
//!
//! This module provides the error types used throughout the auditfill engine.
//! All errors implement the `AuditErrorExt` trait which provides user-friendly
//! hints and indicates whether a run can continue past them.
//!
//! # Propagation policy
//!
//! Only configuration problems and generation backend initialization abort a
//! run. Template failures are contained at the per-template boundary and
//! generation failures never surface as `EngineError` at all: they are
//! rendered inline as sentinels by the engine.

use std::path::PathBuf;
use thiserror::Error;

/// Trait for auditfill error extensions
pub trait AuditErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint never contains secrets (API keys) or raw file contents.
    fn user_hint(&self) -> &str;

    /// Returns whether the batch can continue after this error
    ///
    /// Non-recoverable errors abort the whole run before any artifact is
    /// produced.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: invalid settings file, missing or unreadable
///   configuration table
/// - **Backend**: generation backend could not be initialized (credentials)
/// - **Template**: a single template failed to parse or save
/// - **Document**: a document adapter rejected its input
///
/// # Examples
///
/// ```
/// use auditfill_sdk::errors::{AuditErrorExt, EngineError};
///
/// let error = EngineError::TemplateProcessing {
///     template: "_informe.txt".to_string(),
///     reason: "invalid UTF-8".to_string(),
/// };
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::BackendInit("GEMINI_API_KEY not found".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration table not found: {0:?}")]
    ConfigTableMissing(PathBuf),

    #[error("Configuration table unreadable: {0}")]
    ConfigTableInvalid(String),

    // Generation backend errors
    #[error("Generation backend initialization failed: {0}")]
    BackendInit(String),

    // Template errors
    #[error("Template '{template}' failed: {reason}")]
    TemplateProcessing { template: String, reason: String },

    #[error("Unsupported template format: {0}")]
    UnsupportedTemplate(String),

    // Document adapter errors
    #[error("Document error: {0}")]
    Document(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    #[error("Path canonicalization failed for {0:?}: {1}")]
    PathCanonicalization(PathBuf, String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuditErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            // Configuration errors
            Self::Config(_) => "Check your config.toml file for errors",
            Self::ConfigTableMissing(_) => "Provide the configuration table with --data",
            Self::ConfigTableInvalid(_) => {
                "The configuration table must be a workbook with name, value and label columns"
            }

            // Generation backend errors
            Self::BackendInit(_) => "Set GEMINI_API_KEY in the environment or in a .env file",

            // Template errors
            Self::TemplateProcessing { .. } => "The template was skipped. Check its format",
            Self::UnsupportedTemplate(_) => "Use .txt, .md or .json templates",

            // Document adapter errors
            Self::Document(_) => "The document could not be read or written",

            // Keyring errors
            Self::KeyringError(_) => "Failed to access secure storage. Check system keychain",
            Self::PathCanonicalization(_, _) => "Invalid path specified",

            // Generic IO error
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Abort the run
            Self::Config(_)
            | Self::ConfigTableMissing(_)
            | Self::ConfigTableInvalid(_)
            | Self::BackendInit(_) => false,

            // Everything else degrades to partial output
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(!EngineError::Config("bad".into()).is_recoverable());
        assert!(!EngineError::ConfigTableMissing(PathBuf::from("DATA.json")).is_recoverable());
        assert!(!EngineError::BackendInit("no key".into()).is_recoverable());
    }

    #[test]
    fn test_recoverable_errors() {
        let err = EngineError::TemplateProcessing {
            template: "a.txt".into(),
            reason: "boom".into(),
        };
        assert!(err.is_recoverable());
        assert!(EngineError::Document("x".into()).is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::TemplateProcessing {
            template: "_plan.json".into(),
            reason: "expected object".into(),
        };
        assert_eq!(err.to_string(), "Template '_plan.json' failed: expected object");
    }
}
