//! Auditfill SDK
//!
//! Boundary contract shared by the template injection engine and the
//! document readers/writers that feed it. Document adapters only need this
//! crate: they expose their text-bearing nodes through [`TemplateDocument`]
//! and receive [`GeneratedArtifact`]s back.

/// Document boundary trait
pub mod document;

/// Error types and handling
pub mod errors;

/// Cell values, template kinds and artifacts
pub mod types;

// Re-export commonly used types
pub use document::TemplateDocument;
pub use errors::{AuditErrorExt, EngineError};
pub use types::{ArtifactCategory, CellValue, GeneratedArtifact, TemplateKind};
