//! Generation Backend Abstraction
//!
//! The template engine needs exactly one capability from a language model:
//! text in, text out. `GenerationBackend` captures that contract so the
//! orchestrator can be driven by Gemini in production and by scripted fakes
//! in tests. Calls are awaited one at a time; backends are never invoked
//! concurrently by the engine.

use async_trait::async_trait;

pub mod gemini;

/// Result type for generation calls
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during a generation call
///
/// None of these abort a run. The orchestrator records them as failed
/// answers and the resolver renders them inline as `[ERROR IA: ...]`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Text-in/text-out generation backend
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Returns the name of the backend (e.g., "gemini")
    fn name(&self) -> &str;

    /// Fixed model identifier used for every call
    fn model(&self) -> &str;

    /// Generate text for a fully composed prompt
    ///
    /// # Returns
    /// * `Ok(String)` - The generated answer
    /// * `Err(LLMError)` - Network, quota or malformed-response failure
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is currently usable
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}
