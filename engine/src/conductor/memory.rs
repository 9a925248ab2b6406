//! Rolling answer memory
//!
//! Every resolved AI directive is recorded here, successful or not. The most
//! recent `window` entries are shown to the model as "previously generated
//! answers" so later directives stay consistent with earlier ones; the full
//! sequence is kept for the run's memory log.

use crate::llm::LLMError;
use crate::secrets::scrub;

/// Upper bound on the entries shown to a prompt, whatever the configuration
pub const MAX_MEMORY_WINDOW: usize = 15;

/// Prefix that identifies an inline generation failure
pub const SENTINEL_PREFIX: &str = "[ERROR IA:";

/// Render a generation failure as the inline sentinel text
pub fn sentinel(error: &LLMError) -> String {
    format!("{} {}]", SENTINEL_PREFIX, scrub(&error.to_string()))
}

/// One resolved directive
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEntry {
    pub directive: String,
    pub outcome: Result<String, LLMError>,
}

impl MemoryEntry {
    pub fn new(directive: impl Into<String>, outcome: Result<String, LLMError>) -> Self {
        Self {
            directive: directive.into(),
            outcome,
        }
    }

    /// Answer text as it appears in documents: the answer, or the sentinel
    pub fn answer_text(&self) -> String {
        match &self.outcome {
            Ok(answer) => answer.clone(),
            Err(e) => sentinel(e),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }

    /// `[NAME]\nanswer`
    pub fn render(&self) -> String {
        format!("[{}]\n{}", self.directive, self.answer_text())
    }
}

/// Ordered log of generated answers with a bounded prompt window
#[derive(Debug, Clone)]
pub struct Memory {
    entries: Vec<MemoryEntry>,
    window: usize,
}

impl Memory {
    /// Create an empty memory that exposes at most `window` entries to
    /// prompts, capped at [`MAX_MEMORY_WINDOW`]
    pub fn new(window: usize) -> Self {
        Self {
            entries: Vec::new(),
            window: window.min(MAX_MEMORY_WINDOW),
        }
    }

    /// Append a resolved directive
    pub fn record(&mut self, directive: impl Into<String>, outcome: Result<String, LLMError>) {
        self.entries.push(MemoryEntry::new(directive, outcome));
    }

    /// The most recent entries, oldest first, never more than the window
    pub fn recent(&self) -> &[MemoryEntry] {
        let start = self.entries.len().saturating_sub(self.window);
        &self.entries[start..]
    }

    /// Every entry recorded so far
    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    /// Move every entry out, leaving the memory empty
    pub fn drain(&mut self) -> Vec<MemoryEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_is_bounded() {
        let mut memory = Memory::new(15);
        for i in 0..40 {
            memory.record(format!("D{}", i), Ok(format!("answer {}", i)));
        }

        let recent = memory.recent();
        assert_eq!(recent.len(), 15);
        assert_eq!(recent.first().unwrap().directive, "D25");
        assert_eq!(recent.last().unwrap().directive, "D39");
        assert_eq!(memory.len(), 40);
    }

    #[test]
    fn test_window_is_capped() {
        let mut memory = Memory::new(30);
        assert_eq!(memory.window(), MAX_MEMORY_WINDOW);
        for i in 0..20 {
            memory.record(format!("D{}", i), Ok(format!("answer {}", i)));
        }
        assert_eq!(memory.recent().len(), MAX_MEMORY_WINDOW);
        assert_eq!(memory.recent()[0].directive, "D5");
    }

    #[test]
    fn test_recent_smaller_than_window() {
        let mut memory = Memory::new(15);
        memory.record("A", Ok("a".into()));
        assert_eq!(memory.recent().len(), 1);
    }

    #[test]
    fn test_failures_are_recorded_as_sentinels() {
        let mut memory = Memory::new(15);
        memory.record("POLITICA", Err(LLMError::RateLimitExceeded));

        let entry = &memory.entries()[0];
        assert!(entry.is_failure());
        assert_eq!(entry.answer_text(), "[ERROR IA: Rate limit exceeded]");
        assert_eq!(entry.render(), "[POLITICA]\n[ERROR IA: Rate limit exceeded]");
    }

    #[test]
    fn test_drain_empties_memory() {
        let mut memory = Memory::new(2);
        memory.record("A", Ok("a".into()));
        memory.record("B", Ok("b".into()));

        let drained = memory.drain();
        assert_eq!(drained.len(), 2);
        assert!(memory.is_empty());
        assert!(memory.recent().is_empty());
    }
}
