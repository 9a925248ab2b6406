//! AI Orchestrator
//!
//! Turns a directive's prompt template into one backend call: static fields
//! are substituted into the prompt, the system context and the recent memory
//! window are prepended, and the backend's answer (or failure) is returned
//! as a typed result.

use super::context::SystemContext;
use super::memory::Memory;
use crate::catalog::FieldCatalog;
use crate::llm::{GenerationBackend, LLMError};
use crate::placeholder::{self, PlaceholderKind};
use crate::secrets::scrub;
use std::sync::Arc;
use tracing::{debug, warn};

const MEMORY_RULE_WIDTH: usize = 80;
const TASK_SEPARATOR: &str = "\n\n---\n\nTASK:\n";

pub struct AiOrchestrator {
    backend: Arc<dyn GenerationBackend>,
}

impl AiOrchestrator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate the answer for one directive.
    ///
    /// Failures are returned, never raised; the caller records them in
    /// memory and renders them inline.
    pub async fn generate(
        &self,
        directive: &str,
        prompt_template: &str,
        catalog: &FieldCatalog,
        context: &SystemContext,
        memory: &Memory,
    ) -> Result<String, LLMError> {
        let prompt = substitute_prompt(prompt_template, catalog);
        let request = compose(context, memory, &prompt);

        debug!(
            directive,
            backend = self.backend.name(),
            model = self.backend.model(),
            memory_entries = memory.recent().len(),
            memory_window = memory.window(),
            prompt_chars = request.chars().count(),
            "Generating directive"
        );

        match self.backend.generate(&request).await {
            Ok(answer) => Ok(answer.trim().to_string()),
            Err(e) => {
                warn!(directive, "Generation failed: {}", scrub(&e.to_string()));
                Err(e)
            }
        }
    }
}

/// Replace `{{NAME}}` tokens in a prompt template with Static field values.
///
/// AI and image markers, and names not in the catalog, are left as-is.
pub fn substitute_prompt(prompt_template: &str, catalog: &FieldCatalog) -> String {
    placeholder::rewrite(prompt_template, |p| match p.kind {
        PlaceholderKind::StaticRef => catalog.static_text(p.name),
        _ => None,
    })
    .unwrap_or_else(|| prompt_template.to_string())
}

/// Build the request text: system context, recent answers, task banner, prompt
pub fn compose(context: &SystemContext, memory: &Memory, prompt: &str) -> String {
    let mut request = String::from(context.as_str());

    let recent = memory.recent();
    if !recent.is_empty() {
        let rule = "=".repeat(MEMORY_RULE_WIDTH);
        request.push_str(&format!(
            "\n\n{rule}\nPREVIOUSLY GENERATED ANSWERS (stay consistent with this data):\n{rule}\n\n"
        ));
        let rendered: Vec<String> = recent.iter().map(|e| e.render()).collect();
        request.push_str(&rendered.join("\n\n"));
    }

    request.push_str(TASK_SEPARATOR);
    request.push_str(prompt);
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ConfigRow;
    use crate::conductor::context::ContextAssembler;
    use async_trait::async_trait;
    use auditfill_sdk::types::CellValue;
    use std::sync::Mutex;

    struct Recorder {
        prompts: Mutex<Vec<String>>,
        reply: Result<String, LLMError>,
    }

    #[async_trait]
    impl GenerationBackend for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn model(&self) -> &str {
            "test-model"
        }

        async fn generate(&self, prompt: &str) -> crate::llm::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone()
        }
    }

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_rows(vec![
            ConfigRow::new("EMPRESA", CellValue::Text("Acme".into()), ""),
            ConfigRow::new("ANIO", CellValue::Number(2024.0), ""),
            ConfigRow::new(
                "POLITICA",
                CellValue::Text("Write a policy for {{EMPRESA}}".into()),
                "{{IA:POLITICA}}",
            ),
        ])
    }

    #[test]
    fn test_substitute_prompt_uses_static_fields_only() {
        let cat = catalog();
        let prompt = substitute_prompt(
            "{{EMPRESA}} in {{ANIO}}, see {{IA:POLITICA}} and {{POLITICA}} {{MISSING}}",
            &cat,
        );
        assert_eq!(
            prompt,
            "Acme in 2024, see {{IA:POLITICA}} and {{POLITICA}} {{MISSING}}"
        );
    }

    #[test]
    fn test_compose_without_memory() {
        let context = ContextAssembler::new("CTX").assemble(&[], &FieldCatalog::default(), None);
        let request = compose(&context, &Memory::new(15), "Do it");
        assert_eq!(request, "CTX\n\n---\n\nTASK:\nDo it");
    }

    #[test]
    fn test_compose_includes_only_recent_memory() {
        let context = ContextAssembler::new("CTX").assemble(&[], &FieldCatalog::default(), None);
        let mut memory = Memory::new(2);
        memory.record("A", Ok("first".into()));
        memory.record("B", Ok("second".into()));
        memory.record("C", Err(LLMError::Timeout));

        let request = compose(&context, &memory, "Do it");
        assert!(!request.contains("[A]"));
        assert!(request.contains("[B]\nsecond\n\n[C]\n[ERROR IA: Timeout]"));
        assert!(request.contains("PREVIOUSLY GENERATED ANSWERS"));
        assert!(request.ends_with("TASK:\nDo it"));
    }

    #[tokio::test]
    async fn test_generate_sends_composed_prompt() {
        let backend = Arc::new(Recorder {
            prompts: Mutex::new(Vec::new()),
            reply: Ok("  A fine policy.\n".into()),
        });
        let orchestrator = AiOrchestrator::new(backend.clone());
        let cat = catalog();
        let context = ContextAssembler::new("CTX").assemble(&[], &cat, None);

        let answer = orchestrator
            .generate(
                "POLITICA",
                "Write a policy for {{EMPRESA}}",
                &cat,
                &context,
                &Memory::new(15),
            )
            .await;

        assert_eq!(answer, Ok("A fine policy.".to_string()));
        let prompts = backend.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("TASK:\nWrite a policy for Acme"));
    }

    #[tokio::test]
    async fn test_generate_returns_failures() {
        let backend = Arc::new(Recorder {
            prompts: Mutex::new(Vec::new()),
            reply: Err(LLMError::RateLimitExceeded),
        });
        let orchestrator = AiOrchestrator::new(backend);
        let cat = catalog();
        let context = ContextAssembler::default().assemble(&[], &cat, None);

        let answer = orchestrator
            .generate("POLITICA", "x", &cat, &context, &Memory::new(15))
            .await;
        assert_eq!(answer, Err(LLMError::RateLimitExceeded));
    }
}
