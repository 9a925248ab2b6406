//! Placeholder Resolver
//!
//! Resolves the placeholders of one text node, in a fixed order:
//!
//! 1. `{{IA:NAME}}` directives, each distinct name generated once and
//!    recorded in memory
//! 2. `{{NAME}}` static references, scanned on the text produced by step 1
//!    so answers that mention static fields get them filled in
//! 3. `{{IMG:NAME}}` markers are left untouched
//!
//! Unknown names stay verbatim. A node that changed is passed through the
//! post-processor before being written back.

use crate::catalog::FieldCatalog;
use crate::conductor::{sentinel, AiOrchestrator, Memory, SystemContext};
use crate::placeholder::{self, PlaceholderKind};
use crate::postprocess;
use std::collections::HashMap;
use tracing::{debug, trace};

/// What happened to one node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeOutcome {
    /// The node text was rewritten
    pub changed: bool,
    /// Distinct directives generated for this node
    pub directives_resolved: usize,
    /// Of those, how many produced a failure sentinel
    pub generation_failures: usize,
}

pub struct Resolver<'a> {
    catalog: &'a FieldCatalog,
    orchestrator: &'a AiOrchestrator,
    context: &'a SystemContext,
}

impl<'a> Resolver<'a> {
    pub fn new(
        catalog: &'a FieldCatalog,
        orchestrator: &'a AiOrchestrator,
        context: &'a SystemContext,
    ) -> Self {
        Self {
            catalog,
            orchestrator,
            context,
        }
    }

    /// Resolve every placeholder in `node`, writing the result back in place
    pub async fn resolve(&self, node: &mut String, memory: &mut Memory) -> NodeOutcome {
        let mut outcome = NodeOutcome::default();

        // Fast path: nothing that looks like a marker
        if !node.contains("{{") {
            return outcome;
        }

        let mut text = node.clone();

        // 1. AI directives
        let answers = self.generate_directives(&text, memory, &mut outcome).await;
        if !answers.is_empty() {
            if let Some(rewritten) = placeholder::rewrite(&text, |p| match p.kind {
                PlaceholderKind::AiDirective => answers.get(p.name).cloned(),
                _ => None,
            }) {
                text = rewritten;
                outcome.changed = true;
            }
        }

        // 2. Static references, including any introduced by answers
        if let Some(rewritten) = placeholder::rewrite(&text, |p| match p.kind {
            PlaceholderKind::StaticRef => self.catalog.static_text(p.name),
            _ => None,
        }) {
            text = rewritten;
            outcome.changed = true;
        }

        // 3. Image markers are reserved
        if placeholder::scan(&text).any(|p| p.kind == PlaceholderKind::ImageDirective) {
            trace!("Leaving image placeholder unresolved");
        }

        if outcome.changed {
            *node = postprocess::clean(&text);
        }

        outcome
    }

    /// Generate each distinct known directive of `text`, in order of first
    /// appearance. Returns name → rendered answer.
    async fn generate_directives(
        &self,
        text: &str,
        memory: &mut Memory,
        outcome: &mut NodeOutcome,
    ) -> HashMap<String, String> {
        let mut names: Vec<&str> = Vec::new();
        for p in placeholder::scan(text) {
            if p.kind == PlaceholderKind::AiDirective && !names.contains(&p.name) {
                names.push(p.name);
            }
        }

        let mut answers = HashMap::new();
        for name in names {
            let Some(prompt) = self.catalog.ai_prompt(name) else {
                debug!(directive = name, "Unknown directive left verbatim");
                continue;
            };

            let result = self
                .orchestrator
                .generate(name, &prompt, self.catalog, self.context, memory)
                .await;

            let rendered = match &result {
                Ok(answer) => answer.clone(),
                Err(e) => {
                    outcome.generation_failures += 1;
                    sentinel(e)
                }
            };

            memory.record(name, result);
            answers.insert(name.to_string(), rendered);
            outcome.directives_resolved += 1;
        }

        answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ConfigRow;
    use crate::conductor::ContextAssembler;
    use crate::llm::{GenerationBackend, LLMError};
    use async_trait::async_trait;
    use auditfill_sdk::types::CellValue;
    use std::sync::{Arc, Mutex};

    /// Replies with "<answer N>" or fails when the prompt contains "FAIL"
    struct Scripted {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl GenerationBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn generate(&self, prompt: &str) -> crate::llm::Result<String> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if prompt.ends_with("FAIL") {
                return Err(LLMError::NetworkError("connection reset".into()));
            }
            if prompt.ends_with("ECHO") {
                return Ok("Prepared for {{EMPRESA}}".into());
            }
            Ok(format!("answer {}", *calls))
        }
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_rows(vec![
            ConfigRow::new("EMPRESA", text("Acme"), ""),
            ConfigRow::new("RUC", text("123"), ""),
            ConfigRow::new("NORMA1", text("ISO 9001"), ""),
            ConfigRow::new("NORMA2", text("ISO 45001"), ""),
            ConfigRow::new("NORMA3", CellValue::Blank, ""),
            ConfigRow::new("RESUMEN", text("Summarize"), "{{IA:RESUMEN}}"),
            ConfigRow::new("ROTO", text("FAIL"), "{{IA:ROTO}}"),
            ConfigRow::new("FIRMA", text("ECHO"), "{{IA:FIRMA}}"),
        ])
    }

    async fn resolve(input: &str, memory: &mut Memory) -> (String, NodeOutcome, usize) {
        let backend = Arc::new(Scripted {
            calls: Mutex::new(0),
        });
        let orchestrator = AiOrchestrator::new(backend.clone());
        let cat = catalog();
        let context = ContextAssembler::new("CTX").assemble(&[], &cat, None);
        let resolver = Resolver::new(&cat, &orchestrator, &context);

        let mut node = input.to_string();
        let outcome = resolver.resolve(&mut node, memory).await;
        let calls = *backend.calls.lock().unwrap();
        (node, outcome, calls)
    }

    #[tokio::test]
    async fn test_static_references() {
        let mut memory = Memory::new(15);
        let (node, outcome, calls) =
            resolve("Company {{EMPRESA}}, RUC {{RUC}}, {{EMPRESA}}", &mut memory).await;

        assert_eq!(node, "Company Acme, RUC 123, Acme");
        assert!(outcome.changed);
        assert_eq!(calls, 0);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_blank_static_is_cleaned_up() {
        let mut memory = Memory::new(15);
        let (node, _, _) = resolve("{{NORMA1}}, {{NORMA2}}, {{NORMA3}}", &mut memory).await;
        assert_eq!(node, "ISO 9001, ISO 45001");
    }

    #[tokio::test]
    async fn test_untouched_node_is_not_cleaned() {
        let mut memory = Memory::new(15);
        let (node, outcome, _) = resolve("  plain ,, text  ", &mut memory).await;
        assert_eq!(node, "  plain ,, text  ");
        assert!(!outcome.changed);

        let (node, outcome, _) = resolve("  {{NADA}} ,, text  ", &mut memory).await;
        assert_eq!(node, "  {{NADA}} ,, text  ");
        assert!(!outcome.changed);
    }

    #[tokio::test]
    async fn test_unknown_directive_left_verbatim() {
        let mut memory = Memory::new(15);
        let (node, outcome, calls) = resolve("Result: {{IA:DESCONOCIDO}}", &mut memory).await;

        assert_eq!(node, "Result: {{IA:DESCONOCIDO}}");
        assert_eq!(outcome.directives_resolved, 0);
        assert_eq!(calls, 0);
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_directive_generated_once_per_node() {
        let mut memory = Memory::new(15);
        let (node, outcome, calls) =
            resolve("{{IA:RESUMEN}} / {{IA:RESUMEN}}", &mut memory).await;

        assert_eq!(node, "answer 1 / answer 1");
        assert_eq!(outcome.directives_resolved, 1);
        assert_eq!(calls, 1);
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.entries()[0].directive, "RESUMEN");
    }

    #[tokio::test]
    async fn test_failure_becomes_sentinel_and_is_remembered() {
        let mut memory = Memory::new(15);
        let (node, outcome, _) = resolve("Detail: {{IA:ROTO}}", &mut memory).await;

        assert!(node.contains("[ERROR IA: Network error: connection reset]"));
        assert_eq!(outcome.generation_failures, 1);
        assert_eq!(memory.len(), 1);
        assert!(memory.entries()[0].is_failure());
    }

    #[tokio::test]
    async fn test_answers_can_reference_static_fields() {
        let mut memory = Memory::new(15);
        let (node, _, _) = resolve("{{IA:FIRMA}}", &mut memory).await;
        assert_eq!(node, "Prepared for Acme");
        assert_eq!(
            memory.entries()[0].outcome,
            Ok("Prepared for {{EMPRESA}}".to_string())
        );
    }

    #[tokio::test]
    async fn test_image_directive_is_inert() {
        let mut memory = Memory::new(15);
        let (node, outcome, calls) = resolve("{{IMG:LOGO}} {{EMPRESA}}", &mut memory).await;
        assert_eq!(node, "{{IMG:LOGO}} Acme");
        assert!(outcome.changed);
        assert_eq!(calls, 0);
    }
}
