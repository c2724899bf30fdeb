use std::fmt::Write as _;

use ragq_llm::{GenerationBackend, LlmError};

/// Assemble the context-augmented prompt.
///
/// Contexts keep their order and are numbered from 1:
///
/// ```text
/// Context:
/// [1] first context
///
/// [2] second context
/// Question: <question>
/// Answer:
/// ```
#[must_use]
pub fn build_prompt(question: &str, contexts: &[String]) -> String {
    let mut prompt = String::from("Context:\n");
    for (i, context) in contexts.iter().enumerate() {
        if i > 0 {
            prompt.push_str("\n\n");
        }
        let _ = write!(prompt, "[{}] {context}", i + 1);
    }
    let _ = write!(prompt, "\nQuestion: {question}\nAnswer:");
    prompt
}

/// Answer text for a failed generation.
#[must_use]
pub fn error_answer(err: &LlmError) -> String {
    format!("Error: {err}")
}

/// Prompt assembly plus backend isolation.
#[derive(Debug, Clone)]
pub struct Generator<B> {
    backend: B,
}

impl<B: GenerationBackend> Generator<B> {
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generate an answer, propagating backend failures.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    pub async fn try_generate(&self, question: &str, contexts: &[String]) -> Result<String, LlmError> {
        let prompt = build_prompt(question, contexts);
        tracing::debug!(
            backend = self.backend.name(),
            contexts = contexts.len(),
            prompt_chars = prompt.len(),
            "generating answer"
        );
        self.backend.generate(&prompt).await
    }

    /// Generate an answer; a backend failure becomes an `"Error: ..."` answer.
    pub async fn generate(&self, question: &str, contexts: &[String]) -> String {
        match self.try_generate(question, contexts).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), "generation failed: {e:#}");
                error_answer(&e)
            }
        }
    }
}
