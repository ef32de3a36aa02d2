use std::sync::Arc;

use hemo_core::error::{Error, Result};
use hemo_core::traits::AnswerGenerator;

use crate::engine::{RetrievalEngine, RetrievedContext};

pub const CHAT_SYSTEM_ROLE: &str =
    "You are a medical expert helping explain hemoglobinopathies to patients and their families.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAnswer {
    pub answer: String,
    pub context: RetrievedContext,
}

/// Retrieval-augmented question answering over the hemoglobinopathy corpus.
pub struct Chatbot {
    engine: Arc<RetrievalEngine>,
    generator: Arc<dyn AnswerGenerator>,
}

impl Chatbot {
    pub fn new(engine: Arc<RetrievalEngine>, generator: Arc<dyn AnswerGenerator>) -> Self {
        Self { engine, generator }
    }

    pub fn engine(&self) -> &RetrievalEngine {
        &self.engine
    }

    /// One retrieval, one completion. Generator failures surface as
    /// [`Error::AnswerUnavailable`]; retrieval itself never fails.
    pub fn answer(&self, question: &str) -> Result<ChatAnswer> {
        let context = self.engine.get_relevant_context(question);
        let prompt = build_prompt(&context.text, question);
        let answer = self.generator.complete(CHAT_SYSTEM_ROLE, &prompt).map_err(|e| {
            tracing::error!(error = %e, source = %context.source, "chat completion failed");
            Error::AnswerUnavailable(e.to_string())
        })?;
        tracing::info!(source = %context.source, skipped = context.skipped.len(), "question answered");
        Ok(ChatAnswer { answer, context })
    }
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Using the following medical information about hemoglobinopathies:\n{context}\n\n\
         Please answer this question in a clear and informative way:\n{question}"
    )
}
