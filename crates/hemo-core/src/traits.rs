use crate::error::{Error, Result};
use crate::types::SearchHit;

/// Converts text into fixed-length vectors.
///
/// Every vector returned by one embedder has `dim()` components; vectors from
/// different `embedder_id`s must never share an index.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-ada-002:d1536`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality.
    fn dim(&self) -> usize;
    /// Compute embeddings for a batch of input texts, in input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.embed_batch(&[text.to_string()])?;
        if out.len() != 1 {
            return Err(Error::Provider(format!("expected 1 embedding, got {}", out.len())));
        }
        Ok(out.remove(0))
    }
}

/// Nearest-neighbour search over stored passages.
pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Return up to `k` hits ordered closest-first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>>;
}

/// Produces a natural-language answer from a system role and a user prompt.
pub trait AnswerGenerator: Send + Sync {
    fn complete(&self, system_role: &str, user_prompt: &str) -> Result<String>;
}
