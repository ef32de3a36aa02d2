//! Embedding providers.
//!
//! Remote providers (OpenAI, Ollama) are the default; `FakeEmbedder` is
//! selected by `APP_USE_FAKE_EMBEDDINGS=1` or `embedding.provider = "fake"`.
//! The on-device BGE-M3 model needs the `local-model` feature.

use std::sync::Arc;

use hemo_core::config::{EmbeddingProviderKind, EmbeddingSettings};
use hemo_core::error::Result;
use hemo_core::traits::Embedder;

pub mod fake;
pub mod http;
pub mod ollama;
pub mod openai;

#[cfg(feature = "local-model")]
pub mod local;

pub use fake::FakeEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

#[cfg(feature = "local-model")]
pub use local::masked_mean_l2;

pub fn fake_embeddings_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the embedder described by `settings`.
pub fn embedder_from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if fake_embeddings_requested() {
        tracing::info!(dim = settings.dimension, "using FakeEmbedder (APP_USE_FAKE_EMBEDDINGS)");
        return Ok(Arc::new(FakeEmbedder::new(settings.dimension)));
    }
    let embedder: Arc<dyn Embedder> = match settings.provider {
        EmbeddingProviderKind::Openai => Arc::new(OpenAiEmbedder::from_settings(settings)?),
        EmbeddingProviderKind::Ollama => Arc::new(OllamaEmbedder::from_settings(settings)?),
        EmbeddingProviderKind::Fake => Arc::new(FakeEmbedder::new(settings.dimension)),
        EmbeddingProviderKind::Local => local_embedder()?,
    };
    tracing::info!(embedder = embedder.embedder_id(), "embedding provider ready");
    Ok(embedder)
}

#[cfg(feature = "local-model")]
fn local_embedder() -> Result<Arc<dyn Embedder>> {
    Ok(Arc::new(local::BgeM3Embedder::new()?))
}

#[cfg(not(feature = "local-model"))]
fn local_embedder() -> Result<Arc<dyn Embedder>> {
    Err(hemo_core::error::Error::InvalidConfig(
        "embedding.provider = \"local\" requires building with the `local-model` feature".to_string(),
    ))
}
