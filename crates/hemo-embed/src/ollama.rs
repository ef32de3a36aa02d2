//! Ollama embeddings via the local `/api/embed` endpoint. No authentication.

use hemo_core::config::EmbeddingSettings;
use hemo_core::error::Result;
use hemo_core::traits::Embedder;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, check_embeddings, send_json};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

pub struct OllamaEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dim: usize,
    id: String,
}

impl OllamaEmbedder {
    pub fn new(model: String, endpoint: Option<String>, dim: usize, timeout_secs: u64) -> Result<Self> {
        let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let id = format!("ollama:{}:d{}", model, dim);
        Ok(Self {
            client: build_client(timeout_secs)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            dim,
            id,
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        Self::new(settings.model.clone(), settings.endpoint.clone(), settings.dimension, settings.timeout_secs)
    }
}

impl Embedder for OllamaEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let url = format!("{}/api/embed", self.endpoint);
        let request = self.client.post(&url).json(&OllamaEmbedRequest { model: &self.model, input: texts });
        let response: OllamaEmbedResponse = send_json(request, "Ollama embed")?;
        check_embeddings(response.embeddings, texts.len(), self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_defaults_to_local_endpoint() {
        let provider = OllamaEmbedder::new("nomic-embed-text".to_string(), None, 768, 10).unwrap();
        assert_eq!(provider.dim(), 768);
        assert_eq!(provider.embedder_id(), "ollama:nomic-embed-text:d768");
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
    }
}
