//! OpenAI embeddings (`POST {endpoint}/embeddings`), also usable with any
//! OpenAI-compatible gateway.

use hemo_core::config::EmbeddingSettings;
use hemo_core::error::Result;
use hemo_core::traits::Embedder;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::http::{api_key_from_env, build_client, check_embeddings, send_json};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    /// Vectors in input order; the API reports each item's input index.
    pub(crate) fn into_vectors(mut self) -> Vec<Vec<f32>> {
        self.data.sort_by_key(|d| d.index);
        self.data.into_iter().map(|d| d.embedding).collect()
    }
}

pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dim: usize,
    id: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: String, endpoint: Option<String>, dim: usize, timeout_secs: u64) -> Result<Self> {
        let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let id = format!("openai:{}:d{}", model, dim);
        Ok(Self {
            client: build_client(timeout_secs)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model,
            dim,
            id,
        })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = api_key_from_env(&settings.api_key_env)?;
        Self::new(
            api_key,
            settings.model.clone(),
            settings.endpoint.clone(),
            settings.dimension,
            settings.timeout_secs,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Embedder for OpenAiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }

    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let url = format!("{}/embeddings", self.endpoint);
        let request = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { model: &self.model, input: texts });
        let response: EmbeddingResponse = send_json(request, "OpenAI embeddings")?;
        tracing::debug!(model = %self.model, count = texts.len(), "embedded texts");
        check_embeddings(response.into_vectors(), texts.len(), self.dim)
    }
}
