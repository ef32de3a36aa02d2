//! OpenAI-compatible chat completions (`POST {endpoint}/chat/completions`).

use hemo_core::config::LlmSettings;
use hemo_core::error::{Error, Result};
use hemo_core::traits::AnswerGenerator;
use hemo_embed::http::{api_key_from_env, build_client, send_json};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    pub(crate) fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| Error::Provider("chat completion returned no content".to_string()))
    }
}

pub struct OpenAiChat {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(api_key: String, model: String, endpoint: Option<String>, temperature: f32, timeout_secs: u64) -> Result<Self> {
        let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Ok(Self {
            client: build_client(timeout_secs)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model,
            temperature,
        })
    }

    /// Client for patient questions (`llm.chat_temperature`).
    pub fn for_chat(settings: &LlmSettings) -> Result<Self> {
        Self::from_settings(settings, settings.chat_temperature)
    }

    /// Client for report assessment (`llm.analysis_temperature`).
    pub fn for_analysis(settings: &LlmSettings) -> Result<Self> {
        Self::from_settings(settings, settings.analysis_temperature)
    }

    fn from_settings(settings: &LlmSettings, temperature: f32) -> Result<Self> {
        let api_key = api_key_from_env(&settings.api_key_env)?;
        Self::new(api_key, settings.model.clone(), settings.endpoint.clone(), temperature, settings.timeout_secs)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

impl AnswerGenerator for OpenAiChat {
    fn complete(&self, system_role: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system_role },
                ChatMessage { role: "user", content: user_prompt },
            ],
            temperature: self.temperature,
        };
        let request = self.client.post(&url).bearer_auth(&self.api_key).json(&body);
        let response: ChatResponse = send_json(request, "OpenAI chat")?;
        tracing::debug!(model = %self.model, temperature = self.temperature, "chat completion received");
        response.into_text()
    }
}
