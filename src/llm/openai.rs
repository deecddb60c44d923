use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::SiteguardError;
use super::provider::LlmProvider;
use super::types::LlmResponse;
use tracing::debug;

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or("gpt-4o-mini").to_string(),
            base_url: base_url.unwrap_or("https://api.openai.com").to_string(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<LlmResponse, SiteguardError> {
        let mut messages = Vec::new();
        if let Some(sys) = system {
            messages.push(json!({"role": "system", "content": sys}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let body = json!({
            "model": self.model,
            "messages": messages,
        });

        let resp = self.client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SiteguardError::Network(format!("OpenAI API request failed: {}", e)))?;

        let status = resp.status();
        if status == 429 {
            return Err(SiteguardError::RateLimit("OpenAI rate limit exceeded".into()));
        }
        if status == 401 {
            return Err(SiteguardError::Authentication("Invalid OpenAI API key".into()));
        }

        let data: Value = resp.json().await
            .map_err(|e| SiteguardError::LlmApi(format!("Failed to parse OpenAI response: {}", e)))?;

        if let Some(error) = data.get("error") {
            let msg = error["message"].as_str().unwrap_or("Unknown error");
            return Err(SiteguardError::LlmApi(msg.to_string()));
        }

        let content = data["choices"][0]["message"]["content"].as_str()
            .ok_or_else(|| SiteguardError::LlmApi("No content in OpenAI response".into()))?
            .to_string();

        let input_tokens = data["usage"]["prompt_tokens"].as_u64();
        let output_tokens = data["usage"]["completion_tokens"].as_u64();

        debug!(model = %self.model, input_tokens, output_tokens, "OpenAI completion");

        Ok(LlmResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &str { "openai" }
    fn model_name(&self) -> &str { &self.model }
}
