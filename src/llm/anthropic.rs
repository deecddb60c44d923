use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use crate::errors::SiteguardError;
use super::provider::LlmProvider;
use super::types::LlmResponse;
use tracing::debug;

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: Option<&str>, base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.unwrap_or("claude-sonnet-4-5-20250929").to_string(),
            base_url: base_url.unwrap_or("https://api.anthropic.com").to_string(),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<LlmResponse, SiteguardError> {
        let mut body = json!({
            "model": self.model,
            "max_tokens": 4096,
            "messages": [{"role": "user", "content": prompt}]
        });

        if let Some(sys) = system {
            body["system"] = json!(sys);
        }

        let resp = self.client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SiteguardError::Network(format!("Anthropic API request failed: {}", e)))?;

        let status = resp.status();
        if status == 429 {
            return Err(SiteguardError::RateLimit("Anthropic rate limit exceeded".into()));
        }
        if status == 401 {
            return Err(SiteguardError::Authentication("Invalid Anthropic API key".into()));
        }

        let data: Value = resp.json().await
            .map_err(|e| SiteguardError::LlmApi(format!("Failed to parse Anthropic response: {}", e)))?;

        if let Some(error) = data.get("error") {
            let msg = error["message"].as_str().unwrap_or("Unknown error");
            return Err(SiteguardError::LlmApi(msg.to_string()));
        }

        let content = data["content"][0]["text"].as_str()
            .ok_or_else(|| SiteguardError::LlmApi("No content in Anthropic response".into()))?
            .to_string();

        let input_tokens = data["usage"]["input_tokens"].as_u64();
        let output_tokens = data["usage"]["output_tokens"].as_u64();

        debug!(model = %self.model, input_tokens, output_tokens, "Anthropic completion");

        Ok(LlmResponse {
            content,
            input_tokens,
            output_tokens,
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &str { "anthropic" }
    fn model_name(&self) -> &str { &self.model }
}
