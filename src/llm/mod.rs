pub mod anthropic;
pub mod openai;
pub mod provider;
pub mod types;

pub use provider::LlmProvider;
pub use types::LlmResponse;

use crate::config::LlmConfig;
use crate::errors::SiteguardError;

pub fn create_provider(config: &LlmConfig) -> Result<Box<dyn LlmProvider>, SiteguardError> {
    match config.provider.as_str() {
        "anthropic" => Ok(Box::new(anthropic::AnthropicProvider::new(
            &config.api_key,
            config.model.as_deref(),
            config.base_url.as_deref(),
        ))),
        "openai" => Ok(Box::new(openai::OpenAiProvider::new(
            &config.api_key,
            config.model.as_deref(),
            config.base_url.as_deref(),
        ))),
        other => Err(SiteguardError::Config(format!(
            "Unknown LLM provider: {}",
            other
        ))),
    }
}
