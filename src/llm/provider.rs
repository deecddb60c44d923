use async_trait::async_trait;
use crate::errors::SiteguardError;
use super::types::LlmResponse;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Free-form text completion with an optional system instruction.
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<LlmResponse, SiteguardError>;

    /// Provider name for logging
    fn provider_name(&self) -> &str;

    /// Model identifier
    fn model_name(&self) -> &str;
}
