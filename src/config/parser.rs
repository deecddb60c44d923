use std::path::Path;
use crate::errors::SiteguardError;
use super::types::AppConfig;
use tracing::debug;

/// Load configuration from an optional YAML file, then apply environment
/// overrides. Secrets are expected to arrive via the environment in most
/// deployments; the file covers everything else.
pub async fn load_config(path: Option<&Path>) -> Result<AppConfig, SiteguardError> {
    let mut config = match path {
        Some(p) => {
            let raw = tokio::fs::read_to_string(p).await.map_err(|e| {
                SiteguardError::Config(format!("Cannot read config file {}: {}", p.display(), e))
            })?;
            serde_yaml::from_str::<AppConfig>(&raw)
                .map_err(|e| SiteguardError::Config(format!("Invalid config file: {}", e)))?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config);

    if config.llm.api_key.is_empty() {
        debug!("No LLM API key configured; translation will use fallback narratives");
    }

    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(v) = std::env::var("SITEGUARD_LLM_PROVIDER") {
        config.llm.provider = v;
    }
    if let Ok(v) = std::env::var("SITEGUARD_LLM_API_KEY") {
        config.llm.api_key = v;
    }
    if let Ok(v) = std::env::var("SITEGUARD_LLM_MODEL") {
        config.llm.model = Some(v);
    }
    if let Ok(v) = std::env::var("SITEGUARD_GIT_TOKEN") {
        config.git.access_token = v;
    }
    if let Ok(v) = std::env::var("SITEGUARD_WEBHOOK_URL") {
        config.notify.webhook_url = Some(v);
    }
    if let Ok(v) = std::env::var("SITEGUARD_DB_PATH") {
        config.server.db_path = v;
    }
}
