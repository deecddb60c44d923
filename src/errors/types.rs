use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteguardError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sandbox could not be obtained. Fatal to the scan.
    #[error("Acquisition failed: {0}")]
    Acquisition(String),

    /// Target URL resolved to an internal address. The dynamic pass is
    /// skipped; this never fails a scan on its own.
    #[error("Unsafe target: {0}")]
    SafetyRejection(String),

    /// An analyzer's underlying tool failed or produced unparsable output.
    /// Absorbed at the adapter boundary, never propagated.
    #[error("Tool error: {0}")]
    AdapterTool(String),

    /// LLM translation failed for a batch. Absorbed; affected findings keep
    /// their fallback narratives.
    #[error("Translation error: {0}")]
    Translation(String),

    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
