use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration. All identity and secret material
/// (LLM key, git access token, webhook URL) is injected here; nothing of
/// that kind is compiled into the binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    pub model: Option<String>,
    /// Override for the provider's API endpoint. Mostly useful for tests
    /// and self-hosted gateways.
    pub base_url: Option<String>,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: None,
            base_url: None,
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GitConfig {
    /// Access token embedded into the clone transport URL.
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerConfig {
    #[serde(default = "default_semgrep_bin")]
    pub semgrep_bin: String,
    #[serde(default = "default_semgrep_config")]
    pub semgrep_config: String,
    #[serde(default = "default_zap_image")]
    pub zap_image: String,
    /// Root under which transient scan workdirs are created.
    #[serde(default = "default_workdir_root")]
    pub workdir_root: PathBuf,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            semgrep_bin: default_semgrep_bin(),
            semgrep_config: default_semgrep_config(),
            zap_image: default_zap_image(),
            workdir_root: default_workdir_root(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct NotifyConfig {
    /// Completed-scan summaries are POSTed here when set. Delivery is
    /// best-effort and never affects scan state.
    pub webhook_url: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8420
}

fn default_db_path() -> String {
    "./siteguard.db".to_string()
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_batch_delay_ms() -> u64 {
    1_000
}

fn default_semgrep_bin() -> String {
    "semgrep".to_string()
}

fn default_semgrep_config() -> String {
    "auto".to_string()
}

fn default_zap_image() -> String {
    "ghcr.io/zaproxy/zaproxy:stable".to_string()
}

fn default_workdir_root() -> PathBuf {
    std::env::temp_dir().join("siteguard")
}
