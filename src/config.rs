//! Configuration management for biography-agent.
//!
//! Configuration can be set via environment variables:
//! - `ARK_API_KEY` - Required. API key for the Ark chat-completions endpoint.
//! - `ARK_BASE_URL` - Optional. Provider base URL. Defaults to the Ark Beijing endpoint.
//! - `PRIMARY_VISION_MODEL` / `PRIMARY_TEXT_MODEL` - Optional. Primary model ids.
//! - `BACKUP_VISION_MODEL` / `BACKUP_TEXT_MODEL` - Optional. Backup model ids.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `DATA_DIR` - Optional. Root for uploads and rendered documents. Defaults to `./data`.
//! - `PUBLIC_BASE_URL` - Optional. Base URL used when building media links.
//! - `PROVIDER_TIMEOUT_SECS` - Optional. Per provider-call timeout. Defaults to `120`.
//! - `TASK_DEADLINE_SECS` - Optional. Overall per-task deadline. Defaults to `1800`.
//! - `MAX_TOKENS` - Optional. Completion token cap. Defaults to `4000`.
//! - `TEMPERATURE` - Optional. Sampling temperature. Defaults to `0.7`.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Connection settings for one provider endpoint.
///
/// The primary and backup differ in their model ids; vision and plain-text
/// operations route to different models, so both ids are carried here.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Human-readable name used in logs and composite errors
    pub name: String,

    /// Chat-completions base URL (without the `/chat/completions` suffix)
    pub base_url: String,

    /// Bearer credential
    pub api_key: String,

    /// Model used for image analysis
    pub vision_model: String,

    /// Model used for text generation and optimization
    pub text_model: String,

    /// Completion token cap
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Primary provider endpoint
    pub primary: ProviderConfig,

    /// Backup provider endpoint
    pub backup: ProviderConfig,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Root directory for uploads and rendered documents
    pub data_dir: PathBuf,

    /// Base URL for public media links (QR payloads)
    pub public_base_url: String,

    /// Timeout applied to each provider call
    pub provider_timeout: Duration,

    /// Deadline applied to a whole pipeline run
    pub task_deadline: Duration,
}

const DEFAULT_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `ARK_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("ARK_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("ARK_API_KEY".to_string()))?;

        let base_url =
            std::env::var("ARK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let max_tokens = parse_env("MAX_TOKENS", 4000u32)?;
        let temperature = parse_env("TEMPERATURE", 0.7f32)?;

        let primary = ProviderConfig {
            name: "primary".to_string(),
            base_url: base_url.clone(),
            api_key: api_key.clone(),
            vision_model: std::env::var("PRIMARY_VISION_MODEL")
                .unwrap_or_else(|_| "doubao-vision-pro-32k-241028".to_string()),
            text_model: std::env::var("PRIMARY_TEXT_MODEL")
                .unwrap_or_else(|_| "doubao-seed-1-6-250615".to_string()),
            max_tokens,
            temperature,
        };

        let backup = ProviderConfig {
            name: "backup".to_string(),
            base_url,
            api_key,
            vision_model: std::env::var("BACKUP_VISION_MODEL")
                .unwrap_or_else(|_| "doubao-1-5-thinking-vision-pro-250428".to_string()),
            text_model: std::env::var("BACKUP_TEXT_MODEL")
                .unwrap_or_else(|_| "doubao-seed-1-6-thinking-250615".to_string()),
            max_tokens,
            temperature,
        };

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let provider_timeout = Duration::from_secs(parse_env("PROVIDER_TIMEOUT_SECS", 120u64)?);
        let task_deadline = Duration::from_secs(parse_env("TASK_DEADLINE_SECS", 1800u64)?);

        Ok(Self {
            primary,
            backup,
            host,
            port,
            data_dir,
            public_base_url,
            provider_timeout,
            task_deadline,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn for_tests(data_dir: PathBuf) -> Self {
        let primary = ProviderConfig {
            name: "primary".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: "test-key".to_string(),
            vision_model: "vision-a".to_string(),
            text_model: "text-a".to_string(),
            max_tokens: 4000,
            temperature: 0.7,
        };
        let backup = ProviderConfig {
            name: "backup".to_string(),
            vision_model: "vision-b".to_string(),
            text_model: "text-b".to_string(),
            ..primary.clone()
        };
        Self {
            primary,
            backup,
            host: "127.0.0.1".to_string(),
            port: 0,
            data_dir,
            public_base_url: "http://localhost:3000".to_string(),
            provider_timeout: Duration::from_secs(120),
            task_deadline: Duration::from_secs(1800),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e))),
        Err(_) => Ok(default),
    }
}
