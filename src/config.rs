use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LIST_LIMIT: usize = 1000;
const DEFAULT_REQUEST_DELAY_MS: u64 = 100;
const DEFAULT_CONVERTER_BIN: &str = "pdftotext";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Configuration was installed twice in the same process.
    #[error("Configuration already initialized")]
    AlreadyInitialized,
}

/// Runtime configuration for a migration run.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the object storage service.
    pub storage_url: String,
    /// Service key sent as bearer token and `apikey` header to the storage service.
    pub storage_api_key: String,
    /// Bucket holding the uploaded PDF documents.
    pub storage_bucket: String,
    /// Folder inside the bucket that is listed and downloaded from.
    pub storage_prefix: String,
    /// Page size requested from the storage listing endpoint.
    pub storage_list_limit: usize,
    /// Endpoint receiving document submissions.
    pub vectorize_api_url: String,
    /// Optional bearer token for the vectorization endpoint.
    pub vectorize_api_key: Option<String>,
    /// Pause inserted between consecutive jobs.
    pub request_delay_ms: u64,
    /// Executable used to turn PDFs into plain text.
    pub converter_bin: String,
    /// Optional directory for temporary converter inputs.
    pub extraction_temp_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            storage_url: load_env("STORAGE_URL")?,
            storage_api_key: load_env("STORAGE_API_KEY")?,
            storage_bucket: load_env("STORAGE_BUCKET")?,
            storage_prefix: load_env_optional("STORAGE_PREFIX")
                .map(|value| value.trim_matches('/').to_string())
                .unwrap_or_default(),
            storage_list_limit: parse_optional("STORAGE_LIST_LIMIT")?
                .unwrap_or(DEFAULT_LIST_LIMIT),
            vectorize_api_url: load_env("VECTORIZE_API_URL")?,
            vectorize_api_key: load_env_optional("VECTORIZE_API_KEY"),
            request_delay_ms: parse_optional("REQUEST_DELAY_MS")?
                .unwrap_or(DEFAULT_REQUEST_DELAY_MS),
            converter_bin: load_env_optional("PDF_CONVERTER_BIN")
                .unwrap_or_else(|| DEFAULT_CONVERTER_BIN.to_string()),
            extraction_temp_dir: load_env_optional("EXTRACTION_TEMP_DIR").map(PathBuf::from),
        })
    }

    /// Delay applied between jobs.
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    load_env_optional(key).ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        storage_url = %config.storage_url,
        bucket = %config.storage_bucket,
        prefix = %config.storage_prefix,
        vectorize_url = %config.vectorize_api_url,
        has_vectorize_key = config.vectorize_api_key.is_some(),
        converter = %config.converter_bin,
        "Loaded configuration"
    );
    CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInitialized)?;
    CONFIG.get().ok_or(ConfigError::AlreadyInitialized)
}
