use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::search::OutputFormat;
use crate::error::ConfigError;

pub const APP_DIR: &str = "pagesim";
pub const DEFAULT_EMBEDDING_MODEL: &str = "Xenova/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_USER_AGENT: &str = concat!("pagesim/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join("config.toml"))
    }

    pub fn models_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join(APP_DIR).join("models"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load the config file, falling back to defaults with a warning when it
    /// cannot be read or is invalid.
    pub fn load_or_default() -> Self {
        Self::or_default(Self::load())
    }

    fn or_default(loaded: Result<Self, ConfigError>) -> Self {
        loaded.unwrap_or_else(|e| {
            warn!(error = %e, "ignoring config file, using defaults");
            Self::default()
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Directory holding the files of the configured ONNX model.
    pub fn model_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.embedding.model_path {
            return Ok(path.clone());
        }
        Self::models_dir()
            .map(|dir| dir.join(model_dir_name(&self.embedding.model_id)))
            .ok_or_else(|| ConfigError::PathError("could not determine data directory".to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.search.default_limit == 0 {
            return Err(ConfigError::ValidationError(
                "search.default_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// `org/name` model ids are stored as `org--name` directories.
pub fn model_dir_name(model_id: &str) -> String {
    model_id.replace('/', "--")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local ONNX Runtime inference
    #[default]
    Onnx,
    /// Remote embedding server
    Http,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Onnx => write!(f, "onnx"),
            ProviderKind::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,

    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub normalize: bool,
}

fn default_model_id() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    32
}

fn default_max_tokens() -> u32 {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model_id: default_model_id(),
            model_path: None,
            url: default_embedding_url(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
            max_tokens: default_max_tokens(),
            normalize: false,
        }
    }
}

/// How a paragraph is broken into tokens before windowing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenization {
    /// Runs of word characters and runs of symbols are separate tokens
    #[default]
    Lexical,
    /// Tokens are whitespace-separated words
    Whitespace,
}

impl std::str::FromStr for Tokenization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lexical" => Ok(Tokenization::Lexical),
            "whitespace" | "ws" => Ok(Tokenization::Whitespace),
            _ => Err(format!("unknown tokenization: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters
    #[serde(default = "default_interval")]
    pub interval: usize,

    /// Trailing tokens carried into the next chunk
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default)]
    pub tokenization: Tokenization,

    #[serde(default)]
    pub dedup: bool,
}

fn default_interval() -> usize {
    300
}

fn default_overlap() -> usize {
    50
}

fn default_delimiter() -> String {
    "\n\n".to_string()
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            overlap: default_overlap(),
            delimiter: default_delimiter(),
            tokenization: Tokenization::default(),
            dedup: false,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if self.overlap >= self.interval {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.overlap,
                interval: self.interval,
            });
        }
        if self.delimiter.is_empty() {
            return Err(ConfigError::ValidationError(
                "chunking.delimiter cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_limit() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_format: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
