//! Error types for pagesim.

use thiserror::Error;

/// Errors related to loading and running a local embedding model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model not found: {0}")]
    NotFound(String),

    #[error("failed to load model: {0}")]
    LoadError(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),

    #[error("inference error: {0}")]
    InferenceError(String),
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("provider returned {actual} embeddings for a batch of {expected}")]
    BatchSizeMismatch { expected: usize, actual: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("chunk interval must be greater than zero")]
    InvalidInterval,

    #[error("overlap ({overlap}) must be smaller than interval ({interval})")]
    OverlapTooLarge { overlap: usize, interval: usize },

    #[error("batch size must be at least 1")]
    InvalidBatchSize,
}

/// Errors related to fetching source text from the web.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("HTML parse error: {0}")]
    ParseError(String),
}

/// Errors related to downloading model files.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HUGGING_FACE_TOKEN environment variable is not set")]
    MissingToken,

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("failed to fetch {url}: status {status}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to ranking chunk embeddings.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("{embeddings} embeddings supplied for {chunks} chunks")]
    LengthMismatch { embeddings: usize, chunks: usize },
}

/// Errors raised while building or querying a corpus.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("rank error: {0}")]
    Rank(#[from] RankError),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("{0}")]
    Other(String),
}
