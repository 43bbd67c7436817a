//! Embedding provider abstraction.
//!
//! The pipeline never computes embeddings itself. Anything that can turn a
//! batch of texts into fixed-length vectors (a local ONNX model, a remote
//! server, a test stub) implements [`EmbeddingProvider`] and is handed to the
//! batch orchestrator by the caller.

mod http;
mod onnx;
mod pooling;

pub use http::HttpProvider;
pub use onnx::OnnxProvider;
pub use pooling::{l2_normalize, mean_pool};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, EmbeddingError};
use crate::models::{Config, Embedding, ProviderKind};

/// Abstract trait for embedding backends.
///
/// Implementations must return exactly one vector per input text, in input
/// order, and every vector from one provider must share a dimension.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError>;

    /// Embed a single query string.
    async fn embed_query(&self, query: &str) -> Result<Embedding, EmbeddingError> {
        self.embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    /// Human-readable provider name for logs and output.
    fn name(&self) -> &str;
}

/// Build the provider selected in the configuration.
///
/// Loading happens here, once; dropping the returned handle releases the
/// model or HTTP client.
pub fn create_provider(config: &Config) -> Result<Arc<dyn EmbeddingProvider>, AppError> {
    match config.embedding.provider {
        ProviderKind::Onnx => {
            let model_dir = config.model_dir()?;
            let provider = OnnxProvider::load(&config.embedding, &model_dir)
                .map_err(EmbeddingError::from)?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Http => {
            let provider = HttpProvider::new(&config.embedding)?;
            Ok(Arc::new(provider))
        }
    }
}
