//! Sequential batched embedding with progress reporting.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ConfigError, EmbeddingError};
use crate::models::Embedding;
use crate::providers::EmbeddingProvider;

/// Progress after a completed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Texts embedded so far
    pub processed: usize,
    /// Texts in the whole run
    pub total: usize,
}

impl Progress {
    /// Share of texts embedded, in `[0, 100]`.
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        self.processed as f32 / self.total as f32 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// Drives an [`EmbeddingProvider`] over a corpus one batch at a time.
#[derive(Clone)]
pub struct BatchEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl BatchEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        Ok(Self {
            provider,
            batch_size,
        })
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed every text, returning vectors in input order.
    ///
    /// Batches are awaited one after another. The first provider failure
    /// aborts the run; nothing after the failing batch is attempted.
    pub async fn embed_all<F>(
        &self,
        texts: &[String],
        mut on_progress: F,
    ) -> Result<Vec<Embedding>, EmbeddingError>
    where
        F: FnMut(Progress),
    {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let total = texts.len();
        let mut all_embeddings: Vec<Embedding> = Vec::with_capacity(total);
        let mut dimension: Option<usize> = None;

        for (batch_index, batch) in texts.chunks(self.batch_size).enumerate() {
            let embeddings = self.provider.embed(batch).await?;

            if embeddings.len() != batch.len() {
                return Err(EmbeddingError::BatchSizeMismatch {
                    expected: batch.len(),
                    actual: embeddings.len(),
                });
            }

            for embedding in &embeddings {
                match dimension {
                    None => dimension = Some(embedding.len()),
                    Some(expected) if expected != embedding.len() => {
                        return Err(EmbeddingError::DimensionMismatch {
                            expected,
                            actual: embedding.len(),
                        });
                    }
                    Some(_) => {}
                }
            }

            all_embeddings.extend(embeddings);

            let progress = Progress {
                processed: all_embeddings.len(),
                total,
            };
            debug!(
                batch = batch_index + 1,
                processed = progress.processed,
                total,
                provider = self.provider.name(),
                "embedded batch"
            );
            on_progress(progress);
        }

        Ok(all_embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Deterministic per-text embedding; records every batch it sees.
    #[derive(Default)]
    struct RecordingProvider {
        batches: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl EmbeddingProvider for RecordingProvider {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
            self.batches.lock().unwrap().push(texts.to_vec());
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, t.bytes().map(f32::from).sum()])
                .collect())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    /// Fails on the given call number (1-based).
    struct FailingProvider {
        fail_on: usize,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == self.fail_on {
                return Err(EmbeddingError::ServerError("status 500".to_string()));
            }
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct ShortProvider;

    #[async_trait]
    impl EmbeddingProvider for ShortProvider {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0]).collect())
        }

        fn name(&self) -> &str {
            "short"
        }
    }

    struct RaggedProvider;

    #[async_trait]
    impl EmbeddingProvider for RaggedProvider {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
            Ok(texts.iter().map(|t| vec![0.5; t.len()]).collect())
        }

        fn name(&self) -> &str {
            "ragged"
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("chunk number {i}")).collect()
    }

    #[tokio::test]
    async fn test_batches_are_consecutive_and_bounded() {
        let provider = Arc::new(RecordingProvider::default());
        let embedder = BatchEmbedder::new(provider.clone(), 3).unwrap();

        let embeddings = embedder.embed_all(&texts(7), |_| {}).await.unwrap();

        assert_eq!(embeddings.len(), 7);
        let sizes: Vec<usize> = provider
            .batches
            .lock()
            .unwrap()
            .iter()
            .map(Vec::len)
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn test_order_independent_of_batch_size() {
        let input = texts(10);
        let one = BatchEmbedder::new(Arc::new(RecordingProvider::default()), 1).unwrap();
        let all = BatchEmbedder::new(Arc::new(RecordingProvider::default()), 10).unwrap();
        let odd = BatchEmbedder::new(Arc::new(RecordingProvider::default()), 4).unwrap();

        let a = one.embed_all(&input, |_| {}).await.unwrap();
        let b = all.embed_all(&input, |_| {}).await.unwrap();
        let c = odd.embed_all(&input, |_| {}).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a, c);
        for (text, embedding) in input.iter().zip(&a) {
            assert_eq!(embedding[0], text.len() as f32);
        }
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_completes() {
        let embedder = BatchEmbedder::new(Arc::new(RecordingProvider::default()), 4).unwrap();
        let mut seen = Vec::new();

        embedder
            .embed_all(&texts(10), |p| seen.push(p))
            .await
            .unwrap();

        let processed: Vec<usize> = seen.iter().map(|p| p.processed).collect();
        assert_eq!(processed, vec![4, 8, 10]);
        assert!(seen.iter().all(|p| p.total == 10));
        assert!(seen.windows(2).all(|w| w[0].percent() < w[1].percent()));
        assert_eq!(seen.last().unwrap().percent(), 100.0);
        assert!(seen.last().unwrap().is_complete());
    }

    #[tokio::test]
    async fn test_empty_input_skips_provider() {
        let provider = Arc::new(RecordingProvider::default());
        let embedder = BatchEmbedder::new(provider.clone(), 8).unwrap();
        let mut calls = 0;

        let embeddings = embedder.embed_all(&[], |_| calls += 1).await.unwrap();

        assert!(embeddings.is_empty());
        assert_eq!(calls, 0);
        assert!(provider.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_stops_further_batches() {
        let provider = Arc::new(FailingProvider {
            fail_on: 2,
            calls: Mutex::new(0),
        });
        let embedder = BatchEmbedder::new(provider.clone(), 2).unwrap();
        let mut progress_calls = 0;

        let result = embedder
            .embed_all(&texts(8), |_| progress_calls += 1)
            .await;

        assert!(matches!(result, Err(EmbeddingError::ServerError(_))));
        assert_eq!(*provider.calls.lock().unwrap(), 2);
        assert_eq!(progress_calls, 1);
    }

    #[tokio::test]
    async fn test_short_batch_is_rejected() {
        let embedder = BatchEmbedder::new(Arc::new(ShortProvider), 3).unwrap();
        let result = embedder.embed_all(&texts(3), |_| {}).await;
        assert!(matches!(
            result,
            Err(EmbeddingError::BatchSizeMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_rejected() {
        let embedder = BatchEmbedder::new(Arc::new(RaggedProvider), 1).unwrap();
        let input = vec!["ab".to_string(), "abc".to_string()];
        let result = embedder.embed_all(&input, |_| {}).await;
        assert!(matches!(
            result,
            Err(EmbeddingError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let result = BatchEmbedder::new(Arc::new(ShortProvider), 0);
        assert!(matches!(result, Err(ConfigError::InvalidBatchSize)));
    }

    #[test]
    fn test_progress_percent() {
        let p = Progress {
            processed: 1,
            total: 4,
        };
        assert_eq!(p.percent(), 25.0);
        assert!(!p.is_complete());
    }
}
