//! Split, embed and rank composed into one corpus-level pipeline.

use tracing::debug;

use super::batch::{BatchEmbedder, Progress};
use super::chunker::TextSplitter;
use super::ranker::{RankedResult, rank};
use crate::error::{EmbeddingError, PipelineError};
use crate::models::{Chunk, Corpus, SourceRef};
use crate::utils::calculate_checksum;

/// Owns a configured splitter and the embedder it feeds.
pub struct Pipeline {
    splitter: TextSplitter,
    embedder: BatchEmbedder,
}

impl Pipeline {
    pub fn new(splitter: TextSplitter, embedder: BatchEmbedder) -> Self {
        Self { splitter, embedder }
    }

    pub fn splitter(&self) -> &TextSplitter {
        &self.splitter
    }

    pub fn embedder(&self) -> &BatchEmbedder {
        &self.embedder
    }

    pub fn split(&self, text: &str) -> Vec<Chunk> {
        self.splitter.split(text)
    }

    /// Split `text` and embed every chunk.
    ///
    /// Empty text yields an empty corpus without calling the provider.
    pub async fn build_corpus<F>(
        &self,
        source: SourceRef,
        text: &str,
        on_progress: F,
    ) -> Result<Corpus, PipelineError>
    where
        F: FnMut(Progress),
    {
        let checksum = calculate_checksum(text);
        let chunks = self.split(text);
        self.embed_chunks(source, checksum, chunks, on_progress).await
    }

    /// Embed already split chunks into a corpus.
    pub async fn embed_chunks<F>(
        &self,
        source: SourceRef,
        checksum: String,
        chunks: Vec<Chunk>,
        on_progress: F,
    ) -> Result<Corpus, PipelineError>
    where
        F: FnMut(Progress),
    {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        let embeddings = self.embedder.embed_all(&texts, on_progress).await?;
        let dimension = embeddings.first().map(Vec::len);

        debug!(
            source = %source,
            chunks = chunks.len(),
            dimension = ?dimension,
            "corpus built"
        );

        Ok(Corpus {
            source,
            checksum,
            chunks,
            embeddings,
            dimension,
        })
    }

    /// Embed `query` and return the `k` most similar chunks of `corpus`.
    pub async fn search<'a>(
        &self,
        corpus: &'a Corpus,
        query: &str,
        k: usize,
    ) -> Result<Vec<RankedResult<'a>>, PipelineError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PipelineError::InvalidQuery("query is empty".to_string()));
        }

        if corpus.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.provider().embed_query(query).await?;

        if let Some(expected) = corpus.dimension
            && expected != query_embedding.len()
        {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: query_embedding.len(),
            }
            .into());
        }

        Ok(rank(&query_embedding, &corpus.embeddings, &corpus.chunks, k)?)
    }
}
