//! Chunk and corpus models produced by the splitting pipeline.

use serde::{Deserialize, Serialize};

/// Embedding vector produced by a provider.
pub type Embedding = Vec<f32>;

/// A contiguous window of source tokens joined with single spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the emitted sequence
    pub index: usize,

    /// Space-joined token text
    pub text: String,

    /// Number of tokens in this chunk
    pub token_count: usize,

    /// Leading tokens repeated from the previous chunk
    pub carried: usize,
}

impl Chunk {
    pub fn new(index: usize, tokens: &[&str], carried: usize) -> Self {
        Self {
            index,
            text: tokens.join(" "),
            token_count: tokens.len(),
            carried,
        }
    }

    /// Length of the chunk text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl AsRef<str> for Chunk {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// Where the corpus text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum SourceRef {
    Url(String),
    File(String),
    Inline,
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceRef::Url(url) => write!(f, "{url}"),
            SourceRef::File(path) => write!(f, "{path}"),
            SourceRef::Inline => write!(f, "<inline>"),
        }
    }
}

/// Chunks and their embeddings for a single pipeline run.
///
/// `embeddings[i]` always belongs to `chunks[i]`.
#[derive(Debug, Clone, Serialize)]
pub struct Corpus {
    pub source: SourceRef,
    pub checksum: String,
    pub chunks: Vec<Chunk>,
    #[serde(skip)]
    pub embeddings: Vec<Embedding>,
    pub dimension: Option<usize>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_new_joins_tokens() {
        let chunk = Chunk::new(2, &["risks", "."], 1);
        assert_eq!(chunk.text, "risks .");
        assert_eq!(chunk.token_count, 2);
        assert_eq!(chunk.carried, 1);
        assert_eq!(chunk.index, 2);
    }

    #[test]
    fn test_char_len_counts_chars_not_bytes() {
        let chunk = Chunk::new(0, &["naïve", "café"], 0);
        assert_eq!(chunk.char_len(), 10);
    }

    #[test]
    fn test_source_ref_display() {
        assert_eq!(SourceRef::Url("https://a.b".into()).to_string(), "https://a.b");
        assert_eq!(SourceRef::Inline.to_string(), "<inline>");
    }
}
