//! Search-related models for queries and results.

use serde::{Deserialize, Serialize};

use super::chunk::SourceRef;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
    /// Documentation-friendly Markdown format
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

/// A single ranked chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// 1-based rank
    pub rank: usize,

    /// Index of the chunk in the corpus
    pub chunk_index: usize,

    /// Cosine similarity; `None` when undefined for this chunk
    pub score: Option<f32>,

    /// Chunk content
    pub content: String,
}

/// Collection of search results for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// Query that was executed
    pub query: String,

    /// Where the ranked text came from
    pub source: SourceRef,

    /// SHA-256 of the source text
    pub checksum: String,

    /// Matching results
    pub results: Vec<SearchHit>,

    /// Chunks considered for ranking
    pub total_chunks: u64,

    /// End-to-end execution time in milliseconds
    pub duration_ms: u64,
}

impl SearchResults {
    /// Check if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Get the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }
}
