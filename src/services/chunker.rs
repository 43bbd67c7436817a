//! Text chunking with token overlap for embedding.

use regex::Regex;
use tracing::debug;

use crate::error::ConfigError;
use crate::models::{Chunk, ChunkingConfig, Tokenization};
use crate::services::dedup::dedup_by_prefix;

/// Word runs or symbol runs; whitespace is never part of a token.
const LEXICAL_PATTERN: &str = r"\w+|[^\w\s]+";

/// Splits text into windows of whole tokens, carrying a token suffix
/// from each chunk into the next.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    /// Maximum chunk length in characters
    interval: usize,
    /// Trailing tokens carried into the next chunk
    overlap: usize,
    delimiter: String,
    tokenization: Tokenization,
    dedup: bool,
    lexical: Regex,
}

impl TextSplitter {
    /// Create a splitter, rejecting configurations that could never shrink a chunk.
    pub fn new(config: &ChunkingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let lexical = Regex::new(LEXICAL_PATTERN)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        Ok(Self {
            interval: config.interval,
            overlap: config.overlap,
            delimiter: config.delimiter.clone(),
            tokenization: config.tokenization,
            dedup: config.dedup,
            lexical,
        })
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into ordered chunks.
    ///
    /// Paragraphs are separated on the configured delimiter before
    /// tokenizing, but a chunk may span paragraph boundaries. A chunk longer
    /// than `interval` characters holds its carried prefix plus exactly one
    /// new token.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut size = 0usize;
        let mut carried = 0usize;

        for line in text.split(self.delimiter.as_str()) {
            for token in self.tokenize(line) {
                let cost = token_cost(token);

                if !current.is_empty() && size + cost > self.interval {
                    chunks.push(Chunk::new(chunks.len(), &current, carried));

                    let keep = self.overlap.min(current.len());
                    current.drain(..current.len() - keep);
                    size = current.iter().map(|t| token_cost(t)).sum();
                    carried = current.len();
                }

                current.push(token);
                size += cost;
            }
        }

        if !current.is_empty() {
            chunks.push(Chunk::new(chunks.len(), &current, carried));
        }

        debug!(
            chunks = chunks.len(),
            interval = self.interval,
            overlap = self.overlap,
            "split text"
        );

        if self.dedup {
            let before = chunks.len();
            let chunks = dedup_by_prefix(chunks);
            debug!(removed = before - chunks.len(), "deduplicated chunks");
            chunks
        } else {
            chunks
        }
    }

    /// Tokenize one paragraph according to the configured mode.
    pub fn tokenize<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self.tokenization {
            Tokenization::Lexical => self.lexical.find_iter(line).map(|m| m.as_str()).collect(),
            Tokenization::Whitespace => line.split_whitespace().collect(),
        }
    }
}

/// Characters a token occupies in a chunk, including its joining space.
fn token_cost(token: &str) -> usize {
    token.chars().count() + 1
}
