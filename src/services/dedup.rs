//! Prefix-fingerprint deduplication of chunks.
//!
//! Two chunks are treated as duplicates when the first
//! [`FINGERPRINT_CHARS`] characters of their trimmed text match. This is an
//! approximation: chunks sharing a long common prefix are merged even if
//! their tails differ, and near-duplicates with different openings are kept.

use std::collections::HashSet;

use crate::models::Chunk;

/// Number of leading characters that identify a chunk.
pub const FINGERPRINT_CHARS: usize = 50;

/// Fingerprint of a chunk's text.
pub fn fingerprint(text: &str) -> String {
    text.trim().chars().take(FINGERPRINT_CHARS).collect()
}

/// Keep the first chunk for each fingerprint, preserving relative order.
///
/// Surviving chunks are reindexed from zero. `carried` still counts tokens
/// shared with the chunk that preceded it before deduplication.
pub fn dedup_by_prefix(chunks: Vec<Chunk>) -> Vec<Chunk> {
    let mut seen = HashSet::new();

    chunks
        .into_iter()
        .filter(|chunk| seen.insert(fingerprint(&chunk.text)))
        .enumerate()
        .map(|(index, mut chunk)| {
            chunk.index = index;
            chunk
        })
        .collect()
}
