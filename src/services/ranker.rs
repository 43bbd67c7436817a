//! Cosine-similarity ranking of chunk embeddings against a query.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::RankError;
use crate::models::Embedding;

/// A chunk and its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedResult<'a> {
    /// Index of the chunk in the ranked corpus
    pub index: usize,
    pub text: &'a str,
    /// Cosine similarity, or NaN when undefined
    pub score: f32,
}

impl RankedResult<'_> {
    /// Whether the similarity is defined for this chunk.
    pub fn is_scored(&self) -> bool {
        !self.score.is_nan()
    }
}

/// Cosine similarity of two vectors.
///
/// Returns NaN when either vector has zero magnitude or the lengths differ.
/// Callers rank NaN below every real score, see [`compare_scores`].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::NAN;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return f32::NAN;
    }

    dot_product / (norm_a * norm_b)
}

/// Descending order over scores with NaN sorted last.
pub fn compare_scores(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Rank `chunks` by similarity of their embeddings to `query`.
///
/// Returns at most `k` results, best first. Equal scores keep source order.
pub fn rank<'a, T: AsRef<str>>(
    query: &[f32],
    embeddings: &[Embedding],
    chunks: &'a [T],
    k: usize,
) -> Result<Vec<RankedResult<'a>>, RankError> {
    if embeddings.len() != chunks.len() {
        return Err(RankError::LengthMismatch {
            embeddings: embeddings.len(),
            chunks: chunks.len(),
        });
    }

    if k == 0 {
        return Ok(Vec::new());
    }

    let mut scored: Vec<RankedResult<'a>> = chunks
        .iter()
        .zip(embeddings)
        .enumerate()
        .map(|(index, (chunk, embedding))| RankedResult {
            index,
            text: chunk.as_ref(),
            score: cosine_similarity(query, embedding),
        })
        .collect();

    // sort_by is stable, so ties stay in index order
    scored.sort_by(|a, b| compare_scores(a.score, b.score));
    scored.truncate(k);

    Ok(scored)
}
