mod batch;
mod chunker;
pub mod dedup;
mod pipeline;
mod ranker;

pub use batch::{BatchEmbedder, Progress};
pub use chunker::TextSplitter;
pub use dedup::dedup_by_prefix;
pub use pipeline::Pipeline;
pub use ranker::{RankedResult, compare_scores, cosine_similarity, rank};
