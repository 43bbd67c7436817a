mod chunk;
mod config;
mod search;

pub use chunk::{Chunk, Corpus, Embedding, SourceRef};
pub use config::{
    ChunkingConfig, Config, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL, EmbeddingConfig,
    FetchConfig, ProviderKind, SearchConfig, Tokenization, model_dir_name,
};
pub use search::{OutputFormat, SearchHit, SearchResults};
