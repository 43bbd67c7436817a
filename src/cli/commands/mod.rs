mod chunk;
mod common;
mod config;
mod model;
mod search;

pub use chunk::ChunkArgs;
pub use common::{InputArgs, SplitterArgs};
pub use config::ConfigCommand;
pub use model::ModelCommand;
pub use search::SearchArgs;

pub use chunk::handle_chunk;
pub use config::handle_config;
pub use model::handle_model;
pub use search::handle_search;
