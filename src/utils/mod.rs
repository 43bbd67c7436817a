//! Utility modules.

pub mod file;
pub mod text;

pub use file::{MAX_SOURCE_BYTES, read_text_file};
pub use text::{calculate_checksum, collapse_whitespace, preview};
