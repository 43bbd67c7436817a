//! Where source text and model files come from.

mod download;
mod web;

pub use download::{
    DownloadReport, FailedFile, HF_BASE_URL, ModelDownloader, ModelInfo, Sibling, TOKEN_ENV,
};
pub use web::{WebFetcher, extract_text};
