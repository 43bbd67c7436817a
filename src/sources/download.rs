//! Download every file of a HuggingFace model repository.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::DownloadError;

pub const HF_BASE_URL: &str = "https://huggingface.co";
pub const TOKEN_ENV: &str = "HUGGING_FACE_TOKEN";

/// Subset of `GET /api/models/{id}` used to list repository files.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub siblings: Vec<Sibling>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sibling {
    pub rfilename: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub file: String,
    pub error: String,
}

/// Outcome of a model download. Per-file failures do not abort the run.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub model_id: String,
    pub target: PathBuf,
    pub downloaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedFile>,
    pub finished_at: DateTime<Utc>,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ModelDownloader {
    client: Client,
    token: String,
    base_url: String,
}

impl ModelDownloader {
    pub fn new(token: impl Into<String>) -> Result<Self, DownloadError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(DownloadError::MissingToken);
        }

        Ok(Self {
            client: Client::builder().build()?,
            token,
            base_url: HF_BASE_URL.to_string(),
        })
    }

    /// Build a downloader from `HUGGING_FACE_TOKEN`.
    pub fn from_env() -> Result<Self, DownloadError> {
        let token = std::env::var(TOKEN_ENV).map_err(|_| DownloadError::MissingToken)?;
        Self::new(token)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model_info_url(&self, model_id: &str) -> String {
        format!("{}/api/models/{}", self.base_url, model_id)
    }

    pub fn file_url(&self, model_id: &str, file: &str) -> String {
        format!("{}/{}/resolve/main/{}", self.base_url, model_id, file)
    }

    /// File names listed for `model_id`.
    pub async fn list_files(&self, model_id: &str) -> Result<Vec<String>, DownloadError> {
        let url = self.model_info_url(model_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DownloadError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let info: ModelInfo = response.json().await?;
        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }

    /// Download all files of `model_id` into `target`.
    ///
    /// Existing files are kept unless `force` is set. `on_file` is called
    /// once per listed file, after it has been handled.
    pub async fn download_model<F>(
        &self,
        model_id: &str,
        target: &Path,
        force: bool,
        mut on_file: F,
    ) -> Result<DownloadReport, DownloadError>
    where
        F: FnMut(&str, usize),
    {
        let files = self.list_files(model_id).await?;
        let total = files.len();
        tokio::fs::create_dir_all(target).await?;

        let mut report = DownloadReport {
            model_id: model_id.to_string(),
            target: target.to_path_buf(),
            downloaded: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            finished_at: Utc::now(),
        };

        for file in files {
            match relative_path(&file) {
                None => {
                    warn!(file = %file, "refusing file name outside the model directory");
                    report.failed.push(FailedFile {
                        file: file.clone(),
                        error: "unsafe file name".to_string(),
                    });
                }
                Some(relative) => {
                    let output = target.join(relative);
                    if !force && output.exists() {
                        debug!(file = %file, "already present");
                        report.skipped.push(file.clone());
                    } else {
                        match self.download_file(model_id, &file, &output).await {
                            Ok(bytes) => {
                                debug!(file = %file, bytes, "downloaded");
                                report.downloaded.push(file.clone());
                            }
                            Err(e) => {
                                warn!(file = %file, error = %e, "download failed");
                                report.failed.push(FailedFile {
                                    file: file.clone(),
                                    error: e.to_string(),
                                });
                            }
                        }
                    }
                }
            }
            on_file(&file, total);
        }

        report.finished_at = Utc::now();
        info!(
            model = model_id,
            downloaded = report.downloaded.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "model download finished"
        );

        Ok(report)
    }

    async fn download_file(
        &self,
        model_id: &str,
        file: &str,
        output: &Path,
    ) -> Result<usize, DownloadError> {
        let url = self.file_url(model_id, file);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DownloadError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, &bytes).await?;

        Ok(bytes.len())
    }
}

/// `name` as a path that stays inside the target directory.
fn relative_path(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    let mut components = path.components().peekable();
    components.peek()?;

    if components.all(|c| matches!(c, Component::Normal(_))) {
        Some(path.to_path_buf())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token() {
        assert!(matches!(
            ModelDownloader::new(""),
            Err(DownloadError::MissingToken)
        ));
        assert!(matches!(
            ModelDownloader::new("   "),
            Err(DownloadError::MissingToken)
        ));
    }

    #[test]
    fn test_urls() {
        let downloader = ModelDownloader::new("hf_test").unwrap();
        assert_eq!(
            downloader.model_info_url("Xenova/all-MiniLM-L6-v2"),
            "https://huggingface.co/api/models/Xenova/all-MiniLM-L6-v2"
        );
        assert_eq!(
            downloader.file_url("Xenova/all-MiniLM-L6-v2", "onnx/model.onnx"),
            "https://huggingface.co/Xenova/all-MiniLM-L6-v2/resolve/main/onnx/model.onnx"
        );
    }

    #[test]
    fn test_with_base_url() {
        let downloader = ModelDownloader::new("hf_test")
            .unwrap()
            .with_base_url("http://localhost:8080/");
        assert_eq!(
            downloader.model_info_url("org/model"),
            "http://localhost:8080/api/models/org/model"
        );
    }

    #[test]
    fn test_model_info_deserialization() {
        let json = r#"{
            "id": "Xenova/all-MiniLM-L6-v2",
            "siblings": [
                {"rfilename": "config.json"},
                {"rfilename": "onnx/model.onnx"},
                {"rfilename": "tokenizer.json"}
            ]
        }"#;
        let info: ModelInfo = serde_json::from_str(json).unwrap();
        let files: Vec<&str> = info.siblings.iter().map(|s| s.rfilename.as_str()).collect();
        assert_eq!(files, vec!["config.json", "onnx/model.onnx", "tokenizer.json"]);
    }

    #[test]
    fn test_model_info_without_siblings() {
        let info: ModelInfo = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(info.siblings.is_empty());
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path("onnx/model.onnx"),
            Some(PathBuf::from("onnx/model.onnx"))
        );
        assert_eq!(relative_path("tokenizer.json"), Some(PathBuf::from("tokenizer.json")));
        assert_eq!(relative_path("../escape.txt"), None);
        assert_eq!(relative_path("/etc/passwd"), None);
        assert_eq!(relative_path("a/../../b"), None);
        assert_eq!(relative_path(""), None);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let downloader = ModelDownloader::new("hf_test")
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let result = downloader.list_files("org/model").await;
        assert!(matches!(result, Err(DownloadError::RequestError(_))));
    }
}
