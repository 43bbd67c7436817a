//! Local sentence-transformer inference through ONNX Runtime.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::{Array2, Ix2, Ix3};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tokenizers::{PaddingParams, PaddingStrategy, TruncationParams, TruncationStrategy};
use tracing::{debug, info};

use super::EmbeddingProvider;
use super::pooling::{l2_normalize, mean_pool};
use crate::error::{EmbeddingError, ModelError};
use crate::models::{Embedding, EmbeddingConfig};

/// ONNX exports of BERT-style encoders sometimes require segment ids.
const TOKEN_TYPE_IDS: &str = "token_type_ids";

pub struct OnnxProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_id: String,
    normalize: bool,
    needs_token_type_ids: bool,
}

impl OnnxProvider {
    /// Load `model.onnx` (or `onnx/model.onnx`) and `tokenizer.json` from `model_dir`.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, ModelError> {
        let model_path = ["model.onnx", "onnx/model.onnx"]
            .iter()
            .map(|name| model_dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| {
                ModelError::NotFound(format!(
                    "no model.onnx under {} (run `pagesim model download`)",
                    model_dir.display()
                ))
            })?;
        let tokenizer_path = model_dir.join("tokenizer.json");
        let max_tokens = config.max_tokens as usize;

        let session = Session::builder()
            .map_err(|e: ort::Error| ModelError::LoadError(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e: ort::Error| ModelError::LoadError(e.to_string()))?
            .with_intra_threads(num_cpus())
            .map_err(|e: ort::Error| ModelError::LoadError(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e: ort::Error| ModelError::LoadError(e.to_string()))?;

        let needs_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == TOKEN_TYPE_IDS);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| ModelError::TokenizerError(e.to_string()))?;

        // Configure truncation to prevent OOM with long texts
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                strategy: TruncationStrategy::LongestFirst,
                ..Default::default()
            }))
            .map_err(|e| ModelError::TokenizerError(e.to_string()))?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        info!(
            model = %config.model_id,
            path = %model_path.display(),
            "embedding model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            model_id: config.model_id.clone(),
            normalize: config.normalize,
            needs_token_type_ids,
        })
    }

    /// Run the encoder on a batch and mean-pool the token states.
    pub fn embed_sync(&self, texts: &[String]) -> Result<Vec<Embedding>, ModelError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ModelError::TokenizerError(e.to_string()))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        let batch_size = encodings.len();

        let mut batch = PaddedBatch::new(batch_size, max_len);
        for (i, encoding) in encodings.iter().enumerate() {
            batch.write_row(
                i,
                encoding.get_ids(),
                encoding.get_attention_mask(),
                encoding.get_type_ids(),
            );
        }
        let PaddedBatch {
            input_ids,
            attention_mask,
            token_type_ids,
            ..
        } = batch;

        let mask = Array2::from_shape_vec((batch_size, max_len), attention_mask.clone())
            .map_err(|e| ModelError::InferenceError(e.to_string()))?;

        let input_ids_tensor = Tensor::from_array(([batch_size, max_len], input_ids))
            .map_err(|e: ort::Error| ModelError::InferenceError(e.to_string()))?;
        let attention_mask_tensor = Tensor::from_array(([batch_size, max_len], attention_mask))
            .map_err(|e: ort::Error| ModelError::InferenceError(e.to_string()))?;

        let mut inputs = ort::inputs![
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
        ];
        if self.needs_token_type_ids {
            let token_type_tensor = Tensor::from_array(([batch_size, max_len], token_type_ids))
                .map_err(|e: ort::Error| ModelError::InferenceError(e.to_string()))?;
            inputs.push((TOKEN_TYPE_IDS.into(), token_type_tensor.into()));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::InferenceError("session lock poisoned".to_string()))?;

        let outputs = session
            .run(inputs)
            .map_err(|e: ort::Error| ModelError::InferenceError(e.to_string()))?;

        let output_array = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e: ort::Error| ModelError::InferenceError(e.to_string()))?;

        // [batch, seq, dim] token states are pooled; [batch, dim] is already a sentence vector
        let pooled = match output_array.ndim() {
            3 => {
                let hidden = output_array
                    .into_dimensionality::<Ix3>()
                    .map_err(|e| ModelError::InferenceError(e.to_string()))?;
                mean_pool(hidden, mask.view())
            }
            2 => output_array
                .into_dimensionality::<Ix2>()
                .map_err(|e| ModelError::InferenceError(e.to_string()))?
                .to_owned(),
            _ => {
                return Err(ModelError::InferenceError(format!(
                    "unexpected output shape: {:?}",
                    output_array.shape()
                )));
            }
        };

        debug!(batch = batch_size, seq_len = max_len, "onnx batch embedded");

        Ok(pooled
            .rows()
            .into_iter()
            .map(|row| {
                let embedding = row.to_vec();
                if self.normalize {
                    l2_normalize(&embedding)
                } else {
                    embedding
                }
            })
            .collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OnnxProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(self.embed_sync(texts)?)
    }

    fn name(&self) -> &str {
        &self.model_id
    }
}

/// Row-major `[batch, max_len]` model inputs, zero-padded.
struct PaddedBatch {
    max_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
}

impl PaddedBatch {
    fn new(batch_size: usize, max_len: usize) -> Self {
        Self {
            max_len,
            input_ids: vec![0; batch_size * max_len],
            attention_mask: vec![0; batch_size * max_len],
            token_type_ids: vec![0; batch_size * max_len],
        }
    }

    /// Missing type ids are written as segment 0.
    fn write_row(&mut self, row: usize, ids: &[u32], mask: &[u32], types: &[u32]) {
        let offset = row * self.max_len;
        for (j, (&id, &m)) in ids.iter().zip(mask.iter()).enumerate() {
            self.input_ids[offset + j] = id as i64;
            self.attention_mask[offset + j] = m as i64;
            self.token_type_ids[offset + j] = types.get(j).copied().unwrap_or(0) as i64;
        }
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let result = OnnxProvider::load(&EmbeddingConfig::default(), dir.path());
        match result {
            Err(ModelError::NotFound(msg)) => assert!(msg.contains("model.onnx")),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected missing model error"),
        }
    }

    #[test]
    fn test_padded_batch_rows() {
        let mut batch = PaddedBatch::new(2, 4);
        batch.write_row(0, &[101, 7, 102], &[1, 1, 1], &[0, 1, 1]);
        batch.write_row(1, &[101, 102], &[1, 1], &[]);

        assert_eq!(batch.input_ids, vec![101, 7, 102, 0, 101, 102, 0, 0]);
        assert_eq!(batch.attention_mask, vec![1, 1, 1, 0, 1, 1, 0, 0]);
        assert_eq!(batch.token_type_ids, vec![0, 1, 1, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_num_cpus_positive() {
        assert!(num_cpus() >= 1);
    }
}
