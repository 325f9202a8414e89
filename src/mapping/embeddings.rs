// Sentence-embedding similarity using all-MiniLM-L6-v2.
//
// The n-gram matcher only sees characters: "supplier hold-up" and
// "opportunism" share none. This backend embeds the term and every concept
// name into 384-dimensional vectors and compares them by cosine similarity,
// so paraphrases land near the concept they describe.
//
// The model runs locally via ONNX. Mean pooling is applied to token
// embeddings (matching the model's training). Concept-name embeddings are
// computed once and cached for the lifetime of the matcher.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::semantic::SemanticMatcher;

/// Embedding dimension for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Sentence embedder using a local ONNX model.
pub struct SentenceEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl SentenceEmbedder {
    /// Load the model and tokenizer from the given directory.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in the directory.
    /// Run `casewriter download-model` first if they don't exist.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            anyhow::bail!(
                "Embedding model not found: {}\nRun `casewriter download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Embedding tokenizer not found: {}\nRun `casewriter download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| {
                format!("Failed to load embedding model from {}", model_path.display())
            })?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load embedding tokenizer: {}", e))?;

        debug!("Loaded sentence embedding model from {}", model_dir.display());

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Embed a batch of texts: tokenize, run the model, mean-pool over the
    /// attention mask.
    pub fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings: Vec<_> = texts
            .iter()
            .map(|t| {
                self.tokenizer
                    .encode(t.as_str(), true)
                    .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        if max_len == 0 {
            return Ok(vec![vec![0.0; EMBEDDING_DIM]; batch_size]);
        }

        // BERT inputs, padded with 0 to the longest sequence
        let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
        let mut token_type_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

        for enc in &encodings {
            let ids = enc.get_ids();
            let mask = enc.get_attention_mask();
            let pad_len = max_len - ids.len();

            input_ids_flat.extend(ids.iter().map(|&id| id as i64));
            attention_mask_flat.extend(mask.iter().map(|&m| m as i64));
            token_type_ids_flat.extend(std::iter::repeat_n(0i64, ids.len()));

            input_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
            attention_mask_flat.extend(std::iter::repeat_n(0i64, pad_len));
            token_type_ids_flat.extend(std::iter::repeat_n(0i64, pad_len));
        }

        let shape = [batch_size as i64, max_len as i64];

        let input_ids_tensor = Tensor::from_array((shape, input_ids_flat))
            .context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat.clone()))
            .context("Failed to create attention_mask tensor")?;
        let token_type_ids_tensor = Tensor::from_array((shape, token_type_ids_flat))
            .context("Failed to create token_type_ids tensor")?;

        // last_hidden_state: [batch, seq_len, 384]
        let hidden_states = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor,
                    "token_type_ids" => token_type_ids_tensor
                })
                .context("Embedding ONNX inference failed")?;

            let (_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract embedding output tensor")?;

            data.to_vec()
        };

        let mut embeddings = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let mut sum = vec![0.0_f64; EMBEDDING_DIM];
            let mut mask_sum = 0.0_f64;

            for j in 0..max_len {
                let mask_val = attention_mask_flat[i * max_len + j] as f64;
                if mask_val > 0.0 {
                    mask_sum += mask_val;
                    let offset = (i * max_len + j) * EMBEDDING_DIM;
                    for (k, slot) in sum.iter_mut().enumerate() {
                        *slot += hidden_states[offset + k] as f64 * mask_val;
                    }
                }
            }

            if mask_sum > 0.0 {
                for val in &mut sum {
                    *val /= mask_sum;
                }
            }
            embeddings.push(sum);
        }

        debug!(batch_size, dim = EMBEDDING_DIM, "Computed sentence embeddings");

        Ok(embeddings)
    }
}

/// Semantic matcher backed by the sentence embedder.
pub struct EmbeddingMatcher {
    embedder: SentenceEmbedder,
    cache: Mutex<HashMap<String, Vec<f64>>>,
}

impl EmbeddingMatcher {
    pub fn new(embedder: SentenceEmbedder) -> Self {
        Self {
            embedder,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn load(model_dir: &Path) -> Result<Self> {
        Ok(Self::new(SentenceEmbedder::load(model_dir)?))
    }
}

impl SemanticMatcher for EmbeddingMatcher {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn similarities(&self, term: &str, choices: &[&str]) -> Result<Vec<f64>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|e| anyhow::anyhow!("Embedding cache lock poisoned: {}", e))?;

        let missing: Vec<String> = choices
            .iter()
            .filter(|c| !cache.contains_key(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            let vectors = self.embedder.embed(&missing)?;
            for (choice, vector) in missing.into_iter().zip(vectors) {
                cache.insert(choice, vector);
            }
        }

        let term_vec = self
            .embedder
            .embed(&[term.to_string()])?
            .into_iter()
            .next()
            .unwrap_or_else(|| vec![0.0; EMBEDDING_DIM]);

        Ok(choices
            .iter()
            .map(|c| {
                cache
                    .get(*c)
                    .map(|v| cosine_similarity_embeddings(&term_vec, v))
                    .unwrap_or(0.0)
            })
            .collect())
    }
}

/// Cosine similarity between two embedding vectors, clamped to 0.0–1.0.
pub fn cosine_similarity_embeddings(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    let denom = mag_a * mag_b;
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_model_fails_with_hint() {
        let dir = std::env::temp_dir().join("casewriter-embed-missing");
        let err = SentenceEmbedder::load(&dir).err().unwrap().to_string();
        assert!(err.contains("download-model"), "got: {err}");
    }

    #[test]
    fn test_cosine_identical() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity_embeddings(&a, &a) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_orthogonal() {
        let sim = cosine_similarity_embeddings(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(sim.abs() < 1e-10);
    }

    #[test]
    fn test_cosine_mismatched_dimensions() {
        let sim = cosine_similarity_embeddings(&[1.0, 2.0], &[1.0, 2.0, 3.0]);
        assert!(sim.abs() < f64::EPSILON, "Mismatched dims should return 0.0");
    }

    #[test]
    fn test_cosine_opposite_clamps_to_zero() {
        let sim = cosine_similarity_embeddings(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!(sim.abs() < f64::EPSILON, "got {sim}");
    }
}
