//! Fixed-length tokenization of labelled examples.

use super::LabeledExample;
use crate::error::{PipelineError, Result};
use candle_core::{Device, Tensor};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// Token ids and attention mask for one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedText {
    /// Token ids, padded or truncated by the tokenizer.
    pub input_ids: Vec<u32>,
    /// 1 for real tokens, 0 for padding.
    pub attention_mask: Vec<u32>,
}

/// Anything that can turn a batch of texts into token ids.
pub trait TextTokenizer {
    /// Encode `texts`, one result per text, in input order.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<TokenizedText>>;
}

/// A [`Tokenizer`] configured to truncate and pad every text to `max_length`.
#[derive(Clone)]
pub struct PaddedTokenizer {
    inner: Tokenizer,
    max_length: usize,
}

impl PaddedTokenizer {
    /// Wrap `tokenizer`, enabling truncation and fixed-length padding.
    ///
    /// The pad token is taken from the tokenizer's existing padding config,
    /// or `<pad>` / `[PAD]` from its vocabulary, falling back to id 0.
    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(PipelineError::InvalidParams(
                "max_length must be greater than zero".into(),
            ));
        }

        let (pad_id, pad_token) = pad_token(&tokenizer);

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| {
                PipelineError::Tokenization(format!("Failed to enable truncation: {e}"))
            })?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            pad_id,
            pad_token,
            ..Default::default()
        }));

        Ok(Self {
            inner: tokenizer,
            max_length,
        })
    }

    /// Load `tokenizer.json` from disk and wrap it.
    pub fn from_file(path: impl AsRef<std::path::Path>, max_length: usize) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            PipelineError::Tokenization(format!(
                "Failed to load tokenizer from '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::new(tokenizer, max_length)
    }

    /// Length every encoding is padded or truncated to.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// The configured inner tokenizer.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.inner
    }
}

impl TextTokenizer for PaddedTokenizer {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<TokenizedText>> {
        let encodings = self.inner.encode_batch(texts.to_vec(), true).map_err(|e| {
            PipelineError::Tokenization(format!("Batch tokenization failed: {e}"))
        })?;

        Ok(encodings
            .into_iter()
            .map(|encoding| TokenizedText {
                input_ids: encoding.get_ids().to_vec(),
                attention_mask: encoding.get_attention_mask().to_vec(),
            })
            .collect())
    }
}

pub(crate) fn pad_token(tokenizer: &Tokenizer) -> (u32, String) {
    if let Some(padding) = tokenizer.get_padding() {
        return (padding.pad_id, padding.pad_token.clone());
    }
    ["<pad>", "[PAD]"]
        .iter()
        .find_map(|token| {
            tokenizer
                .token_to_id(token)
                .map(|id| (id, token.to_string()))
        })
        .unwrap_or((0, "[PAD]".to_string()))
}

/// A labelled example with its tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedExample {
    /// Input text.
    pub text: String,
    /// Label vector.
    pub labels: Vec<f32>,
    /// Token ids.
    pub input_ids: Vec<u32>,
    /// Attention mask.
    pub attention_mask: Vec<u32>,
}

/// Labelled examples mapped through a tokenizer, in input order.
#[derive(Debug, Clone, Default)]
pub struct TokenizedDataset {
    rows: Vec<TokenizedExample>,
}

impl TokenizedDataset {
    /// Tokenize `examples` in chunks of `batch_size`.
    pub fn build<T>(examples: Vec<LabeledExample>, tokenizer: &T, batch_size: usize) -> Result<Self>
    where
        T: TextTokenizer + ?Sized,
    {
        if batch_size == 0 {
            return Err(PipelineError::InvalidParams(
                "Batch size must be greater than zero".into(),
            ));
        }

        let mut rows = Vec::with_capacity(examples.len());
        for chunk in examples.chunks(batch_size) {
            let texts: Vec<&str> = chunk.iter().map(|e| e.text.as_str()).collect();
            let encoded = tokenizer.encode_batch(&texts)?;
            if encoded.len() != chunk.len() {
                return Err(PipelineError::Tokenization(format!(
                    "Tokenizer returned {} encodings for {} texts",
                    encoded.len(),
                    chunk.len()
                )));
            }
            rows.extend(chunk.iter().zip(encoded).map(|(example, tokens)| {
                TokenizedExample {
                    text: example.text.clone(),
                    labels: example.labels.clone(),
                    input_ids: tokens.input_ids,
                    attention_mask: tokens.attention_mask,
                }
            }));
        }

        tracing::debug!(rows = rows.len(), batch_size, "Tokenized dataset");
        Ok(Self { rows })
    }

    /// All rows.
    pub fn rows(&self) -> &[TokenizedExample] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stack ids, attention masks and labels into `[rows, len]` tensors.
    ///
    /// # Errors
    ///
    /// [`PipelineError::ShapeMismatch`] if rows differ in token or label length.
    pub fn to_tensors(&self, device: &Device) -> Result<(Tensor, Tensor, Tensor)> {
        let rows = self.rows.len();
        let seq_len = self.rows.first().map(|r| r.input_ids.len()).unwrap_or(0);
        let num_labels = self.rows.first().map(|r| r.labels.len()).unwrap_or(0);

        let mut ids = Vec::with_capacity(rows * seq_len);
        let mut mask = Vec::with_capacity(rows * seq_len);
        let mut labels = Vec::with_capacity(rows * num_labels);

        for (i, row) in self.rows.iter().enumerate() {
            if row.input_ids.len() != seq_len || row.attention_mask.len() != seq_len {
                return Err(PipelineError::ShapeMismatch(format!(
                    "Row {i} has {} tokens, expected {seq_len}",
                    row.input_ids.len()
                )));
            }
            if row.labels.len() != num_labels {
                return Err(PipelineError::ShapeMismatch(format!(
                    "Row {i} has {} labels, expected {num_labels}",
                    row.labels.len()
                )));
            }
            ids.extend_from_slice(&row.input_ids);
            mask.extend_from_slice(&row.attention_mask);
            labels.extend_from_slice(&row.labels);
        }

        Ok((
            Tensor::from_vec(ids, (rows, seq_len), device)?,
            Tensor::from_vec(mask, (rows, seq_len), device)?,
            Tensor::from_vec(labels, (rows, num_labels), device)?,
        ))
    }
}
