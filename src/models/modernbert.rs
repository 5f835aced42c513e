use candle_core::{Device, IndexOp, Tensor, D};
use candle_nn::ops::{sigmoid, softmax};
use candle_transformers::models::modernbert::{
    ClassifierConfig, ClassifierPooling, Config,
    ModernBertForSequenceClassification as CandleModernBertForSequenceClassification,
};
use serde::Deserialize;
use std::collections::HashMap;
use tokenizers::{
    PaddingParams, PaddingStrategy, Tokenizer, TruncationParams, TruncationStrategy,
};

use crate::dataset::tokenize::pad_token;
use crate::error::{PipelineError, Result};
use crate::loaders::{load_tokenizer, parse_classifier_labels, ClassifierLabels, ModelFiles};
use crate::pipelines::labeling::{
    Prediction, TextClassifier, ZeroShotClassifier, ZeroShotOptions, ZeroShotOutput,
};
use crate::pipelines::utils::DeviceRequest;

/// Hypothesis each candidate label is slotted into for NLI scoring.
pub const HYPOTHESIS_TEMPLATE: &str = "This example is {}.";

#[derive(Deserialize)]
struct PoolingJson {
    #[serde(default)]
    classifier_pooling: Option<ClassifierPooling>,
}

/// Load a sequence classifier and its ordered label vocabulary from the Hub.
fn load_sequence_classifier(
    repo_id: &str,
    device: &Device,
) -> Result<(CandleModernBertForSequenceClassification, ClassifierLabels)> {
    let files = ModelFiles::fetch(repo_id)?;
    let config_str = files.read_config()?;

    let mut config: Config = serde_json::from_str(&config_str)?;
    let labels = parse_classifier_labels(&config_str)?;
    if labels.is_empty() {
        return Err(PipelineError::InvalidParams(format!(
            "'{repo_id}' config.json has no id2label or label2id"
        )));
    }
    let pooling: PoolingJson = serde_json::from_str(&config_str)?;

    let id2label: HashMap<String, String> = labels
        .id2label
        .iter()
        .enumerate()
        .map(|(id, label)| (id.to_string(), label.clone()))
        .collect();
    let label2id: HashMap<String, String> = id2label
        .iter()
        .map(|(id, label)| (label.clone(), id.clone()))
        .collect();
    config.classifier_config = Some(ClassifierConfig {
        id2label,
        label2id,
        classifier_pooling: pooling.classifier_pooling.unwrap_or_default(),
    });

    let vb = files.var_builder(device)?;
    let model = CandleModernBertForSequenceClassification::load(vb, &config)?;
    tracing::info!(repo = repo_id, labels = labels.len(), "Loaded ModernBERT classifier");

    Ok((model, labels))
}

/// Copy of `tokenizer` that pads to the longest item in a batch and,
/// if `max_length` is set, truncates.
fn batch_tokenizer(
    tokenizer: &Tokenizer,
    max_length: Option<usize>,
    strategy: TruncationStrategy,
) -> Result<Tokenizer> {
    let mut tokenizer = tokenizer.clone();
    let (pad_id, pad_token) = pad_token(&tokenizer);
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token,
        ..Default::default()
    }));
    let truncation = max_length.map(|max_length| TruncationParams {
        max_length,
        strategy,
        ..Default::default()
    });
    tokenizer
        .with_truncation(truncation)
        .map_err(|e| PipelineError::Tokenization(format!("Failed to set truncation: {e}")))?;
    Ok(tokenizer)
}

/// Stack equal-length encodings into `[batch, seq]` id and mask tensors.
fn to_input_tensors(
    encodings: &[tokenizers::Encoding],
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let seq_len = encodings.first().map(|e| e.len()).unwrap_or(0);
    let mut ids = Vec::with_capacity(encodings.len() * seq_len);
    let mut mask = Vec::with_capacity(encodings.len() * seq_len);
    for encoding in encodings {
        ids.extend_from_slice(encoding.get_ids());
        mask.extend_from_slice(encoding.get_attention_mask());
    }
    let input_ids = Tensor::from_vec(ids, (encodings.len(), seq_len), device)?;
    let attention_mask = Tensor::from_vec(mask, (encodings.len(), seq_len), device)?;
    Ok((input_ids, attention_mask))
}

fn tokenization_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Tokenization(format!("Batch tokenization failed: {e}"))
}

// ============ Trained multi-label classifier ============

/// A fine-tuned ModernBERT multi-label classifier.
///
/// Every label is scored independently with a sigmoid, so
/// [`TextClassifier::classify`] returns a score for every label in the
/// vocabulary, highest first.
pub struct ModernBertClassifier {
    model: CandleModernBertForSequenceClassification,
    tokenizer: Tokenizer,
    labels: ClassifierLabels,
    device: Device,
}

impl ModernBertClassifier {
    /// Load model, tokenizer and label vocabulary from a Hub repo.
    ///
    /// Inputs longer than `max_length` tokens are truncated.
    pub fn from_hub(repo_id: &str, device: &DeviceRequest, max_length: usize) -> Result<Self> {
        let device = device.resolve()?;
        let (model, labels) = load_sequence_classifier(repo_id, &device)?;
        let tokenizer = batch_tokenizer(
            &load_tokenizer(repo_id)?,
            Some(max_length),
            TruncationStrategy::LongestFirst,
        )?;

        Ok(Self {
            model,
            tokenizer,
            labels,
            device,
        })
    }

    /// Returns the device (CPU/GPU) the model is running on.
    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl TextClassifier for ModernBertClassifier {
    fn id2label(&self) -> Vec<String> {
        self.labels.id2label.clone()
    }

    fn classify(&self, texts: &[&str]) -> Result<Vec<Vec<Prediction>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(tokenization_error)?;
        let (input_ids, attention_mask) = to_input_tensors(&encodings, &self.device)?;

        let logits = self.model.forward(&input_ids, &attention_mask)?;
        let probabilities = sigmoid(&logits)?.to_vec2::<f32>()?;

        Ok(probabilities
            .into_iter()
            .map(|row| {
                let mut predictions: Vec<Prediction> = self
                    .labels
                    .id2label
                    .iter()
                    .zip(row)
                    .map(|(label, score)| Prediction::new(label.clone(), score))
                    .collect();
                predictions.sort_by(|a, b| {
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                predictions
            })
            .collect())
    }
}

// ============ Zero-shot NLI classifier ============

/// A ModernBERT NLI model used as a zero-shot classifier.
///
/// Each (text, candidate) pair is scored as the entailment probability of
/// `"This example is {candidate}."`. With `multi_label` every candidate is
/// scored on its own (entailment vs. contradiction); without it the
/// entailment logits are normalised across candidates.
pub struct ModernBertZeroShot {
    model: CandleModernBertForSequenceClassification,
    tokenizer: Tokenizer,
    truncating_tokenizer: Tokenizer,
    entailment_id: usize,
    contradiction_id: usize,
    device: Device,
}

impl ModernBertZeroShot {
    /// Load an NLI model from a Hub repo.
    ///
    /// # Errors
    ///
    /// [`PipelineError::InvalidParams`] if no label starts with "entail".
    pub fn from_hub(repo_id: &str, device: &DeviceRequest, max_length: usize) -> Result<Self> {
        let device = device.resolve()?;
        let (model, labels) = load_sequence_classifier(repo_id, &device)?;

        let entailment_id = labels.find_prefix("entail").ok_or_else(|| {
            PipelineError::InvalidParams(format!(
                "No entailment label in '{repo_id}'. Available: {}",
                labels.id2label.join(", ")
            ))
        })?;
        let contradiction_id = if entailment_id == 0 {
            labels.len() - 1
        } else {
            0
        };

        let base = load_tokenizer(repo_id)?;
        let tokenizer = batch_tokenizer(&base, None, TruncationStrategy::OnlyFirst)?;
        let truncating_tokenizer =
            batch_tokenizer(&base, Some(max_length), TruncationStrategy::OnlyFirst)?;

        Ok(Self {
            model,
            tokenizer,
            truncating_tokenizer,
            entailment_id,
            contradiction_id,
            device,
        })
    }

    /// Returns the device (CPU/GPU) the model is running on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    fn scores(
        &self,
        logits: &Tensor,
        num_texts: usize,
        num_labels: usize,
        multi_label: bool,
    ) -> Result<Vec<f32>> {
        if multi_label || num_labels == 1 {
            let columns = Tensor::new(
                &[self.contradiction_id as u32, self.entailment_id as u32],
                &self.device,
            )?;
            let pair_logits = logits.index_select(&columns, 1)?;
            Ok(softmax(&pair_logits, D::Minus1)?.i((.., 1))?.to_vec1::<f32>()?)
        } else {
            let entailment = logits
                .i((.., self.entailment_id))?
                .reshape((num_texts, num_labels))?;
            Ok(softmax(&entailment, D::Minus1)?.flatten_all()?.to_vec1::<f32>()?)
        }
    }
}

impl ZeroShotClassifier for ModernBertZeroShot {
    fn classify(
        &self,
        texts: &[&str],
        candidate_labels: &[&str],
        options: ZeroShotOptions,
    ) -> Result<Vec<ZeroShotOutput>> {
        if candidate_labels.is_empty() {
            return Err(PipelineError::InvalidParams(
                "At least one candidate label is required".into(),
            ));
        }
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let hypotheses: Vec<String> = candidate_labels
            .iter()
            .map(|label| HYPOTHESIS_TEMPLATE.replace("{}", label))
            .collect();
        let pairs: Vec<(&str, &str)> = texts
            .iter()
            .flat_map(|&text| hypotheses.iter().map(move |h| (text, h.as_str())))
            .collect();

        let tokenizer = if options.truncation {
            &self.truncating_tokenizer
        } else {
            &self.tokenizer
        };
        let encodings = tokenizer
            .encode_batch(pairs, true)
            .map_err(tokenization_error)?;
        let (input_ids, attention_mask) = to_input_tensors(&encodings, &self.device)?;

        let logits = self.model.forward(&input_ids, &attention_mask)?;
        let scores = self.scores(
            &logits,
            texts.len(),
            candidate_labels.len(),
            options.multi_label,
        )?;

        Ok(texts
            .iter()
            .zip(scores.chunks(candidate_labels.len()))
            .map(|(text, row)| {
                let mut ranked: Vec<(&str, f32)> =
                    candidate_labels.iter().copied().zip(row.iter().copied()).collect();
                ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                ZeroShotOutput {
                    sequence: text.to_string(),
                    labels: ranked.iter().map(|(l, _)| l.to_string()).collect(),
                    scores: ranked.iter().map(|(_, s)| *s).collect(),
                }
            })
            .collect())
    }
}
