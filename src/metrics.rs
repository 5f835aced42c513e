//! Evaluation metrics for multi-label classifiers.
//!
//! Logits are squashed with a sigmoid and thresholded at 0.5. Accuracy is
//! exact-match (a row counts only when every label is right). F1 is
//! micro-averaged: true/false positives and negatives are pooled over every
//! example and label before precision and recall are computed.

use crate::error::{PipelineError, Result};
use candle_core::{DType, Tensor};
use serde::Serialize;

/// Probability above which a label counts as predicted.
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Pooled confusion counts over every (example, label) cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionCounts {
    /// Predicted 1, actual 1.
    pub true_positives: usize,
    /// Predicted 1, actual 0.
    pub false_positives: usize,
    /// Predicted 0, actual 1.
    pub false_negatives: usize,
    /// Predicted 0, actual 0.
    pub true_negatives: usize,
}

impl ConfusionCounts {
    fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.true_positives += 1,
            (true, false) => self.false_positives += 1,
            (false, true) => self.false_negatives += 1,
            (false, false) => self.true_negatives += 1,
        }
    }

    /// Number of cells counted.
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }
}

/// Metrics reported after an evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalMetrics {
    /// Fraction of examples whose whole label row was predicted exactly.
    pub accuracy: f64,
    /// Micro-averaged F1.
    pub f1: f64,
    /// Micro-averaged precision.
    pub precision: f64,
    /// Micro-averaged recall.
    pub recall: f64,
    /// Fraction of individual (example, label) cells predicted correctly.
    pub label_accuracy: f64,
    /// Pooled counts behind the scores.
    pub counts: ConfusionCounts,
}

impl EvalMetrics {
    /// Compute metrics from already-binarised rows (non-zero means positive).
    ///
    /// # Errors
    ///
    /// [`PipelineError::ShapeMismatch`] if the row counts or any row lengths differ.
    pub fn from_predictions(predictions: &[Vec<u8>], labels: &[Vec<u8>]) -> Result<Self> {
        let predictions: Vec<Vec<bool>> = predictions
            .iter()
            .map(|row| row.iter().map(|&v| v != 0).collect())
            .collect();
        let labels: Vec<Vec<bool>> = labels
            .iter()
            .map(|row| row.iter().map(|&v| v != 0).collect())
            .collect();
        Self::from_binary(&predictions, &labels)
    }

    fn from_binary(predictions: &[Vec<bool>], labels: &[Vec<bool>]) -> Result<Self> {
        if predictions.len() != labels.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "{} prediction rows vs {} label rows",
                predictions.len(),
                labels.len()
            )));
        }

        let mut counts = ConfusionCounts::default();
        let mut exact_rows = 0usize;

        for (i, (predicted, actual)) in predictions.iter().zip(labels).enumerate() {
            if predicted.len() != actual.len() {
                return Err(PipelineError::ShapeMismatch(format!(
                    "Row {i}: {} predictions vs {} labels",
                    predicted.len(),
                    actual.len()
                )));
            }
            if predicted == actual {
                exact_rows += 1;
            }
            for (&p, &a) in predicted.iter().zip(actual) {
                counts.record(p, a);
            }
        }

        let tp = counts.true_positives as f64;
        let fp = counts.false_positives as f64;
        let fn_ = counts.false_negatives as f64;

        Ok(Self {
            accuracy: ratio(exact_rows as f64, predictions.len() as f64),
            f1: ratio(2.0 * tp, 2.0 * tp + fp + fn_),
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
            label_accuracy: ratio(
                (counts.true_positives + counts.true_negatives) as f64,
                counts.total() as f64,
            ),
            counts,
        })
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Compute metrics from raw logits and 0/1 labels, both `[examples, labels]`.
///
/// # Errors
///
/// [`PipelineError::ShapeMismatch`] if either tensor is not rank 2 or their
/// shapes differ.
pub fn compute_metrics(logits: &Tensor, labels: &Tensor) -> Result<EvalMetrics> {
    if logits.rank() != 2 || logits.dims() != labels.dims() {
        return Err(PipelineError::ShapeMismatch(format!(
            "Expected matching [examples, labels] tensors, got logits {:?} and labels {:?}",
            logits.dims(),
            labels.dims()
        )));
    }

    let probabilities = candle_nn::ops::sigmoid(&logits.to_dtype(DType::F32)?)?;
    let predictions = binarize(&probabilities)?;
    let labels = binarize(&labels.to_dtype(DType::F32)?)?;

    EvalMetrics::from_binary(&predictions, &labels)
}

fn binarize(values: &Tensor) -> Result<Vec<Vec<bool>>> {
    Ok(values
        .to_vec2::<f32>()?
        .into_iter()
        .map(|row| row.into_iter().map(|v| v > DECISION_THRESHOLD).collect())
        .collect())
}
