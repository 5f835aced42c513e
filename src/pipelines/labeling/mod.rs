//! Thresholded multi-label assignment.
//!
//! Turns a classifier's per-text scores into fixed-width one-hot label
//! columns. A label is positive when its score is strictly above the
//! threshold. A text with no positive label gets the synthetic `other`
//! column instead, so every row has at least one 1.
//!
//! Two kinds of classifier are supported:
//!
//! - [`TextClassifier`]: a trained model with a fixed `id2label` vocabulary.
//! - [`ZeroShotClassifier`]: candidate labels supplied per call. Labels are
//!   lowercased and spaces become underscores before matching.
//!
//! # Quick Start
//!
//! ```rust
//! use label_pipelines::error::Result;
//! use label_pipelines::labeling::{classify_batch, Batch, Prediction, TextClassifier};
//!
//! struct Keyword;
//!
//! impl TextClassifier for Keyword {
//!     fn id2label(&self) -> Vec<String> {
//!         vec!["pay".into(), "culture".into()]
//!     }
//!
//!     fn classify(&self, texts: &[&str]) -> Result<Vec<Vec<Prediction>>> {
//!         Ok(texts
//!             .iter()
//!             .map(|t| {
//!                 let pay = if t.contains("salary") { 0.9 } else { 0.1 };
//!                 vec![Prediction::new("pay", pay), Prediction::new("culture", 0.2)]
//!             })
//!             .collect())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let batch = Batch::new(["Better salary please", "No comment"]);
//! let labels = classify_batch(&batch, &Keyword, 0.5, "_bert")?;
//!
//! assert_eq!(labels.get("pay_bert"), Some(&[1, 0][..]));
//! assert_eq!(labels.get("other_bert"), Some(&[0, 1][..]));
//! # Ok(())
//! # }
//! ```

// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod model;
pub(crate) mod pipeline;

// ============ Public API ============

pub use crate::pipelines::stats::PipelineStats;
pub use builder::{ThresholdLabelerBuilder, OTHER_LABEL, TRAINED_SUFFIX, ZERO_SHOT_SUFFIX};
pub use model::{Prediction, TextClassifier, ZeroShotClassifier, ZeroShotOptions, ZeroShotOutput};
pub use pipeline::{
    classify_batch, classify_batch_zero_shot, Batch, BatchLabels, ThresholdLabeler,
};
