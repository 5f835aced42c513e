//! Plumbing for multi-label text-classification experiments, powered by [Candle](https://github.com/huggingface/candle).
//!
//! - [`labeling`]: turn classifier scores into one-hot label columns with a
//!   strict threshold and an `other` fallback, for trained and zero-shot
//!   classifiers.
//! - [`compare`]: check predicted columns against ground truth (exact match,
//!   correct plus extra, added one, missed one).
//! - [`metrics`]: exact-match accuracy and micro F1 from raw logits.
//! - [`dataset`]: CSV tables, positional train/test split, label vectors and
//!   fixed-length tokenization.
//!
//! Model inference sits behind the [`labeling::TextClassifier`],
//! [`labeling::ZeroShotClassifier`] and [`dataset::tokenize::TextTokenizer`]
//! traits. ModernBERT backends are provided in [`ModernBertClassifier`] and
//! [`ModernBertZeroShot`].

#![deny(missing_docs)]

// ============ Internal API ============

pub(crate) mod loaders;
pub(crate) mod models;
pub(crate) mod pipelines;

// ============ Public API ============

pub mod compare;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;

pub use config::{ClassifierKind, EvalConfig};
pub use models::{ModernBertClassifier, ModernBertZeroShot};
pub use pipelines::labeling;
pub use pipelines::utils::DeviceRequest;
