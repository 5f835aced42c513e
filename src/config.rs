//! Run configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "threshold": 0.6, "classifier_repo": "my-org/modernbert-feedback" }
//! ```

use crate::dataset::DEFAULT_TRAIN_ROWS;
use crate::error::{PipelineError, Result};
use crate::pipelines::labeling::{
    ThresholdLabeler, ThresholdLabelerBuilder, OTHER_LABEL, TRAINED_SUFFIX, ZERO_SHOT_SUFFIX,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default zero-shot NLI model.
pub const DEFAULT_ZERO_SHOT_REPO: &str = "MoritzLaurer/ModernBERT-base-zeroshot-v2.0";

/// Which kind of classifier a labeler is for. Picks the column suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    /// Trained classifier, columns suffixed with `trained_suffix`.
    Trained,
    /// Zero-shot classifier, columns suffixed with `zero_shot_suffix`.
    ZeroShot,
}

/// Settings for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Score cut-off; a label is positive only above it.
    pub threshold: f32,
    /// Column suffix for trained-classifier predictions.
    pub trained_suffix: String,
    /// Column suffix for zero-shot predictions.
    pub zero_shot_suffix: String,
    /// Fallback label for texts with no positive label.
    pub other_label: String,
    /// Rows in the training split.
    pub n_train: usize,
    /// Name of the text column.
    pub text_column: String,
    /// Token length every text is padded or truncated to.
    pub max_length: usize,
    /// Texts per tokenizer / classifier call.
    pub map_batch_size: usize,
    /// Hub repo of the fine-tuned classifier, if any.
    pub classifier_repo: Option<String>,
    /// Hub repo of the zero-shot NLI model.
    pub zero_shot_repo: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            trained_suffix: TRAINED_SUFFIX.to_string(),
            zero_shot_suffix: ZERO_SHOT_SUFFIX.to_string(),
            other_label: OTHER_LABEL.to_string(),
            n_train: DEFAULT_TRAIN_ROWS,
            text_column: "response".to_string(),
            max_length: 512,
            map_batch_size: 1000,
            classifier_repo: None,
            zero_shot_repo: DEFAULT_ZERO_SHOT_REPO.to_string(),
        }
    }
}

impl EvalConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::InvalidParams(format!(
                "Failed to read config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Check ranges and non-zero sizes.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(PipelineError::InvalidParams(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.max_length == 0 {
            return Err(PipelineError::InvalidParams("max_length must be > 0".into()));
        }
        if self.map_batch_size == 0 {
            return Err(PipelineError::InvalidParams(
                "map_batch_size must be > 0".into(),
            ));
        }
        if self.text_column.is_empty() {
            return Err(PipelineError::InvalidParams(
                "text_column must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// A labeler using this config's threshold, fallback label and the suffix for `kind`.
    pub fn labeler(&self, kind: ClassifierKind) -> Result<ThresholdLabeler> {
        let suffix = match kind {
            ClassifierKind::Trained => &self.trained_suffix,
            ClassifierKind::ZeroShot => &self.zero_shot_suffix,
        };
        ThresholdLabelerBuilder::trained()
            .threshold(self.threshold)
            .suffix(suffix.as_str())
            .other_label(self.other_label.as_str())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EvalConfig::from_json_str(r#"{ "threshold": 0.7, "n_train": 10 }"#).unwrap();
        assert_eq!(config.threshold, 0.7);
        assert_eq!(config.n_train, 10);
        assert_eq!(config.trained_suffix, "_bert");
        assert_eq!(config.zero_shot_repo, DEFAULT_ZERO_SHOT_REPO);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(EvalConfig::from_json_str(r#"{ "threshold": 2.0 }"#).is_err());
        assert!(EvalConfig::from_json_str(r#"{ "max_length": 0 }"#).is_err());
        assert!(EvalConfig::from_json_str(r#"{ "threshold": "high" }"#).is_err());
    }

    #[test]
    fn labeler_uses_kind_suffix() {
        let config = EvalConfig {
            other_label: "none".into(),
            ..EvalConfig::default()
        };
        let labeler = config.labeler(ClassifierKind::ZeroShot).unwrap();
        assert_eq!(labeler.suffix(), "_llm");
        assert_eq!(labeler.other_label(), "none");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "text_column": "comment" }}"#).unwrap();
        let config = EvalConfig::from_path(file.path()).unwrap();
        assert_eq!(config.text_column, "comment");
    }
}
