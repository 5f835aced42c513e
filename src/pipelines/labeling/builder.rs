use super::pipeline::ThresholdLabeler;
use crate::error::{PipelineError, Result};

/// Suffix used for columns produced from a trained classifier.
pub const TRAINED_SUFFIX: &str = "_bert";
/// Suffix used for columns produced from a zero-shot classifier.
pub const ZERO_SHOT_SUFFIX: &str = "_llm";
/// Fallback label for texts with no label above the threshold.
pub const OTHER_LABEL: &str = "other";

/// Builder for creating [`ThresholdLabeler`] instances.
///
/// # Examples
///
/// ```rust
/// # use label_pipelines::labeling::ThresholdLabelerBuilder;
/// # fn main() -> label_pipelines::error::Result<()> {
/// let labeler = ThresholdLabelerBuilder::zero_shot()
///     .threshold(0.7)
///     .build()?;
/// assert_eq!(labeler.suffix(), "_llm");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ThresholdLabelerBuilder {
    threshold: f32,
    suffix: String,
    other_label: String,
}

impl Default for ThresholdLabelerBuilder {
    fn default() -> Self {
        Self::trained()
    }
}

impl ThresholdLabelerBuilder {
    /// Defaults for a trained classifier: threshold 0.5, suffix `_bert`.
    pub fn trained() -> Self {
        Self {
            threshold: 0.5,
            suffix: TRAINED_SUFFIX.to_string(),
            other_label: OTHER_LABEL.to_string(),
        }
    }

    /// Defaults for a zero-shot classifier: threshold 0.5, suffix `_llm`.
    pub fn zero_shot() -> Self {
        Self {
            suffix: ZERO_SHOT_SUFFIX.to_string(),
            ..Self::trained()
        }
    }

    /// Set the score cut-off. Must be within `[0, 1]`.
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the column suffix.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Set the fallback label (default: `other`).
    pub fn other_label(mut self, label: impl Into<String>) -> Self {
        self.other_label = label.into();
        self
    }

    /// Builds the labeler.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParams`] if the threshold is outside
    /// `[0, 1]` or the fallback label is empty.
    pub fn build(self) -> Result<ThresholdLabeler> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(PipelineError::InvalidParams(format!(
                "Threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if self.other_label.is_empty() {
            return Err(PipelineError::InvalidParams(
                "Fallback label must not be empty".into(),
            ));
        }

        Ok(ThresholdLabeler {
            threshold: self.threshold,
            suffix: self.suffix,
            other_label: self.other_label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_thresholds() {
        for bad in [-0.1, 1.5, f32::NAN, f32::INFINITY] {
            let err = ThresholdLabelerBuilder::trained()
                .threshold(bad)
                .build()
                .unwrap_err();
            assert!(matches!(err, PipelineError::InvalidParams(_)));
        }
    }

    #[test]
    fn accepts_range_endpoints() {
        assert!(ThresholdLabelerBuilder::trained().threshold(0.0).build().is_ok());
        assert!(ThresholdLabelerBuilder::trained().threshold(1.0).build().is_ok());
    }

    #[test]
    fn presets_pick_suffixes() {
        let trained = ThresholdLabelerBuilder::trained().build().unwrap();
        let zero_shot = ThresholdLabelerBuilder::zero_shot().build().unwrap();
        assert_eq!(trained.suffix(), "_bert");
        assert_eq!(zero_shot.suffix(), "_llm");
        assert_eq!(zero_shot.other_label(), "other");
        assert_eq!(zero_shot.threshold(), 0.5);
    }
}
