use crate::error::Result;

/// A label with confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Label name as the model knows it.
    pub label: String,
    /// Confidence score (0.0 to 1.0).
    pub score: f32,
}

impl Prediction {
    /// Convenience constructor.
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Per-text output of a zero-shot classifier.
///
/// `labels` and `scores` are parallel and usually sorted by descending score.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroShotOutput {
    /// The input text.
    pub sequence: String,
    /// Candidate labels as echoed by the model.
    pub labels: Vec<String>,
    /// Score for each entry in `labels`.
    pub scores: Vec<f32>,
}

/// Options forwarded to a [`ZeroShotClassifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroShotOptions {
    /// Score each label independently instead of normalising across labels.
    pub multi_label: bool,
    /// Truncate inputs longer than the model's maximum length.
    pub truncation: bool,
}

impl Default for ZeroShotOptions {
    fn default() -> Self {
        Self {
            multi_label: true,
            truncation: true,
        }
    }
}

/// A trained classifier with a fixed label vocabulary.
pub trait TextClassifier {
    /// Label names ordered by class id.
    fn id2label(&self) -> Vec<String>;

    /// Score every text. Returns one prediction list per input text, in input order.
    fn classify(&self, texts: &[&str]) -> Result<Vec<Vec<Prediction>>>;
}

/// A classifier that accepts candidate labels at inference time.
pub trait ZeroShotClassifier {
    /// Score every text against `candidate_labels`. One output per input text, in input order.
    fn classify(
        &self,
        texts: &[&str],
        candidate_labels: &[&str],
        options: ZeroShotOptions,
    ) -> Result<Vec<ZeroShotOutput>>;
}

impl<T: TextClassifier + ?Sized> TextClassifier for &T {
    fn id2label(&self) -> Vec<String> {
        (**self).id2label()
    }

    fn classify(&self, texts: &[&str]) -> Result<Vec<Vec<Prediction>>> {
        (**self).classify(texts)
    }
}

impl<T: ZeroShotClassifier + ?Sized> ZeroShotClassifier for &T {
    fn classify(
        &self,
        texts: &[&str],
        candidate_labels: &[&str],
        options: ZeroShotOptions,
    ) -> Result<Vec<ZeroShotOutput>> {
        (**self).classify(texts, candidate_labels, options)
    }
}
