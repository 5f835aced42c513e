use super::model::{TextClassifier, ZeroShotClassifier, ZeroShotOptions};
use crate::error::{PipelineError, Result};
use crate::pipelines::stats::{PipelineStats, PipelineStatsBuilder};
use crate::pipelines::utils::normalize_label;
use indexmap::IndexMap;

// ============ Input / output types ============

/// A batch of response texts to label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    /// Texts in row order.
    pub responses: Vec<String>,
}

impl Batch {
    /// Build a batch from any list of texts.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of texts.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// True when the batch holds no texts.
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Borrow the texts as `&str`.
    pub fn texts(&self) -> Vec<&str> {
        self.responses.iter().map(String::as_str).collect()
    }
}

/// One-hot label columns for a batch.
///
/// Columns are the suffixed vocabulary in order, followed by the suffixed
/// "other" column (unless the vocabulary already had one). Every column holds
/// one 0/1 value per input text, aligned with the batch order.
#[derive(Debug, Clone)]
pub struct BatchLabels {
    columns: IndexMap<String, Vec<u8>>,
    other_column: String,
    rows: usize,
    /// Execution statistics.
    pub stats: PipelineStats,
}

impl BatchLabels {
    /// All columns in output order.
    pub fn columns(&self) -> &IndexMap<String, Vec<u8>> {
        &self.columns
    }

    /// Values of a single column.
    pub fn get(&self, column: &str) -> Option<&[u8]> {
        self.columns.get(column).map(Vec::as_slice)
    }

    /// Column names in output order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Name of the fallback column, e.g. `other_bert`.
    pub fn other_column(&self) -> &str {
        &self.other_column
    }

    /// Number of labelled texts.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// True when no texts were labelled.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Names of the columns set to 1 for row `index`.
    pub fn positives(&self, index: usize) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, values)| values.get(index) == Some(&1))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Consume into the raw column map.
    pub fn into_columns(self) -> IndexMap<String, Vec<u8>> {
        self.columns
    }
}

// ============ Labeler ============

/// Turns classifier scores into one-hot label columns.
///
/// A label is positive only when its score is strictly greater than the
/// threshold. A text with no positive label gets the "other" column instead.
///
/// Construct with [`ThresholdLabelerBuilder`](super::ThresholdLabelerBuilder).
///
/// # Examples
///
/// ```rust
/// use label_pipelines::labeling::{Batch, Prediction, TextClassifier, ThresholdLabelerBuilder};
///
/// struct Fixed;
///
/// impl TextClassifier for Fixed {
///     fn id2label(&self) -> Vec<String> {
///         vec!["pay".into(), "culture".into()]
///     }
///
///     fn classify(&self, texts: &[&str]) -> label_pipelines::error::Result<Vec<Vec<Prediction>>> {
///         Ok(texts.iter().map(|_| vec![Prediction::new("pay", 0.9)]).collect())
///     }
/// }
///
/// # fn main() -> label_pipelines::error::Result<()> {
/// let labeler = ThresholdLabelerBuilder::trained().threshold(0.5).build()?;
/// let labels = labeler.label_batch(&Batch::new(["Raise wages"]), &Fixed)?;
/// assert_eq!(labels.get("pay_bert"), Some(&[1u8][..]));
/// assert_eq!(labels.get("other_bert"), Some(&[0u8][..]));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ThresholdLabeler {
    pub(crate) threshold: f32,
    pub(crate) suffix: String,
    pub(crate) other_label: String,
}

impl ThresholdLabeler {
    /// Score cut-off; scores equal to it are negative.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Suffix appended to every output column.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Unsuffixed name of the fallback label.
    pub fn other_label(&self) -> &str {
        &self.other_label
    }

    /// Label a batch with a trained classifier.
    ///
    /// The vocabulary comes from [`TextClassifier::id2label`]. The classifier
    /// is called once for the whole batch.
    pub fn label_batch<C>(&self, batch: &Batch, classifier: &C) -> Result<BatchLabels>
    where
        C: TextClassifier + ?Sized,
    {
        let stats = PipelineStats::start();
        let texts = batch.texts();
        let outputs = classifier.classify(&texts)?;
        check_output_count(texts.len(), outputs.len())?;

        let vocabulary = classifier.id2label();
        let scored = outputs
            .into_iter()
            .map(|predictions| {
                predictions
                    .into_iter()
                    .map(|p| (p.label, p.score))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        Ok(self.assign(&vocabulary, scored, stats))
    }

    /// Label a batch with a zero-shot classifier over `candidate_labels`.
    ///
    /// Both the candidates and the labels the model returns are normalised
    /// with [`normalize_label`] before suffixing.
    pub fn label_batch_zero_shot<C>(
        &self,
        batch: &Batch,
        classifier: &C,
        candidate_labels: &[&str],
    ) -> Result<BatchLabels>
    where
        C: ZeroShotClassifier + ?Sized,
    {
        let stats = PipelineStats::start();
        let texts = batch.texts();
        let outputs = classifier.classify(&texts, candidate_labels, ZeroShotOptions::default())?;
        check_output_count(texts.len(), outputs.len())?;

        let vocabulary: Vec<String> = candidate_labels.iter().map(|l| normalize_label(l)).collect();

        let mut scored = Vec::with_capacity(outputs.len());
        for output in outputs {
            if output.labels.len() != output.scores.len() {
                return Err(PipelineError::Unexpected(format!(
                    "Zero-shot output has {} labels but {} scores",
                    output.labels.len(),
                    output.scores.len()
                )));
            }
            scored.push(
                output
                    .labels
                    .iter()
                    .map(|l| normalize_label(l))
                    .zip(output.scores)
                    .collect::<Vec<_>>(),
            );
        }

        Ok(self.assign(&vocabulary, scored, stats))
    }

    fn assign(
        &self,
        vocabulary: &[String],
        scored: Vec<Vec<(String, f32)>>,
        stats: PipelineStatsBuilder,
    ) -> BatchLabels {
        let rows = scored.len();
        let mut columns: IndexMap<String, Vec<u8>> = vocabulary
            .iter()
            .map(|label| (format!("{label}{}", self.suffix), Vec::with_capacity(rows)))
            .collect();

        let other_column = format!("{}{}", self.other_label, self.suffix);
        let entry = columns.entry(other_column.clone());
        let other_index = entry.index();
        entry.or_insert_with(|| Vec::with_capacity(rows));

        let mut row = vec![0u8; columns.len()];
        let mut fallbacks = 0;

        for scores in scored {
            row.fill(0);
            for (label, score) in scores {
                let column = format!("{label}{}", self.suffix);
                match columns.get_index_of(&column) {
                    Some(index) => {
                        if score > self.threshold {
                            row[index] = 1;
                        }
                    }
                    None => {
                        tracing::warn!(label = %label, score, "Classifier returned a label outside the vocabulary, ignoring");
                    }
                }
            }

            if row.iter().all(|&v| v == 0) {
                row[other_index] = 1;
                fallbacks += 1;
            }

            for (values, &value) in columns.values_mut().zip(row.iter()) {
                values.push(value);
            }
        }

        let stats = stats.finish(rows, fallbacks);
        tracing::debug!(
            items = stats.items_processed,
            fallbacks = stats.fallbacks,
            elapsed_ms = stats.total_time.as_millis() as u64,
            suffix = %self.suffix,
            "Labelled batch"
        );

        BatchLabels {
            columns,
            other_column,
            rows,
            stats,
        }
    }
}

fn check_output_count(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(PipelineError::Unexpected(format!(
            "Classifier returned {actual} results for {expected} texts"
        )));
    }
    Ok(())
}

// ============ Free functions ============

/// Label a batch with a trained classifier.
///
/// Equivalent to building a [`ThresholdLabeler`] with `threshold` and `suffix`
/// (fallback label `other`) and calling [`ThresholdLabeler::label_batch`].
pub fn classify_batch<C>(
    batch: &Batch,
    classifier: &C,
    threshold: f32,
    suffix: &str,
) -> Result<BatchLabels>
where
    C: TextClassifier + ?Sized,
{
    super::ThresholdLabelerBuilder::trained()
        .threshold(threshold)
        .suffix(suffix)
        .build()?
        .label_batch(batch, classifier)
}

/// Label a batch with a zero-shot classifier over `labels`.
///
/// Equivalent to building a [`ThresholdLabeler`] with `threshold` and `suffix`
/// (fallback label `other`) and calling [`ThresholdLabeler::label_batch_zero_shot`].
pub fn classify_batch_zero_shot<C>(
    batch: &Batch,
    classifier: &C,
    labels: &[&str],
    threshold: f32,
    suffix: &str,
) -> Result<BatchLabels>
where
    C: ZeroShotClassifier + ?Sized,
{
    super::ThresholdLabelerBuilder::zero_shot()
        .threshold(threshold)
        .suffix(suffix)
        .build()?
        .label_batch_zero_shot(batch, classifier, labels)
}
