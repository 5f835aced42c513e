//! Batch labelling against scripted classifiers.

use label_pipelines::error::{PipelineError, Result};
use label_pipelines::labeling::*;

struct Fixed {
    vocabulary: Vec<&'static str>,
    rows: Vec<Vec<(&'static str, f32)>>,
}

impl TextClassifier for Fixed {
    fn id2label(&self) -> Vec<String> {
        self.vocabulary.iter().map(|l| l.to_string()).collect()
    }

    fn classify(&self, texts: &[&str]) -> Result<Vec<Vec<Prediction>>> {
        assert_eq!(texts.len(), self.rows.len());
        Ok(self
            .rows
            .iter()
            .map(|row| row.iter().map(|&(l, s)| Prediction::new(l, s)).collect())
            .collect())
    }
}

struct Uniform(f32);

impl ZeroShotClassifier for Uniform {
    fn classify(
        &self,
        texts: &[&str],
        candidate_labels: &[&str],
        _options: ZeroShotOptions,
    ) -> Result<Vec<ZeroShotOutput>> {
        Ok(texts
            .iter()
            .map(|t| ZeroShotOutput {
                sequence: t.to_string(),
                labels: candidate_labels.iter().map(|l| l.to_string()).collect(),
                scores: vec![self.0; candidate_labels.len()],
            })
            .collect())
    }
}

#[test]
fn two_response_batch() -> Result<()> {
    let classifier = Fixed {
        vocabulary: vec!["pay", "culture"],
        rows: vec![
            vec![("pay", 0.91), ("culture", 0.12)],
            vec![("pay", 0.2), ("culture", 0.3)],
        ],
    };
    let batch = Batch::new(["Better salary", "No comment"]);
    let labels = classify_batch(&batch, &classifier, 0.5, TRAINED_SUFFIX)?;

    assert_eq!(labels.len(), 2);
    assert_eq!(labels.get("pay_bert"), Some(&[1, 0][..]));
    assert_eq!(labels.get("culture_bert"), Some(&[0, 0][..]));
    assert_eq!(labels.get("other_bert"), Some(&[0, 1][..]));
    assert_eq!(labels.stats.items_processed, 2);
    Ok(())
}

#[test]
fn score_equal_to_threshold_is_negative() -> Result<()> {
    let classifier = Fixed {
        vocabulary: vec!["pay"],
        rows: vec![vec![("pay", 0.5)]],
    };
    let labels = classify_batch(&Batch::new(["x"]), &classifier, 0.5, "_bert")?;
    assert_eq!(labels.positives(0), vec!["other_bert"]);
    Ok(())
}

#[test]
fn every_row_has_at_least_one_positive() -> Result<()> {
    let scores = [0.0, 0.3, 0.5, 0.51, 0.99];
    let classifier = Fixed {
        vocabulary: vec!["a", "b"],
        rows: scores
            .iter()
            .map(|&s| vec![("a", s), ("b", 1.0 - s)])
            .collect(),
    };
    let batch = Batch::new(scores.iter().map(|s| s.to_string()));
    let labels = classify_batch(&batch, &classifier, 0.5, "_bert")?;

    for row in 0..labels.len() {
        let positives = labels.positives(row);
        assert!(!positives.is_empty(), "row {row} has no label");
        if positives.contains(&"other_bert") {
            assert_eq!(positives.len(), 1, "other must be exclusive in row {row}");
        }
    }
    Ok(())
}

#[test]
fn zero_shot_uses_llm_suffix_and_normalized_names() -> Result<()> {
    let labels = classify_batch_zero_shot(
        &Batch::new(["Flexible hours would help"]),
        &Uniform(0.8),
        &["Work Life Balance", "Pay"],
        0.5,
        ZERO_SHOT_SUFFIX,
    )?;
    assert_eq!(
        labels.column_names().collect::<Vec<_>>(),
        vec!["work_life_balance_llm", "pay_llm", "other_llm"]
    );
    assert_eq!(labels.positives(0), vec!["work_life_balance_llm", "pay_llm"]);
    Ok(())
}

#[test]
fn labeler_can_be_reused_across_batches() -> Result<()> {
    let labeler = ThresholdLabelerBuilder::zero_shot().threshold(0.9).build()?;
    for text in ["one", "two"] {
        let labels = labeler.label_batch_zero_shot(&Batch::new([text]), &Uniform(0.8), &["pay"])?;
        assert_eq!(labels.get("other_llm"), Some(&[1][..]));
        assert_eq!(labels.stats.fallback_rate(), 1.0);
    }
    Ok(())
}

#[test]
fn out_of_range_threshold_is_rejected() {
    let classifier = Fixed {
        vocabulary: vec!["pay"],
        rows: vec![],
    };
    for threshold in [-0.1, 1.5, f32::NAN] {
        let err = classify_batch(&Batch::default(), &classifier, threshold, "_bert").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParams(_)));
    }
}
