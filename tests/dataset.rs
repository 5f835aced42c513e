//! Table loading, splitting and the label-then-compare round trip.

use label_pipelines::compare::summarize;
use label_pipelines::dataset::{create_train_test_split, Table};
use label_pipelines::error::Result;
use label_pipelines::labeling::{Prediction, TextClassifier, ThresholdLabelerBuilder};
use std::io::Write;

const SURVEY: &str = "response,pay,culture\n\
                      Better salary please,1,0\n\
                      Great team and culture,0,1\n\
                      Pay us more and fix the culture,1,1\n\
                      No comment,0,0\n\
                      Salary is too low,1,0\n";

struct Keywords;

impl TextClassifier for Keywords {
    fn id2label(&self) -> Vec<String> {
        vec!["pay".into(), "culture".into()]
    }

    fn classify(&self, texts: &[&str]) -> Result<Vec<Vec<Prediction>>> {
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                let hit = |words: &[&str]| {
                    if words.iter().any(|w| t.contains(w)) {
                        0.9
                    } else {
                        0.1
                    }
                };
                vec![
                    Prediction::new("pay", hit(&["salary", "pay"])),
                    Prediction::new("culture", hit(&["team", "culture"])),
                ]
            })
            .collect())
    }
}

#[test]
fn split_is_positional_and_complete() -> Result<()> {
    let table = Table::from_csv_reader(SURVEY.as_bytes())?;
    let (train, test) = create_train_test_split(&table, 3);

    assert_eq!(train.len(), 3);
    assert_eq!(test.len(), 2);
    assert_eq!(train.rows(), &table.rows()[..3]);
    assert_eq!(test.rows(), &table.rows()[3..]);

    let (train, test) = create_train_test_split(&table, 1_000);
    assert_eq!(train.len(), table.len());
    assert!(test.is_empty());
    Ok(())
}

#[test]
fn label_vectors_follow_column_order() -> Result<()> {
    let table = Table::from_csv_reader(SURVEY.as_bytes())?;
    let examples = table.label_vectors("response")?;

    assert_eq!(examples.len(), 5);
    assert_eq!(examples[2].text, "Pay us more and fix the culture");
    assert_eq!(examples[2].labels, vec![1.0, 1.0]);
    assert_eq!(examples[3].labels, vec![0.0, 0.0]);
    Ok(())
}

#[test]
fn label_append_and_compare() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(SURVEY.as_bytes())?;
    let mut table = Table::from_csv_path(file.path())?;

    let labeler = ThresholdLabelerBuilder::trained().build()?;
    let mut offset = 0;
    for batch in table.response_batches("response", 2)? {
        let labels = labeler.label_batch(&batch, &Keywords)?;
        table.append_labels(&labels, offset)?;
        offset += labels.len();
    }

    assert_eq!(
        table.columns(),
        &["response", "pay", "culture", "pay_bert", "culture_bert", "other_bert"]
    );
    assert_eq!(table.rows()[3].number("other_bert")?, 1.0);

    let summary = summarize(&table, &["pay", "culture"], &["pay_bert", "culture_bert"])?;
    assert_eq!(summary.total, 5);
    assert_eq!(summary.exact_match, 5);
    assert_eq!(summary.missed_one, 0);

    let mut out = Vec::new();
    table.to_csv_writer(&mut out)?;
    let written = String::from_utf8(out).expect("csv is utf-8");
    assert!(written.starts_with("response,pay,culture,pay_bert,culture_bert,other_bert\n"));
    assert!(written.contains("No comment,0,0,0,0,1\n"));
    Ok(())
}
