//! Integration tests for the ModernBERT backends.
//! Run with: cargo test --features integration

#![cfg(feature = "integration")]

use label_pipelines::error::Result;
use label_pipelines::labeling::{classify_batch_zero_shot, Batch, ZeroShotClassifier, ZeroShotOptions};
use label_pipelines::{config::DEFAULT_ZERO_SHOT_REPO, DeviceRequest, ModernBertZeroShot};

#[test]
fn zero_shot_scores_every_candidate() -> Result<()> {
    let classifier = ModernBertZeroShot::from_hub(DEFAULT_ZERO_SHOT_REPO, &DeviceRequest::Cpu, 512)?;
    let labels = ["pay", "management", "culture"];

    let outputs = classifier.classify(
        &["I would like a higher salary"],
        &labels,
        ZeroShotOptions::default(),
    )?;
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].labels.len(), labels.len());
    assert_eq!(outputs[0].labels[0], "pay");
    assert!(outputs[0].scores.windows(2).all(|w| w[0] >= w[1]));
    Ok(())
}

#[test]
fn single_label_scores_sum_to_one() -> Result<()> {
    let classifier = ModernBertZeroShot::from_hub(DEFAULT_ZERO_SHOT_REPO, &DeviceRequest::Cpu, 512)?;
    let options = ZeroShotOptions {
        multi_label: false,
        truncation: true,
    };
    let outputs = classifier.classify(&["The team is great"], &["culture", "pay"], options)?;
    let total: f32 = outputs[0].scores.iter().sum();
    assert!((total - 1.0).abs() < 1e-4);
    Ok(())
}

#[test]
fn zero_shot_batch_labels() -> Result<()> {
    let classifier = ModernBertZeroShot::from_hub(DEFAULT_ZERO_SHOT_REPO, &DeviceRequest::Cpu, 512)?;
    let batch = Batch::new(["Pay us more", "The cafeteria food is cold"]);
    let labels = classify_batch_zero_shot(&batch, &classifier, &["Pay", "Food"], 0.5, "_llm")?;
    assert_eq!(labels.len(), 2);
    assert_eq!(labels.get("pay_llm").map(|v| v[0]), Some(1));
    Ok(())
}
