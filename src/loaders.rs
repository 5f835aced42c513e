use crate::error::{PipelineError, Result};
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

/// A single file in a Hugging Face model repo.
#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    /// Download (or reuse the cached copy of) the file and return its local path.
    pub fn load(&self) -> Result<PathBuf> {
        let api = Api::new().map_err(|e| {
            PipelineError::Download(format!("Failed to initialize HuggingFace API: {e}"))
        })?;
        let repo = api.repo(Repo::new(self.repo.clone(), RepoType::Model));
        repo.get(&self.filename).map_err(|e| {
            PipelineError::Download(format!(
                "Failed to download '{}' from '{}': {}",
                self.filename, self.repo, e
            ))
        })
    }
}

pub fn load_tokenizer(repo_id: &str) -> Result<Tokenizer> {
    let path = HfLoader::new(repo_id, "tokenizer.json").load()?;
    let tokenizer = Tokenizer::from_file(&path).map_err(|e| {
        PipelineError::Tokenization(format!(
            "Failed to load tokenizer from '{}': {}",
            path.display(),
            e
        ))
    })?;
    tracing::info!(repo = repo_id, "Loaded tokenizer");
    Ok(tokenizer)
}

/// Label vocabulary from a classifier's `config.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierLabels {
    /// Label names ordered by class id.
    pub id2label: Vec<String>,
}

impl ClassifierLabels {
    /// Class id of the first label whose lowercase name starts with `prefix`.
    pub fn find_prefix(&self, prefix: &str) -> Option<usize> {
        self.id2label
            .iter()
            .position(|label| label.to_lowercase().starts_with(prefix))
    }

    pub fn len(&self) -> usize {
        self.id2label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id2label.is_empty()
    }
}

#[derive(Deserialize)]
struct ClassifierConfigJson {
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    label2id: HashMap<String, u32>,
}

/// Read the label vocabulary out of a `config.json` body.
///
/// `id2label` keys are parsed as ids and sorted. When `id2label` is absent the
/// vocabulary is rebuilt from `label2id`.
pub fn parse_classifier_labels(config_json: &str) -> Result<ClassifierLabels> {
    let config: ClassifierConfigJson = serde_json::from_str(config_json)?;

    let mut indexed: Vec<(usize, String)> = if config.id2label.is_empty() {
        config
            .label2id
            .into_iter()
            .map(|(label, id)| (id as usize, label))
            .collect()
    } else {
        config
            .id2label
            .into_iter()
            .map(|(id, label)| {
                id.parse::<usize>()
                    .map(|id| (id, label))
                    .map_err(|_| {
                        PipelineError::InvalidParams(format!("Non-numeric id2label key '{id}'"))
                    })
            })
            .collect::<Result<_>>()?
    };
    indexed.sort_by_key(|(id, _)| *id);

    if indexed.iter().enumerate().any(|(i, (id, _))| i != *id) {
        return Err(PipelineError::InvalidParams(format!(
            "Label ids must be contiguous from 0, got {:?}",
            indexed.iter().map(|(id, _)| id).collect::<Vec<_>>()
        )));
    }

    Ok(ClassifierLabels {
        id2label: indexed.into_iter().map(|(_, label)| label).collect(),
    })
}

/// Local paths of a model's config and weights.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    /// Fetch `config.json` and `model.safetensors` (or `pytorch_model.bin`).
    pub fn fetch(repo_id: &str) -> Result<Self> {
        let config = HfLoader::new(repo_id, "config.json").load()?;
        let weights = HfLoader::new(repo_id, "model.safetensors")
            .load()
            .or_else(|_| HfLoader::new(repo_id, "pytorch_model.bin").load())?;
        Ok(Self { config, weights })
    }

    pub fn read_config(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.config)?)
    }

    pub fn var_builder(&self, device: &Device) -> Result<VarBuilder<'static>> {
        load_weights(&self.weights, device)
    }
}

fn load_weights(path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let vb = if path.extension().is_some_and(|e| e == "safetensors") {
        // SAFETY: the file is not modified while mapped; hf-hub cache files are immutable.
        unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)? }
    } else {
        VarBuilder::from_pth(path, DType::F32, device)?
    };
    Ok(vb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_id2label_by_numeric_id() {
        let labels = parse_classifier_labels(
            r#"{ "id2label": { "10": "k", "2": "pay", "0": "culture", "1": "other",
                 "3": "a", "4": "b", "5": "c", "6": "d", "7": "e", "8": "f", "9": "g" } }"#,
        )
        .unwrap();
        assert_eq!(&labels.id2label[..4], &["culture", "other", "pay", "a"]);
        assert_eq!(labels.id2label.last().map(String::as_str), Some("k"));
    }

    #[test]
    fn falls_back_to_label2id() {
        let labels =
            parse_classifier_labels(r#"{ "label2id": { "entailment": 0, "not_entailment": 1 } }"#)
                .unwrap();
        assert_eq!(labels.id2label, vec!["entailment", "not_entailment"]);
        assert_eq!(labels.find_prefix("entail"), Some(0));
        assert_eq!(labels.find_prefix("contra"), None);
    }

    #[test]
    fn rejects_gaps_and_bad_keys() {
        assert!(parse_classifier_labels(r#"{ "id2label": { "0": "a", "2": "b" } }"#).is_err());
        assert!(parse_classifier_labels(r#"{ "id2label": { "x": "a" } }"#).is_err());
    }

    #[test]
    fn empty_config_has_no_labels() {
        let labels = parse_classifier_labels("{}").unwrap();
        assert!(labels.is_empty());
    }
}
