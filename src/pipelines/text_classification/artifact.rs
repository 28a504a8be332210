//! A trained classifier on disk: `manifest.json` (schema version, classifier config, labels),
//! `vocabulary.json` (the id-ordered token table) and the `model` record.

use std::{fs, path::Path, sync::Arc};

use burn::{
    config::Config as _,
    module::Module,
    record::{CompactRecorder, Recorder},
    tensor::backend::{AutodiffBackend, Backend},
};

use crate::{
    models::{ClassifierConfig, SequenceClassifier},
    text::{Vectorizer, Vocabulary, VocabularyFile},
};

use super::{Outcome, Predictor};

/// The current version of the artifact layout
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// The manifest file name
pub static MANIFEST_FILE: &str = "manifest.json";

/// The vocabulary file name
pub static VOCABULARY_FILE: &str = "vocabulary.json";

/// The model record name
pub static MODEL_FILE: &str = "model";

/// Everything needed to rebuild a trained classifier besides its weights and vocabulary
#[derive(burn::config::Config, Debug)]
pub struct Manifest {
    /// Layout version, checked on load
    #[config(default = "ARTIFACT_SCHEMA_VERSION")]
    pub schema_version: u32,

    /// The architecture and sizes of the classifier
    pub classifier: ClassifierConfig,

    /// Class labels in id order
    pub labels: Vec<String>,

    /// The model preset the classifier was trained as (e.g., "lstm")
    pub model_name: String,

    /// The per-document token cap used during training
    pub max_seq_length: Option<usize>,
}

/// A trained classifier with its vocabulary and labels
#[derive(Debug)]
pub struct Artifact<B: Backend> {
    /// Sizes, labels and layout version
    pub manifest: Manifest,

    /// The vectorizer over the training vocabulary
    pub vectorizer: Vectorizer,

    /// The trained model
    pub model: SequenceClassifier<B>,
}

impl<B: AutodiffBackend> Artifact<B> {
    /// Package the result of a training run
    pub fn from_outcome(outcome: Outcome<B>, model_name: &str) -> Self {
        let manifest = Manifest::new(outcome.classifier, outcome.labels, model_name.to_string())
            .with_max_seq_length(outcome.vectorizer.max_tokens());

        Self {
            manifest,
            vectorizer: outcome.vectorizer,
            model: outcome.model,
        }
    }
}

impl<B: Backend> Artifact<B> {
    /// Write the manifest, vocabulary and model record into `dir`, creating it if needed
    pub fn save(&self, dir: impl AsRef<Path>) -> anyhow::Result<()> {
        let dir = dir.as_ref();

        fs::create_dir_all(dir)
            .map_err(|e| anyhow!("Unable to create artifact directory {:?}: {}", dir, e))?;

        self.manifest
            .save(dir.join(MANIFEST_FILE))
            .map_err(|e| anyhow!("Unable to save manifest: {}", e))?;

        let vocabulary = serde_json::to_string_pretty(&self.vectorizer.vocabulary().to_file())?;
        fs::write(dir.join(VOCABULARY_FILE), vocabulary)
            .map_err(|e| anyhow!("Unable to save vocabulary: {}", e))?;

        CompactRecorder::new()
            .record(self.model.clone().into_record(), dir.join(MODEL_FILE))
            .map_err(|e| anyhow!("Unable to save trained model weights: {}", e))?;

        log::info!("Saved classifier to {:?}", dir);

        Ok(())
    }

    /// Restore an artifact saved by `save`, rejecting other layout versions
    pub fn load(dir: impl AsRef<Path>, device: &B::Device) -> anyhow::Result<Self> {
        let dir = dir.as_ref();

        let manifest = Manifest::load(dir.join(MANIFEST_FILE))
            .map_err(|e| anyhow!("Unable to load manifest: {}", e))?;

        if manifest.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(anyhow!(
                "Unsupported artifact schema version {} (expected {})",
                manifest.schema_version,
                ARTIFACT_SCHEMA_VERSION
            ));
        }

        let file: VocabularyFile =
            serde_json::from_str(&fs::read_to_string(dir.join(VOCABULARY_FILE))?)?;
        let vocabulary = Vocabulary::from_file(file)?;

        if vocabulary.len() != manifest.classifier.vocab_size {
            return Err(anyhow!(
                "Vocabulary has {} tokens but the classifier was built for {}",
                vocabulary.len(),
                manifest.classifier.vocab_size
            ));
        }

        if manifest.labels.len() != manifest.classifier.num_classes {
            return Err(anyhow!(
                "Manifest lists {} labels for {} classes",
                manifest.labels.len(),
                manifest.classifier.num_classes
            ));
        }

        let record = CompactRecorder::new()
            .load(dir.join(MODEL_FILE), device)
            .map_err(|e| anyhow!("Unable to load trained model weights: {}", e))?;

        let model = manifest.classifier.init::<B>(device)?.load_record(record);

        let vectorizer =
            Vectorizer::new(Arc::new(vocabulary)).with_max_tokens(manifest.max_seq_length);

        Ok(Self {
            manifest,
            vectorizer,
            model,
        })
    }

    /// Turn the artifact into a predictor on `device`
    pub fn predictor(self, device: B::Device) -> crate::error::Result<Predictor<B>> {
        Predictor::new(self.model, self.vectorizer, &self.manifest.labels, device)
    }
}
