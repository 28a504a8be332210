use std::path::Path;

use burn::tensor::{activation::softmax, backend::Backend};

use crate::{
    error::{Error, Result},
    models::SequenceClassifier,
    text::Vectorizer,
    utils::tensors::to_vec,
};

use super::{Artifact, Batcher};

/// The predicted class of one text
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    /// The most probable class id
    pub class_id: usize,

    /// The name of that class
    pub label: String,

    /// The full distribution over classes, in id order
    pub probabilities: Vec<f32>,
}

/// A trained model bundled with the vectorizer and labels it was trained with
pub struct Predictor<B: Backend> {
    model: SequenceClassifier<B>,
    batcher: Batcher<B>,
    labels: Vec<String>,
}

impl<B: Backend> Predictor<B> {
    /// Creates a new predictor. `labels` must name every class of the model, in id order.
    pub fn new(
        model: SequenceClassifier<B>,
        vectorizer: Vectorizer,
        labels: &[String],
        device: B::Device,
    ) -> Result<Self> {
        if labels.is_empty() || labels.len() != model.n_classes {
            return Err(Error::config(format!(
                "{} labels given for a classifier with {} classes",
                labels.len(),
                model.n_classes
            )));
        }

        Ok(Self {
            model,
            batcher: Batcher::new(vectorizer, labels, device),
            labels: labels.iter().map(|label| label.trim().to_string()).collect(),
        })
    }

    /// Classify a batch of texts
    pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Prediction>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let input = self.batcher.infer_batch(texts)?;
        let probabilities = to_vec(softmax(self.model.try_forward(input)?, 1));

        let predictions = probabilities
            .chunks(self.labels.len())
            .map(|row| {
                let class_id = row
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i)
                    .unwrap_or_default();

                Prediction {
                    class_id,
                    label: self.labels[class_id].clone(),
                    probabilities: row.to_vec(),
                }
            })
            .collect();

        Ok(predictions)
    }
}

/// Define inference function: load the artifact in `artifact_dir` and classify `samples`
pub fn infer<B: Backend>(
    device: B::Device, // Device on which to perform computation (e.g., CPU or CUDA device)
    artifact_dir: impl AsRef<Path>, // Directory containing the saved classifier
    samples: &[String], // Text samples for inference
) -> anyhow::Result<Vec<Prediction>> {
    log::info!("Loading classifier...");

    let artifact = Artifact::<B>::load(artifact_dir, &device)?;

    log::info!(
        "Running inference with the {} classifier...",
        artifact.manifest.model_name
    );

    Ok(artifact.predictor(device)?.predict(samples)?)
}
