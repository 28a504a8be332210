//! A deterministic training loop for the sequence classifier.
//!
//! Batches are drawn in an order shuffled by a seeded `StdRng`, so a config with the same seed
//! reproduces the same loss trajectory. The loss is checked before every backward pass and the
//! parameters after every optimizer step; anything non-finite aborts the run.

use std::sync::Arc;

use burn::{
    data::{
        dataloader::{DataLoader, DataLoaderBuilder, DataLoaderIterator},
        dataset::Dataset,
    },
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer as Optim, SgdConfig},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
    train::{
        metric::{AccuracyMetric, Adaptor, LossMetric, Metric, MetricMetadata, Numeric},
        TrainingInterrupter,
    },
    LearningRate,
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    embeddings::{Coverage, EmbeddingProvider, MissPolicy},
    error::{self, Error},
    models::{ClassifierConfig, EncoderConfig, SequenceClassifier},
    text::{Vectorizer, VocabularyBuilder},
};

use super::{batcher::Train, Batcher, Item};

/// The available gradient descent methods
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Optimizer {
    /// Plain stochastic gradient descent
    Sgd,

    /// Adam with the default moment settings
    Adam,
}

/// Define configuration struct for the experiment
#[derive(burn::config::Config, Debug)]
pub struct Config {
    /// Batch size
    #[config(default = 8)]
    pub batch_size: usize,

    /// Number of epochs
    #[config(default = 10)]
    pub num_epochs: usize,

    /// Initial learning rate
    #[config(default = 1e-2)]
    pub learning_rate: LearningRate,

    /// Gradient descent method
    #[config(default = "Optimizer::Adam")]
    pub optimizer: Optimizer,

    /// Seed for parameter initialization and batch order
    #[config(default = 42)]
    pub seed: u64,

    /// Reshuffle the training documents every epoch
    #[config(default = true)]
    pub shuffle: bool,

    /// Maximum vocabulary size, reserved ids included
    #[config(default = 10_000)]
    pub max_vocab_size: usize,

    /// Tokens seen fewer times are left out of the vocabulary
    #[config(default = 1)]
    pub min_frequency: usize,

    /// Keep at most this many tokens per document
    pub max_seq_length: Option<usize>,

    /// Classifier architecture
    #[config(default = "EncoderConfig::new()")]
    pub encoder: EncoderConfig,

    /// How rows missing from pre-trained vectors are filled
    #[config(default = "MissPolicy::Random")]
    pub miss_policy: MissPolicy,

    /// Keep the embedding table fixed during training
    #[config(default = false)]
    pub freeze_embeddings: bool,

    /// The location of the top-level data directory
    #[config(default = "\"data\".to_string()")]
    pub data_dir: String,

    /// Model preset name (e.g., "lstm")
    pub model_name: String,

    /// The Dataset to use (e.g., "toy")
    pub dataset_name: String,

    /// Class labels for the selected dataset
    pub labels: Vec<String>,
}

impl Config {
    /// The directory trained artifacts are written to
    pub fn artifact_dir(&self) -> String {
        artifact_dir(&self.data_dir, &self.dataset_name, &self.model_name)
    }

    fn validate(&self) -> error::Result<()> {
        if self.labels.is_empty() {
            return Err(Error::config("at least one class label is required"));
        }

        if self.batch_size == 0 {
            return Err(Error::config("batch size must be positive"));
        }

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::config(format!(
                "learning rate must be a positive number, got {}",
                self.learning_rate
            )));
        }

        self.encoder.validate()
    }
}

/// The directory a classifier trained on `dataset_name` as `model_name` is saved to
pub fn artifact_dir(data_dir: &str, dataset_name: &str, model_name: &str) -> String {
    format!("{data_dir}/text-classification/{dataset_name}/{model_name}")
}

/// The result of a training run
#[derive(Debug)]
pub struct Outcome<B: AutodiffBackend> {
    /// The trained model, as of the last completed batch
    pub model: SequenceClassifier<B>,

    /// The configuration the model was built from
    pub classifier: ClassifierConfig,

    /// The vectorizer over the vocabulary built from the training documents
    pub vectorizer: Vectorizer,

    /// Class labels in id order
    pub labels: Vec<String>,

    /// The loss of every completed batch, in order
    pub batch_losses: Vec<f64>,

    /// The mean batch loss of every completed epoch
    pub epoch_losses: Vec<f64>,

    /// Pre-trained vector coverage, when a provider was used
    pub coverage: Option<Coverage>,

    /// Whether the run was stopped early by the interrupter
    pub interrupted: bool,
}

/// Accuracy and loss over a labelled dataset
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    /// Mean cross-entropy per document
    pub loss: f64,

    /// Fraction of documents whose most probable class is the labelled one
    pub accuracy: f64,

    /// Number of documents evaluated
    pub documents: usize,
}

/// Define train function.
///
/// Builds the vocabulary from the training documents, initializes the classifier (from
/// `embeddings` where given) and runs `num_epochs` epochs. `interrupter` is checked before each
/// batch; once stopped, the run returns the model as of the last completed batch.
pub fn train<B, I, D>(
    device: &B::Device, // Device on which to perform computation (e.g., CPU or CUDA device)
    dataset_train: &D,  // Training dataset
    config: &Config,    // Experiment configuration
    embeddings: Option<&dyn EmbeddingProvider>, // Optional pre-trained vectors
    interrupter: &TrainingInterrupter, // Stops the run between batches
) -> error::Result<Outcome<B>>
where
    B: AutodiffBackend,
    I: Item,
    D: Dataset<I>,
{
    config.validate()?;

    let items: Vec<I> = dataset_train.iter().collect();

    if items.is_empty() {
        return Err(Error::config("the training dataset is empty"));
    }

    let vocab = VocabularyBuilder::new(config.max_vocab_size)
        .with_min_frequency(config.min_frequency)
        .build(items.iter().map(|item| item.input()))?;

    log::info!(
        "Built a vocabulary of {} tokens from {} documents",
        vocab.len(),
        items.len()
    );

    let classifier =
        ClassifierConfig::new(vocab.len(), config.labels.len(), config.encoder.clone())
            .with_seed(config.seed);

    let (mut model, coverage) = match embeddings {
        Some(provider) => {
            let (model, coverage) = classifier.init_with_embeddings::<B>(
                device,
                &vocab,
                provider,
                config.miss_policy,
            )?;
            (model, Some(coverage))
        }
        None => (classifier.init::<B>(device)?, None),
    };

    if config.freeze_embeddings {
        model = model.freeze_embeddings();
    }

    let vectorizer = Vectorizer::new(Arc::new(vocab)).with_max_tokens(config.max_seq_length);
    let batcher = Batcher::<B>::new(vectorizer.clone(), &config.labels, device.clone());

    // Surface unknown labels before any parameter is touched
    for item in &items {
        batcher.class_id(item.class_label())?;
    }

    let run = Run {
        items: &items,
        batcher: &batcher,
        config,
        interrupter,
    };

    let progress = match config.optimizer {
        Optimizer::Sgd => run.fit(model, SgdConfig::new().init())?,
        Optimizer::Adam => run.fit(model, AdamConfig::new().init())?,
    };

    Ok(Outcome {
        model: progress.model,
        classifier,
        vectorizer,
        labels: config.labels.clone(),
        batch_losses: progress.batch_losses,
        epoch_losses: progress.epoch_losses,
        coverage,
        interrupted: progress.interrupted,
    })
}

struct Run<'a, B: AutodiffBackend, I> {
    items: &'a [I],
    batcher: &'a Batcher<B>,
    config: &'a Config,
    interrupter: &'a TrainingInterrupter,
}

struct Progress<B: AutodiffBackend> {
    model: SequenceClassifier<B>,
    batch_losses: Vec<f64>,
    epoch_losses: Vec<f64>,
    interrupted: bool,
}

impl<'a, B: AutodiffBackend, I: Item> Run<'a, B, I> {
    fn fit<O>(&self, mut model: SequenceClassifier<B>, mut optim: O) -> error::Result<Progress<B>>
    where
        O: Optim<SequenceClassifier<B>, B>,
    {
        let config = self.config;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut order: Vec<usize> = (0..self.items.len()).collect();

        let mut batch_losses = Vec::new();
        let mut epoch_losses = Vec::with_capacity(config.num_epochs);

        for epoch in 1..=config.num_epochs {
            if config.shuffle {
                order.shuffle(&mut rng);
            }

            let mut epoch_loss = 0.0;
            let mut batches = 0;

            for (index, chunk) in order.chunks(config.batch_size).enumerate() {
                if self.interrupter.should_stop() {
                    log::warn!("Training interrupted at epoch {epoch}, batch {index}");

                    return Ok(Progress {
                        model,
                        batch_losses,
                        epoch_losses,
                        interrupted: true,
                    });
                }

                let items: Vec<I> = chunk.iter().map(|i| self.items[*i].clone()).collect();
                let output = model.forward_classification(self.batcher.train_batch(&items)?);

                let loss = output.loss.clone().into_scalar().elem::<f64>();

                if !loss.is_finite() {
                    return Err(Error::Numeric {
                        epoch,
                        batch: index,
                        quantity: "loss",
                        value: loss,
                    });
                }

                let grads = GradientsParams::from_grads(output.loss.backward(), &model);
                model = optim.step(config.learning_rate, model, grads);

                if let Some(value) = model.non_finite_parameter() {
                    return Err(Error::Numeric {
                        epoch,
                        batch: index,
                        quantity: "parameter",
                        value: value as f64,
                    });
                }

                log::debug!("Epoch {epoch}, batch {index}: loss {loss:.6}");

                batch_losses.push(loss);
                epoch_loss += loss;
                batches += 1;
            }

            let mean = epoch_loss / batches as f64;
            log::info!("Epoch {epoch}/{}: mean loss {mean:.4}", config.num_epochs);

            epoch_losses.push(mean);
        }

        Ok(Progress {
            model,
            batch_losses,
            epoch_losses,
            interrupted: false,
        })
    }
}

/// Measure accuracy and mean loss over a labelled dataset. Use `model.valid()` to evaluate a
/// model trained on an autodiff backend.
pub fn evaluate<B, I, D>(
    model: &SequenceClassifier<B>,
    batcher: Batcher<B>,
    dataset: D,
    batch_size: usize,
) -> error::Result<Evaluation>
where
    B: Backend,
    I: Item + 'static,
    D: Dataset<I> + 'static,
{
    if dataset.is_empty() {
        return Err(Error::config("cannot evaluate on an empty dataset"));
    }

    if batch_size == 0 {
        return Err(Error::config("batch size must be positive"));
    }

    for item in dataset.iter() {
        batcher.class_id(item.class_label())?;
    }

    let dataloader: Arc<dyn DataLoader<Train<B>>> = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .build(dataset);

    let mut accuracy_metric = AccuracyMetric::<B>::new();
    let mut loss_metric = LossMetric::<B>::new();

    let mut loss = 0.0;
    let mut accuracy = 0.0;
    let mut documents = 0;

    let mut iterator = dataloader.iter();
    let mut iteration = 0;

    while let Some(batch) = iterator.next() {
        iteration += 1;

        let [n] = batch.targets.dims();
        let output = model.forward_classification(batch);

        let metadata = MetricMetadata {
            progress: iterator.progress(),
            epoch: 1,
            epoch_total: 1,
            iteration,
            lr: None,
        };

        let entry = accuracy_metric.update(&output.adapt(), &metadata);
        log::debug!("Evaluation batch {iteration}: {}", entry.formatted);

        loss_metric.update(&output.adapt(), &metadata);

        // Both metrics report the latest batch; weight them by its size
        accuracy += accuracy_metric.value() / 100.0 * n as f64;
        loss += loss_metric.value() * n as f64;
        documents += n;
    }

    Ok(Evaluation {
        loss: loss / documents as f64,
        accuracy: accuracy / documents as f64,
        documents,
    })
}

/// Shorthand for evaluating the inner-backend copy of a freshly trained model
pub fn evaluate_outcome<B, I, D>(
    outcome: &Outcome<B>,
    dataset: D,
    batch_size: usize,
) -> error::Result<Evaluation>
where
    B: AutodiffBackend,
    I: Item + 'static,
    D: Dataset<I> + 'static,
{
    let device = outcome.model.embedding.weight.device();
    let batcher =
        Batcher::<B::InnerBackend>::new(outcome.vectorizer.clone(), &outcome.labels, device);

    evaluate(&outcome.model.valid(), batcher, dataset, batch_size)
}
