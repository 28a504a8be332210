use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use burn::{
    backend::{Autodiff, NdArray},
    data::dataset::{Dataset as _, InMemDataset},
    module::AutodiffModule,
    train::TrainingInterrupter,
};
use burn_text_rnn::{
    cli::models::Model,
    datasets::{toy, Document},
    embeddings::{EmbeddingProvider, MissPolicy, WordVectors},
    error::Error,
    pipelines::text_classification::{self, Config, Item, Optimizer, Outcome},
    utils::tensors::to_vec,
};
use pretty_assertions::assert_eq;

type TrainingBackend = Autodiff<NdArray>;

fn config(model: Model) -> Config {
    Config::new(
        model.to_string(),
        toy::DATASET.to_string(),
        toy::LABELS.iter().map(|label| label.to_string()).collect(),
    )
    .with_encoder(model.encoder().with_embed_dim(8).with_hidden_size(8))
    .with_num_epochs(3)
    .with_batch_size(4)
}

fn run(config: &Config) -> Result<Outcome<TrainingBackend>, Error> {
    text_classification::train::<TrainingBackend, Document, toy::Dataset>(
        &Default::default(),
        &toy::Dataset::train(),
        config,
        None,
        &TrainingInterrupter::new(),
    )
}

#[test]
fn repeated_runs_reproduce_the_loss_trajectory() {
    for model in [Model::Mean, Model::Rnn, Model::Lstm, Model::BiLstm] {
        let config = config(model);

        let first = run(&config).unwrap();
        let second = run(&config).unwrap();

        // 16 documents in batches of 4 over 3 epochs
        assert_eq!(first.batch_losses.len(), 12);
        assert_eq!(first.epoch_losses.len(), 3);
        assert_eq!(first.batch_losses, second.batch_losses);
        assert!(!first.interrupted);
    }
}

#[test]
fn different_seeds_give_different_trajectories() {
    let first = run(&config(Model::Lstm)).unwrap();
    let second = run(&config(Model::Lstm).with_seed(7)).unwrap();

    assert_ne!(first.batch_losses, second.batch_losses);
}

#[test]
fn training_reduces_the_loss() {
    for optimizer in [Optimizer::Adam, Optimizer::Sgd] {
        let learning_rate = match optimizer {
            Optimizer::Adam => 0.05,
            Optimizer::Sgd => 0.5,
        };

        let config = config(Model::Mean)
            .with_num_epochs(30)
            .with_optimizer(optimizer)
            .with_learning_rate(learning_rate);

        let outcome = run(&config).unwrap();

        let first = outcome.epoch_losses[0];
        let last = outcome.epoch_losses[outcome.epoch_losses.len() - 1];

        assert!(last < first, "{optimizer:?}: {first} -> {last}");
    }
}

#[test]
fn trained_model_fits_the_training_split() {
    let config = config(Model::Mean)
        .with_num_epochs(40)
        .with_learning_rate(0.05);

    let outcome = run(&config).unwrap();
    let evaluation =
        text_classification::evaluate_outcome(&outcome, toy::Dataset::train(), 8).unwrap();

    assert_eq!(evaluation.documents, 16);
    assert!(evaluation.accuracy >= 0.75, "{evaluation:?}");
}

#[test]
fn exploding_updates_are_numeric_errors() {
    let config = config(Model::Mean)
        .with_optimizer(Optimizer::Sgd)
        .with_learning_rate(1e30);

    match run(&config) {
        Err(Error::Numeric { epoch, .. }) => assert_eq!(epoch, 1),
        other => panic!("expected a numeric error, got {:?}", other.map(|o| o.batch_losses)),
    }
}

#[test]
fn interrupted_runs_stop_before_the_next_batch() {
    let interrupter = TrainingInterrupter::new();
    interrupter.stop();

    let outcome = text_classification::train::<TrainingBackend, Document, toy::Dataset>(
        &Default::default(),
        &toy::Dataset::train(),
        &config(Model::Lstm),
        None,
        &interrupter,
    )
    .unwrap();

    assert!(outcome.interrupted);
    assert!(outcome.batch_losses.is_empty());
    assert!(outcome.epoch_losses.is_empty());
}

/// A toy document that stops the run once labels have been read `limit` times
#[derive(Clone)]
struct Tripwire {
    document: Document,
    reads: Arc<AtomicUsize>,
    limit: usize,
    interrupter: TrainingInterrupter,
}

impl fmt::Debug for Tripwire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tripwire")
            .field("document", &self.document)
            .field("limit", &self.limit)
            .finish()
    }
}

impl Item for Tripwire {
    fn input(&self) -> &str {
        self.document.input()
    }

    fn class_label(&self) -> &str {
        if self.reads.fetch_add(1, Ordering::SeqCst) + 1 == self.limit {
            self.interrupter.stop();
        }

        self.document.class_label()
    }
}

/// Train on the toy split, stopping while the `batches`-th batch is assembled. Every label is
/// read once up front and once more each time its document is batched.
fn train_until(config: &Config, batches: usize) -> Outcome<TrainingBackend> {
    let documents: Vec<Document> = toy::Dataset::train().iter().collect();
    let limit = documents.len() + batches * config.batch_size;

    let interrupter = TrainingInterrupter::new();
    let reads = Arc::new(AtomicUsize::new(0));

    let dataset = InMemDataset::new(
        documents
            .into_iter()
            .map(|document| Tripwire {
                document,
                reads: reads.clone(),
                limit,
                interrupter: interrupter.clone(),
            })
            .collect(),
    );

    text_classification::train::<TrainingBackend, Tripwire, _>(
        &Default::default(),
        &dataset,
        config,
        None,
        &interrupter,
    )
    .unwrap()
}

#[test]
fn interrupted_runs_keep_every_completed_batch() {
    let config = config(Model::Lstm);
    let full = run(&config).unwrap();

    // Two batches into the second epoch
    let outcome = train_until(&config, 6);

    assert!(outcome.interrupted);
    assert_eq!(outcome.batch_losses, full.batch_losses[..6].to_vec());
    assert_eq!(outcome.epoch_losses, full.epoch_losses[..1].to_vec());
}

#[test]
fn interrupted_models_match_a_run_of_the_completed_batches() {
    let config = config(Model::Lstm);

    // Stopped right after the first epoch's four batches
    let interrupted = train_until(&config, 4);
    let capped = run(&config.clone().with_num_epochs(1)).unwrap();

    assert!(interrupted.interrupted);
    assert!(!capped.interrupted);
    assert_eq!(interrupted.batch_losses, capped.batch_losses);

    assert_eq!(
        to_vec(interrupted.model.output.weight.val()),
        to_vec(capped.model.output.weight.val())
    );
    assert_eq!(
        to_vec(interrupted.model.embedding.weight.val()),
        to_vec(capped.model.embedding.weight.val())
    );
}

/// Gives every token a vector at the edge of the `f32` range
struct Saturated {
    row: Vec<f32>,
}

impl EmbeddingProvider for Saturated {
    fn dimension(&self) -> usize {
        self.row.len()
    }

    fn lookup(&self, _token: &str) -> Option<&[f32]> {
        Some(&self.row)
    }
}

#[test]
fn non_finite_losses_abort_before_the_first_update() {
    let vectors = Saturated {
        row: vec![f32::MAX; 4],
    };

    let config = config(Model::Mean).with_encoder(Model::Mean.encoder().with_embed_dim(4));

    let result = text_classification::train::<TrainingBackend, Document, toy::Dataset>(
        &Default::default(),
        &toy::Dataset::train(),
        &config,
        Some(&vectors),
        &TrainingInterrupter::new(),
    );

    match result {
        Err(Error::Numeric {
            epoch,
            batch,
            quantity,
            ..
        }) => {
            assert_eq!((epoch, batch, quantity), (1, 0, "loss"));
        }
        other => panic!("expected a numeric error, got {:?}", other.map(|o| o.batch_losses)),
    }
}

#[test]
fn unknown_labels_are_config_errors() {
    let mut config = config(Model::Mean);
    config.labels = vec!["positive".to_string()];

    assert!(matches!(run(&config), Err(Error::Config(_))));
}

#[test]
fn empty_datasets_are_config_errors() {
    let empty = InMemDataset::<Document>::new(Vec::new());

    let result = text_classification::train::<TrainingBackend, Document, _>(
        &Default::default(),
        &empty,
        &config(Model::Mean),
        None,
        &TrainingInterrupter::new(),
    );

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn frozen_embeddings_do_not_move() {
    let config = config(Model::Lstm).with_freeze_embeddings(true);
    let outcome = run(&config).unwrap();

    let initial = outcome
        .classifier
        .init::<TrainingBackend>(&Default::default())
        .unwrap();

    assert_eq!(
        to_vec(outcome.model.embedding.weight.val()),
        to_vec(initial.embedding.weight.val())
    );
}

#[test]
fn pretrained_vectors_seed_the_embedding_table() {
    let vectors = WordVectors::parse([
        "wonderful 0.5 0.5 0.5 0.5",
        "terrible -0.5 -0.5 -0.5 -0.5",
        "zebra 1 1 1 1",
    ])
    .unwrap();

    let config = config(Model::Mean)
        .with_encoder(Model::Mean.encoder().with_embed_dim(4))
        .with_num_epochs(1)
        .with_miss_policy(MissPolicy::Zero)
        .with_freeze_embeddings(true);

    let outcome = text_classification::train::<TrainingBackend, Document, toy::Dataset>(
        &Default::default(),
        &toy::Dataset::train(),
        &config,
        Some(&vectors),
        &TrainingInterrupter::new(),
    )
    .unwrap();

    let coverage = outcome.coverage.unwrap();
    assert_eq!(coverage.hits, 2);

    let id = outcome.vectorizer.vocabulary().id("wonderful").unwrap();
    let table = to_vec(outcome.model.valid().embedding.weight.val());

    assert_eq!(&table[id * 4..id * 4 + 4], &[0.5, 0.5, 0.5, 0.5]);
}

#[test]
fn mismatched_vector_dimensions_are_config_errors() {
    let vectors = WordVectors::parse(["wonderful 0.5 0.5"]).unwrap();

    let result = text_classification::train::<TrainingBackend, Document, toy::Dataset>(
        &Default::default(),
        &toy::Dataset::train(),
        &config(Model::Mean),
        Some(&vectors),
        &TrainingInterrupter::new(),
    );

    assert!(matches!(result, Err(Error::Config(_))));
}
