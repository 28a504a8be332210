/// Batcher
pub mod batcher;

/// Text Classification Items
pub mod item;

/// Training
pub mod training;

/// Inference
pub mod inference;

/// Saving and loading trained classifiers
pub mod artifact;

pub use artifact::{Artifact, Manifest};
pub use batcher::Batcher;
pub use inference::{infer, Prediction, Predictor};
pub use item::Item;
pub use training::{
    artifact_dir, evaluate, evaluate_outcome, train, Config, Evaluation, Optimizer, Outcome,
};
