/// Classifier and encoder configuration
pub mod config;

/// Token embedding table
pub mod embedding;

/// Simple and LSTM recurrent cells
pub mod cell;

/// Masked recurrent scans, bidirectional and stacked
pub mod encoder;

/// The sequence classifier: embed, aggregate, classify
pub mod classifier;

pub use classifier::SequenceClassifier;
pub use config::{Aggregation, ClassifierConfig, EncoderConfig};
pub use encoder::{RecurrentEncoder, ScanOutput};
