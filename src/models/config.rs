use serde::{Deserialize, Serialize};

use crate::error::{self, Error};

/// How the embedded sequence is reduced to a single vector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregation {
    /// Average of the real positions
    Mean,

    /// Sum of the real positions (a bag of embeddings)
    Sum,

    /// Final state of an Elman-style recurrent scan
    SimpleRnn,

    /// Final hidden state of an LSTM scan
    Lstm,
}

impl Aggregation {
    /// Whether this aggregation runs a recurrent scan
    pub fn is_recurrent(&self) -> bool {
        matches!(self, Aggregation::SimpleRnn | Aggregation::Lstm)
    }
}

/// Architecture settings shared by training runs and saved classifiers
#[derive(burn::config::Config, Debug, PartialEq)]
pub struct EncoderConfig {
    /// Size of each token embedding
    #[config(default = 32)]
    pub embed_dim: usize,

    /// Size of the recurrent hidden state
    #[config(default = 32)]
    pub hidden_size: usize,

    /// The aggregation strategy
    #[config(default = "Aggregation::Mean")]
    pub aggregation: Aggregation,

    /// Run a second, reversed scan and concatenate the final states
    #[config(default = false)]
    pub bidirectional: bool,

    /// Number of stacked recurrent layers
    #[config(default = 1)]
    pub num_layers: usize,
}

impl EncoderConfig {
    /// Size of the aggregated vector fed to the output projection
    pub fn output_size(&self) -> usize {
        match self.aggregation {
            Aggregation::Mean | Aggregation::Sum => self.embed_dim,
            Aggregation::SimpleRnn | Aggregation::Lstm => {
                self.hidden_size * if self.bidirectional { 2 } else { 1 }
            }
        }
    }

    /// Check the sizes are usable
    pub fn validate(&self) -> error::Result<()> {
        if self.embed_dim == 0 {
            return Err(Error::config("embedding dimension must be positive"));
        }

        if self.aggregation.is_recurrent() {
            if self.hidden_size == 0 {
                return Err(Error::config("hidden size must be positive"));
            }

            if self.num_layers == 0 {
                return Err(Error::config("at least one recurrent layer is required"));
            }
        }

        Ok(())
    }
}

/// Everything needed to rebuild a `SequenceClassifier`
#[derive(burn::config::Config, Debug, PartialEq)]
pub struct ClassifierConfig {
    /// Rows in the embedding table (the vocabulary size)
    pub vocab_size: usize,

    /// Number of output classes
    pub num_classes: usize,

    /// Architecture
    pub encoder: EncoderConfig,

    /// Seed for parameter initialization
    #[config(default = 42)]
    pub seed: u64,
}

impl ClassifierConfig {
    /// Check the configuration describes a buildable model
    pub fn validate(&self) -> error::Result<()> {
        if self.vocab_size < 2 {
            return Err(Error::config(format!(
                "vocabulary size must be at least 2, got {}",
                self.vocab_size
            )));
        }

        if self.num_classes == 0 {
            return Err(Error::config("at least one class is required"));
        }

        self.encoder.validate()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn output_size_follows_the_aggregation() {
        let pooled = EncoderConfig::new().with_embed_dim(8);
        assert_eq!(pooled.output_size(), 8);

        let bilstm = EncoderConfig::new()
            .with_hidden_size(5)
            .with_aggregation(Aggregation::Lstm)
            .with_bidirectional(true);
        assert_eq!(bilstm.output_size(), 10);
    }

    #[test]
    fn rejects_degenerate_sizes() {
        let config = ClassifierConfig::new(1, 2, EncoderConfig::new());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = ClassifierConfig::new(10, 0, EncoderConfig::new());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let encoder = EncoderConfig::new()
            .with_aggregation(Aggregation::SimpleRnn)
            .with_num_layers(0);
        assert!(matches!(encoder.validate(), Err(Error::Config(_))));

        assert!(ClassifierConfig::new(10, 2, EncoderConfig::new())
            .validate()
            .is_ok());
    }

    #[test]
    fn config_serializes_to_json() {
        let config = ClassifierConfig::new(
            12,
            3,
            EncoderConfig::new().with_aggregation(Aggregation::Lstm),
        )
        .with_seed(7);

        let json = serde_json::to_string(&config).unwrap();
        let restored: ClassifierConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, config);
    }
}
