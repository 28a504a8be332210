use std::fmt::Display;

use crate::models::{Aggregation, EncoderConfig};

/// Model Variants
/// --------------

/// Mean pooling over the embeddings
pub static MEAN: &str = "mean";

/// Sum pooling over the embeddings (a bag of embeddings)
pub static BAG: &str = "bag";

/// A single simple recurrent layer
pub static RNN: &str = "rnn";

/// A single LSTM layer
pub static LSTM: &str = "lstm";

/// A bidirectional LSTM layer
pub static BILSTM: &str = "bilstm";

/// Two stacked LSTM layers
pub static STACKED_LSTM: &str = "stacked-lstm";

/// All available model presets
pub static ALL_MODELS: &[&str; 6] = &[MEAN, BAG, RNN, LSTM, BILSTM, STACKED_LSTM];

/// Available Models
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Model {
    /// Mean pooling
    Mean,

    /// Sum pooling
    Bag,

    /// Simple recurrent network
    Rnn,

    /// LSTM
    Lstm,

    /// Bidirectional LSTM
    BiLstm,

    /// Stacked LSTM
    StackedLstm,
}

impl Model {
    /// The encoder settings of this preset
    pub fn encoder(&self) -> EncoderConfig {
        let config = EncoderConfig::new();

        match self {
            Model::Mean => config.with_aggregation(Aggregation::Mean),
            Model::Bag => config.with_aggregation(Aggregation::Sum),
            Model::Rnn => config.with_aggregation(Aggregation::SimpleRnn),
            Model::Lstm => config.with_aggregation(Aggregation::Lstm),
            Model::BiLstm => config
                .with_aggregation(Aggregation::Lstm)
                .with_bidirectional(true),
            Model::StackedLstm => config
                .with_aggregation(Aggregation::Lstm)
                .with_num_layers(2),
        }
    }
}

impl TryFrom<&str> for Model {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let model = match value.to_lowercase().as_str() {
            "mean" => Model::Mean,
            "bag" => Model::Bag,
            "rnn" => Model::Rnn,
            "lstm" => Model::Lstm,
            "bilstm" => Model::BiLstm,
            "stacked-lstm" => Model::StackedLstm,
            _ => return Err(ModelError::Unknown(value.to_string())),
        };

        Ok(model)
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Model::Mean => MEAN,
            Model::Bag => BAG,
            Model::Rnn => RNN,
            Model::Lstm => LSTM,
            Model::BiLstm => BILSTM,
            Model::StackedLstm => STACKED_LSTM,
        };

        write!(f, "{}", name)
    }
}

/// Model Error
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    /// No model found for the given string
    #[error("no model found for {0} (expected one of: {})", ALL_MODELS.join(", "))]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::cli::pipelines::Pipeline;

    use super::*;

    #[test]
    fn names_round_trip() {
        for name in ALL_MODELS {
            let model = Model::try_from(*name).unwrap();

            assert_eq!(model.to_string(), *name);
            assert!(model.encoder().validate().is_ok());
        }

        assert!(Model::try_from("transformer").is_err());
    }

    #[test]
    fn presets_pick_the_aggregation() {
        assert_eq!(Model::Bag.encoder().aggregation, Aggregation::Sum);
        assert!(Model::BiLstm.encoder().bidirectional);
        assert_eq!(Model::StackedLstm.encoder().num_layers, 2);
        assert_eq!(
            Pipeline::TextClassification.default_model(),
            Model::Lstm
        );
    }
}
