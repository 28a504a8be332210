use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    text::{Vocabulary, PAD_ID},
    utils::init::Initializer,
};

/// Word vectors read from the GloVe / word2vec text format
pub mod word_vectors;

pub use word_vectors::WordVectors;

/// A source of pre-trained vectors keyed by token
pub trait EmbeddingProvider {
    /// The length of every vector this provider returns
    fn dimension(&self) -> usize;

    /// The vector for a token, if the provider knows it
    fn lookup(&self, token: &str) -> Option<&[f32]>;
}

/// How rows are filled for tokens the provider does not know.
///
/// Zero rows contribute nothing until trained, random rows give every token a distinct
/// starting point. The padding row is always zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissPolicy {
    /// Draw the row uniformly from `[-INIT_BOUND, INIT_BOUND)`
    #[default]
    Random,

    /// Leave the row at zero
    Zero,
}

/// The range used for randomly initialised embedding rows
pub const INIT_BOUND: f32 = 0.05;

/// How much of a vocabulary a provider covered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Coverage {
    /// Rows copied from the provider
    pub hits: usize,

    /// Rows filled according to the miss policy (the padding row is not counted)
    pub misses: usize,
}

/// Build a row-major `[vocab.len(), dimension]` embedding table.
///
/// Without a provider every row except padding is random. With one, known tokens copy their
/// pre-trained vector and the rest follow `policy`.
pub fn embedding_table(
    vocab: &Vocabulary,
    dimension: usize,
    provider: Option<&dyn EmbeddingProvider>,
    policy: MissPolicy,
    init: &mut Initializer,
) -> Result<(Vec<f32>, Coverage)> {
    if let Some(provider) = provider {
        if provider.dimension() != dimension {
            return Err(Error::config(format!(
                "pre-trained vectors have {} dimensions but the embedding expects {}",
                provider.dimension(),
                dimension
            )));
        }
    }

    let mut table = Vec::with_capacity(vocab.len() * dimension);
    let mut coverage = Coverage::default();

    for (id, token) in vocab.tokens().iter().enumerate() {
        if id == PAD_ID {
            table.extend(init.constant(dimension, 0.0));
            continue;
        }

        match provider.and_then(|p| p.lookup(token)) {
            Some(vector) => {
                if vector.len() != dimension {
                    return Err(Error::config(format!(
                        "pre-trained vector for '{}' has {} values, expected {}",
                        token,
                        vector.len(),
                        dimension
                    )));
                }

                coverage.hits += 1;
                table.extend_from_slice(vector);
            }
            None => {
                coverage.misses += 1;

                let row = match (provider, policy) {
                    (Some(_), MissPolicy::Zero) => init.constant(dimension, 0.0),
                    _ => init.uniform(dimension, INIT_BOUND),
                };

                table.extend(row);
            }
        }
    }

    if provider.is_some() {
        log::info!(
            "Pre-trained vectors covered {} of {} tokens",
            coverage.hits,
            coverage.hits + coverage.misses
        );
    }

    Ok((table, coverage))
}
