//! Fixed-width document vectors over a vocabulary: multi-hot, counts and TF-IDF.
//!
//! TF-IDF uses the raw term count as `tf` and `idf = ln(1 + N / (1 + df))`, where `N` is the
//! number of fitted documents and `df` the number of them containing the term. Padding never
//! contributes to any vector.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::vocabulary::PAD_ID;

/// How token occurrences are turned into vector entries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputMode {
    /// 1.0 if the token occurs at all
    MultiHot,

    /// Number of occurrences
    Count,

    /// Count weighted by inverse document frequency
    TfIdf,
}

/// Turns token sequences into `vocab_size`-wide vectors
#[derive(Clone, Debug, PartialEq)]
pub struct BagOfWords {
    vocab_size: usize,
    mode: OutputMode,

    /// Per-id weights, only present for TF-IDF once fitted
    idf: Option<Vec<f32>>,
}

impl BagOfWords {
    /// Create a vectorizer for a vocabulary of `vocab_size` ids
    pub fn new(vocab_size: usize, mode: OutputMode) -> Self {
        Self {
            vocab_size,
            mode,
            idf: None,
        }
    }

    /// The configured output mode
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// The fitted inverse document frequencies, if any
    pub fn idf(&self) -> Option<&[f32]> {
        self.idf.as_deref()
    }

    /// Learn document frequencies from a corpus. Required before TF-IDF transforms, harmless
    /// for the other modes.
    pub fn fit(mut self, documents: &[Vec<usize>]) -> Result<Self> {
        if documents.is_empty() {
            return Err(Error::config("cannot fit document frequencies on an empty corpus"));
        }

        let mut document_frequency = vec![0usize; self.vocab_size];

        for document in documents {
            let mut seen = vec![false; self.vocab_size];

            for &id in document {
                let slot = seen
                    .get_mut(id)
                    .ok_or_else(|| Self::out_of_range(id, self.vocab_size))?;

                if id != PAD_ID && !*slot {
                    *slot = true;
                    document_frequency[id] += 1;
                }
            }
        }

        let n = documents.len() as f32;
        let idf = document_frequency
            .into_iter()
            .map(|df| (1.0 + n / (1.0 + df as f32)).ln())
            .collect();

        self.idf = Some(idf);

        Ok(self)
    }

    /// Vectorize one token sequence
    pub fn transform(&self, document: &[usize]) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.vocab_size];

        for &id in document {
            if id >= self.vocab_size {
                return Err(Self::out_of_range(id, self.vocab_size));
            }

            if id != PAD_ID {
                vector[id] += 1.0;
            }
        }

        match self.mode {
            OutputMode::Count => {}
            OutputMode::MultiHot => vector.iter_mut().for_each(|v| *v = v.min(1.0)),
            OutputMode::TfIdf => {
                let idf = self.idf.as_ref().ok_or_else(|| {
                    Error::config("TF-IDF output requires fitting document frequencies first")
                })?;

                vector.iter_mut().zip(idf).for_each(|(v, w)| *v *= w);
            }
        }

        Ok(vector)
    }

    /// Vectorize a set of token sequences
    pub fn transform_all(&self, documents: &[Vec<usize>]) -> Result<Vec<Vec<f32>>> {
        documents.iter().map(|d| self.transform(d)).collect()
    }

    fn out_of_range(id: usize, vocab_size: usize) -> Error {
        Error::internal(format!(
            "token id {id} is outside the vocabulary ({vocab_size} entries)"
        ))
    }
}
