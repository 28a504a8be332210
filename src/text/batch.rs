//! Batch assembly for variable-length token sequences.
//!
//! Every batch is padded to the length of its own longest sequence rather than to a global
//! fixed length, and documents are kept in the order given. Padding always uses `PAD_ID` on the
//! right, and the mask marks real positions with `true`.

use crate::error::{Error, Result};

use super::{vectorizer::TokenSequence, vocabulary::PAD_ID};

/// A rectangular id grid with a co-indexed mask of real positions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    /// Padded ids, `batch_size` rows of `max_len` columns
    ids: Vec<Vec<usize>>,

    /// `mask[i][j]` is true iff position `j` of row `i` holds a real token
    mask: Vec<Vec<bool>>,

    /// The unpadded length of each row
    lengths: Vec<usize>,

    /// The width of the grid
    max_len: usize,
}

impl Batch {
    /// Right-pad the sequences to the longest one and build the mask
    pub fn assemble(sequences: Vec<TokenSequence>) -> Result<Self> {
        if sequences.is_empty() {
            return Err(Error::config("cannot assemble an empty batch"));
        }

        let max_len = sequences.iter().map(Vec::len).max().unwrap_or(0);
        let lengths: Vec<usize> = sequences.iter().map(Vec::len).collect();

        let mask = lengths
            .iter()
            .map(|&len| (0..max_len).map(|j| j < len).collect())
            .collect();

        let ids = sequences
            .into_iter()
            .map(|mut sequence| {
                sequence.resize(max_len, PAD_ID);
                sequence
            })
            .collect();

        Ok(Self {
            ids,
            mask,
            lengths,
            max_len,
        })
    }

    /// Fail with an internal error if any real id falls outside an embedding table of
    /// `vocab_size` rows
    pub fn validate_ids(&self, vocab_size: usize) -> Result<()> {
        for (row, ids) in self.ids.iter().enumerate() {
            if let Some(id) = ids.iter().find(|id| **id >= vocab_size) {
                return Err(Error::internal(format!(
                    "token id {id} in row {row} is outside the embedding table ({vocab_size} rows)"
                )));
            }
        }

        Ok(())
    }

    /// Number of rows
    pub fn batch_size(&self) -> usize {
        self.ids.len()
    }

    /// Width of the grid (the longest sequence in the batch)
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// The padded id grid
    pub fn ids(&self) -> &[Vec<usize>] {
        &self.ids
    }

    /// The mask grid
    pub fn mask(&self) -> &[Vec<bool>] {
        &self.mask
    }

    /// The unpadded length of each row
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }
}
