use burn::{
    module::{Module, Param},
    tensor::{backend::Backend, module::embedding, Int, Tensor},
};

use crate::utils::tensors::param;

/// A lookup table mapping token ids to dense vectors
#[derive(Module, Debug)]
pub struct TokenEmbedding<B: Backend> {
    /// The `[vocab_size, embed_dim]` table
    pub weight: Param<Tensor<B, 2>>,
}

impl<B: Backend> TokenEmbedding<B> {
    /// Build the table from row-major host values
    pub fn from_table(
        table: Vec<f32>,
        vocab_size: usize,
        embed_dim: usize,
        device: &B::Device,
    ) -> Self {
        Self {
            weight: param(table, [vocab_size, embed_dim], device),
        }
    }

    /// Number of rows in the table
    pub fn num_embeddings(&self) -> usize {
        self.weight.val().dims()[0]
    }

    /// Look up `[batch, seq_len]` ids, returning `[batch, seq_len, embed_dim]`
    pub fn forward(&self, ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        embedding(self.weight.val(), ids)
    }
}
