use std::{collections::BTreeMap, fmt::Debug};

use burn::{
    data::dataloader,
    tensor::{backend::Backend, Int, Tensor},
};
use derive_new::new;

use crate::{
    error::{Error, Result},
    text::{Batch, Vectorizer},
    utils::{
        classes::label2id,
        tensors::{class_ids, id_grid, mask_grid},
    },
};

use super::Item;

/// An inference batch for text classification
#[derive(Debug, Clone, new)]
pub struct Infer<B: Backend> {
    /// Token ids as a 2D tensor: [batch_size, max_len]
    pub tokens: Tensor<B, 2, Int>,

    /// 1.0 at real positions and 0.0 at padding: [batch_size, max_len]
    pub mask: Tensor<B, 2>,
}

/// A training batch for text classification
#[derive(Clone, Debug, new)]
pub struct Train<B: Backend> {
    /// Classifier input
    pub input: Infer<B>,

    /// Class ids for the batch
    pub targets: Tensor<B, 1, Int>,
}

/// Struct for batching text classification items
#[derive(Clone)]
pub struct Batcher<B: Backend> {
    /// Text to token id conversion
    pub vectorizer: Vectorizer,

    /// A mapping from class name labels to class ids
    pub label2id: BTreeMap<String, usize>,

    /// Device on which to perform computation (e.g., CPU or CUDA device)
    pub device: B::Device,
}

impl<B: Backend> Batcher<B> {
    /// Creates a new batcher
    pub fn new(vectorizer: Vectorizer, labels: &[String], device: B::Device) -> Self {
        Self {
            vectorizer,
            label2id: label2id(labels),
            device,
        }
    }

    /// Look up the class id of a label
    pub fn class_id(&self, label: &str) -> Result<usize> {
        self.label2id
            .get(label.trim())
            .copied()
            .ok_or_else(|| Error::config(format!("unknown class label: {label}")))
    }

    /// Vectorize, pad and mask a batch of texts
    pub fn infer_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Infer<B>> {
        let batch = Batch::assemble(self.vectorizer.vectorize_all(texts))?;
        batch.validate_ids(self.vectorizer.vocabulary().len())?;

        Ok(Infer {
            tokens: id_grid(batch.ids(), batch.max_len(), &self.device),
            mask: mask_grid(batch.mask(), batch.max_len(), &self.device),
        })
    }

    /// Like `infer_batch`, with the class ids of each item as targets
    pub fn train_batch<I: Item>(&self, items: &[I]) -> Result<Train<B>> {
        let targets = items
            .iter()
            .map(|item| self.class_id(item.class_label()))
            .collect::<Result<Vec<_>>>()?;

        let texts: Vec<&str> = items.iter().map(|item| item.input()).collect();

        Ok(Train {
            input: self.infer_batch(&texts)?,
            targets: class_ids(&targets, &self.device),
        })
    }
}

/// Implement Batcher trait for Batcher struct for inference
impl<B: Backend> dataloader::batcher::Batcher<String, Infer<B>> for Batcher<B> {
    /// Collects a vector of texts into an inference batch.
    ///
    /// # Panics
    ///
    /// On an empty batch, which data loaders never produce; `infer_batch` is the fallible form.
    fn batch(&self, items: Vec<String>) -> Infer<B> {
        self.infer_batch(&items).expect("unable to batch texts")
    }
}

/// Implement Batcher trait for Batcher struct for training
impl<B: Backend, I: Item> dataloader::batcher::Batcher<I, Train<B>> for Batcher<B> {
    /// Collects a vector of text classification items into a training batch.
    ///
    /// # Panics
    ///
    /// On a label the batcher does not know. Callers check every label with `class_id` before
    /// handing a dataset to a data loader, as `evaluate` does; `train_batch` is the fallible
    /// form.
    fn batch(&self, items: Vec<I>) -> Train<B> {
        self.train_batch(&items).expect("unable to batch items")
    }
}
