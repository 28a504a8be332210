use async_trait::async_trait;
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::pipelines::text_classification;

/// A small built-in sentiment corpus
pub mod toy;

/// `text,label` CSV corpora on disk
pub mod csv_corpus;

/// A dataset which can be loaded
#[async_trait]
pub trait LoadableDataset<I>: burn::data::dataset::Dataset<I> {
    /// Load the split named by `mode` (either "train" or "test")
    async fn load(data_dir: &str, mode: &str) -> std::io::Result<Self>
    where
        Self: std::marker::Sized;

    /// The class labels in id order
    fn labels(&self) -> Vec<String>;
}

/// A labelled document, the row type of every provided corpus
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Document {
    /// The text for classification
    pub text: String,

    /// The class name of the text
    pub label: String,
}

impl text_classification::Item for Document {
    fn input(&self) -> &str {
        &self.text
    }

    fn class_label(&self) -> &str {
        &self.label
    }
}

/// Distinct labels in order of first appearance
pub fn distinct_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::<String>::new();

    for label in labels {
        let label = label.trim();

        if !seen.iter().any(|s| s == label) {
            seen.push(label.to_string());
        }
    }

    seen
}
