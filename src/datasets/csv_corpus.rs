use std::path::Path;

use async_trait::async_trait;
use burn::data::dataset::{self, Dataset as _, InMemDataset};

use crate::utils::files::read_lines;

use super::{distinct_labels, Document, LoadableDataset};

/// The name of the CSV dataset
pub static DATASET: &str = "csv";

/// An optional file listing the class labels one per line, in id order
pub static LABELS_FILE: &str = "labels.txt";

/// A corpus read from `{data_dir}/{mode}.csv` files with `text` and `label` columns
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Document>,

    /// Class labels in id order
    labels: Vec<String>,
}

/// Implement the Dataset trait for CSV corpora
impl dataset::Dataset<Document> for Dataset {
    /// Returns a specific item from the dataset
    fn get(&self, index: usize) -> Option<Document> {
        self.dataset.get(index)
    }

    /// Returns the length of the dataset
    fn len(&self) -> usize {
        self.dataset.len()
    }
}

#[async_trait]
impl LoadableDataset<Document> for Dataset {
    /// Constructs the dataset for a mode (either "train" or "test"). Labels come from
    /// `labels.txt` next to the CSV files when present, otherwise from the order of first
    /// appearance in the split.
    async fn load(data_dir: &str, mode: &str) -> std::io::Result<Self> {
        let reader = csv::ReaderBuilder::new();

        let dataset: InMemDataset<Document> =
            InMemDataset::from_csv(format!("{}/{}.csv", data_dir, mode), &reader)?;

        let labels_file = Path::new(data_dir).join(LABELS_FILE);

        let labels = if labels_file.exists() {
            read_lines(labels_file)
                .await?
                .into_iter()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect()
        } else {
            let items: Vec<Document> = dataset.iter().collect();
            distinct_labels(items.iter().map(|item| item.label.as_str()))
        };

        log::info!(
            "Loaded {} {} documents with {} labels from {}",
            dataset.len(),
            mode,
            labels.len(),
            data_dir
        );

        Ok(Self { dataset, labels })
    }

    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use burn::data::dataset::Dataset as _;
    use pretty_assertions::assert_eq;

    use super::*;

    const TRAIN_CSV: &str = "text,label\n\
        \"great film, loved it\",positive\n\
        terrible food,negative\n\
        wonderful staff,positive\n";

    #[tokio::test]
    async fn reads_documents_and_discovers_labels() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("train.csv"), TRAIN_CSV).unwrap();

        let data_dir = dir.path().to_str().unwrap();
        let dataset = Dataset::load(data_dir, "train").await.unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(
            dataset.get(0),
            Some(Document::new(
                "great film, loved it".to_string(),
                "positive".to_string()
            ))
        );
        assert_eq!(dataset.labels(), vec!["positive", "negative"]);
    }

    #[tokio::test]
    async fn labels_file_fixes_the_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("train.csv"), TRAIN_CSV).unwrap();
        fs::write(dir.path().join(LABELS_FILE), "negative\npositive\n\n").unwrap();

        let data_dir = dir.path().to_str().unwrap();
        let dataset = Dataset::load(data_dir, "train").await.unwrap();

        assert_eq!(dataset.labels(), vec!["negative", "positive"]);
    }

    #[tokio::test]
    async fn missing_split_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(Dataset::load(dir.path().to_str().unwrap(), "test")
            .await
            .is_err());
    }
}
