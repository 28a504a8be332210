use async_trait::async_trait;
use burn::data::dataset::{self, InMemDataset};

use super::{Document, LoadableDataset};

/// The name of the toy dataset
pub static DATASET: &str = "toy";

/// The class labels, negative first
pub static LABELS: [&str; 2] = ["negative", "positive"];

static TRAIN: &[(&str, &str)] = &[
    ("what a wonderful and delightful film", "positive"),
    ("the food was terrible and cold", "negative"),
    ("i loved every minute of it", "positive"),
    ("awful service and rude staff", "negative"),
    ("a great day with great friends", "positive"),
    ("boring plot and terrible acting", "negative"),
    ("the staff were friendly and helpful", "positive"),
    ("i hated the ending it was awful", "negative"),
    ("delightful music and a wonderful cast", "positive"),
    ("cold coffee and a rude waiter", "negative"),
    ("great value would happily return", "positive"),
    ("never again a boring waste of time", "negative"),
    ("helpful advice and a friendly smile", "positive"),
    ("terrible noise and awful smell", "negative"),
    ("loved the wonderful views", "positive"),
    ("rude and boring from start to finish", "negative"),
];

static TEST: &[(&str, &str)] = &[
    ("a wonderful friendly place", "positive"),
    ("awful food and rude people", "negative"),
    ("great film i loved it", "positive"),
    ("boring and terrible", "negative"),
];

/// Struct for the toy dataset
pub struct Dataset {
    /// Underlying In-Memory dataset
    dataset: InMemDataset<Document>,
}

/// Implement the Dataset trait for the toy dataset
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

impl Dataset {
    /// The training split
    pub fn train() -> Self {
        Self::from_rows(TRAIN)
    }

    /// The held-out split
    pub fn test() -> Self {
        Self::from_rows(TEST)
    }

    fn from_rows(rows: &[(&str, &str)]) -> Self {
        let items = rows
            .iter()
            .map(|(text, label)| Document::new(text.to_string(), label.to_string()))
            .collect();

        Self {
            dataset: InMemDataset::new(items),
        }
    }
}

#[async_trait]
impl LoadableDataset<Document> for Dataset {
    /// The toy corpus is compiled in, so `data_dir` is ignored
    async fn load(_data_dir: &str, mode: &str) -> std::io::Result<Self> {
        match mode {
            "train" => Ok(Self::train()),
            "test" => Ok(Self::test()),
            _ => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("the {DATASET} dataset has no {mode} split"),
            )),
        }
    }

    fn labels(&self) -> Vec<String> {
        LABELS.iter().map(|label| label.to_string()).collect()
    }
}
