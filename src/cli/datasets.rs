use std::fmt::Display;

use crate::datasets::{csv_corpus, toy};

/// The Dataset enum
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Dataset {
    /// The built-in toy corpus
    Toy,

    /// `train.csv` / `test.csv` files in the data directory
    Csv,
}

impl TryFrom<&str> for Dataset {
    type Error = DatasetError;

    /// Try to convert a string to a Dataset
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let name = value.to_lowercase();

        if name == toy::DATASET {
            Ok(Dataset::Toy)
        } else if name == csv_corpus::DATASET {
            Ok(Dataset::Csv)
        } else {
            Err(Self::Error::Unknown(value.to_string()))
        }
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dataset::Toy => toy::DATASET,
            Dataset::Csv => csv_corpus::DATASET,
        };

        write!(f, "{}", name)
    }
}

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// No dataset found for the given string
    #[error("no dataset found for {0}")]
    Unknown(String),
}
