use std::{collections::HashMap, path::Path};

use crate::{
    error::{Error, Result},
    utils::files::read_lines,
};

use super::EmbeddingProvider;

/// An in-memory table of pre-trained word vectors
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WordVectors {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl WordVectors {
    /// Parse lines of the form `token v1 v2 ... vn`.
    ///
    /// A word2vec-style `count dimension` header line is skipped. Every vector must have the
    /// same length as the first one.
    pub fn parse<I, S>(lines: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dimension = None;
        let mut vectors = HashMap::new();

        for (number, line) in lines.into_iter().enumerate() {
            let mut fields = line.as_ref().split_whitespace();

            let Some(token) = fields.next() else {
                continue;
            };

            let values = fields
                .map(str::parse::<f32>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::config(format!("line {}: {}", number + 1, e)))?;

            if number == 0 && values.len() == 1 && token.parse::<usize>().is_ok() {
                continue;
            }

            match dimension {
                None => dimension = Some(values.len()),
                Some(expected) if expected != values.len() => {
                    return Err(Error::config(format!(
                        "line {}: expected {} values for '{}', found {}",
                        number + 1,
                        expected,
                        token,
                        values.len()
                    )));
                }
                Some(_) => {}
            }

            // Lookups are lowercase, so an exactly lowercase row wins over cased variants
            let key = token.to_lowercase();

            if key == token {
                vectors.insert(key, values);
            } else {
                vectors.entry(key).or_insert(values);
            }
        }

        Ok(Self {
            dimension: dimension.unwrap_or(0),
            vectors,
        })
    }

    /// Read and parse a word-vector text file
    pub async fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let lines = read_lines(path)
            .await
            .map_err(|e| anyhow!("Unable to read word vectors from {}: {}", path.display(), e))?;

        let vectors = Self::parse(lines)?;

        log::info!(
            "Loaded {} word vectors of dimension {} from {}",
            vectors.len(),
            vectors.dimension,
            path.display()
        );

        Ok(vectors)
    }

    /// The number of tokens with a vector
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether no vectors were loaded
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl EmbeddingProvider for WordVectors {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn lookup(&self, token: &str) -> Option<&[f32]> {
        self.vectors.get(token).map(Vec::as_slice)
    }
}
