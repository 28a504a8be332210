use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::tokenizer::tokenize;

/// The id reserved for padding positions
pub const PAD_ID: usize = 0;

/// The id every out-of-vocabulary token maps to
pub const UNK_ID: usize = 1;

/// The token stored at `PAD_ID`
pub const PAD_TOKEN: &str = "<pad>";

/// The token stored at `UNK_ID`
pub const UNK_TOKEN: &str = "<unk>";

/// The current version of the vocabulary file layout
pub const VOCABULARY_SCHEMA_VERSION: u32 = 1;

/// An immutable, frequency-ranked mapping from tokens to ids.
///
/// Id 0 is always `<pad>` and id 1 is always `<unk>`. Every other id is assigned in descending
/// order of corpus frequency, with ties going to the token seen first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocabulary {
    /// Tokens in id order
    tokens: Vec<String>,

    /// Reverse lookup
    ids: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary from an id-ordered token table, validating the reserved entries
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self> {
        if tokens.len() < 2 || tokens[PAD_ID] != PAD_TOKEN || tokens[UNK_ID] != UNK_TOKEN {
            return Err(Error::config(format!(
                "vocabulary must start with {PAD_TOKEN} and {UNK_TOKEN}"
            )));
        }

        let mut ids = HashMap::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            if ids.insert(token.clone(), id).is_some() {
                return Err(Error::config(format!("duplicate vocabulary token: {token}")));
            }
        }

        Ok(Self { tokens, ids })
    }

    /// The number of entries, including the two reserved ones
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// A vocabulary always holds the reserved entries, so it is never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Look up the id of a token
    pub fn id(&self, token: &str) -> Option<usize> {
        self.ids.get(token).copied()
    }

    /// Look up the token behind an id
    pub fn token(&self, id: usize) -> Option<&str> {
        self.tokens.get(id).map(String::as_str)
    }

    /// All tokens in id order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Convert into the flat, versioned table used for persistence
    pub fn to_file(&self) -> VocabularyFile {
        VocabularyFile {
            schema_version: VOCABULARY_SCHEMA_VERSION,
            tokens: self.tokens.clone(),
        }
    }

    /// Restore a vocabulary from its persisted table
    pub fn from_file(file: VocabularyFile) -> Result<Self> {
        if file.schema_version != VOCABULARY_SCHEMA_VERSION {
            return Err(Error::config(format!(
                "unsupported vocabulary schema version {} (expected {})",
                file.schema_version, VOCABULARY_SCHEMA_VERSION
            )));
        }

        Self::from_tokens(file.tokens)
    }
}

/// The persisted form of a vocabulary: the token at index `i` has id `i`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyFile {
    /// Layout version, checked on load
    pub schema_version: u32,

    /// Tokens in id order
    pub tokens: Vec<String>,
}

/// Counts token frequencies over a corpus and emits a size-capped `Vocabulary`
#[derive(Clone, Debug)]
pub struct VocabularyBuilder {
    /// Maximum number of entries, reserved ids included
    max_size: usize,

    /// Tokens seen fewer times than this are left out
    min_frequency: usize,
}

impl VocabularyBuilder {
    /// Create a builder capped at `max_size` entries
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            min_frequency: 1,
        }
    }

    /// Leave out tokens seen fewer than `min_frequency` times
    pub fn with_min_frequency(mut self, min_frequency: usize) -> Self {
        self.min_frequency = min_frequency;
        self
    }

    /// Scan the documents once and build the vocabulary
    pub fn build<I, S>(&self, documents: I) -> Result<Vocabulary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.max_size < 2 {
            return Err(Error::config(format!(
                "maximum vocabulary size must be at least 2 to hold {PAD_TOKEN} and {UNK_TOKEN}, got {}",
                self.max_size
            )));
        }

        if self.min_frequency == 0 {
            return Err(Error::config("minimum token frequency must be at least 1"));
        }

        // (token, count) in first-seen order
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for document in documents {
            for token in tokenize(document.as_ref()) {
                match index.get(&token) {
                    Some(&position) => counts[position].1 += 1,
                    None => {
                        index.insert(token.clone(), counts.len());
                        counts.push((token, 1));
                    }
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let mut tokens = Vec::with_capacity(self.max_size.min(counts.len() + 2));
        tokens.push(PAD_TOKEN.to_string());
        tokens.push(UNK_TOKEN.to_string());

        tokens.extend(
            counts
                .into_iter()
                .filter(|(_, count)| *count >= self.min_frequency)
                .map(|(token, _)| token)
                .take(self.max_size - 2),
        );

        log::debug!("Built vocabulary with {} entries", tokens.len());

        Vocabulary::from_tokens(tokens)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn example() -> Vocabulary {
        VocabularyBuilder::new(10)
            .build(["hot dog", "dog runs", "hot day"])
            .unwrap()
    }

    #[test]
    fn ranks_by_frequency_then_first_appearance() {
        let vocab = example();

        assert_eq!(
            vocab.tokens(),
            &["<pad>", "<unk>", "hot", "dog", "runs", "day"]
        );
        assert_eq!(vocab.id("hot"), Some(2));
        assert_eq!(vocab.id("dog"), Some(3));
        assert_eq!(vocab.id("runs"), Some(4));
        assert_eq!(vocab.id("day"), Some(5));
        assert_eq!(vocab.token(PAD_ID), Some(PAD_TOKEN));
        assert_eq!(vocab.token(UNK_ID), Some(UNK_TOKEN));
    }

    #[test]
    fn size_never_exceeds_the_maximum() {
        let corpus = ["a b c d e f g h", "a b c", "a"];

        for max_size in 2..12 {
            let vocab = VocabularyBuilder::new(max_size).build(corpus).unwrap();

            assert!(vocab.len() <= max_size);
            assert_eq!(vocab.id(PAD_TOKEN), Some(PAD_ID));
            assert_eq!(vocab.id(UNK_TOKEN), Some(UNK_ID));
        }

        let vocab = VocabularyBuilder::new(3).build(corpus).unwrap();
        assert_eq!(vocab.tokens(), &["<pad>", "<unk>", "a"]);
    }

    #[test]
    fn rejects_sizes_without_room_for_reserved_ids() {
        let result = VocabularyBuilder::new(1).build(["hot dog"]);

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn min_frequency_drops_rare_tokens() {
        let vocab = VocabularyBuilder::new(10)
            .with_min_frequency(2)
            .build(["hot dog", "dog runs", "hot day"])
            .unwrap();

        assert_eq!(vocab.tokens(), &["<pad>", "<unk>", "hot", "dog"]);
    }

    #[test]
    fn empty_corpus_keeps_only_reserved_ids() {
        let vocab = VocabularyBuilder::new(10)
            .build(Vec::<String>::new())
            .unwrap();

        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn file_round_trip_and_validation() {
        let vocab = example();

        let json = serde_json::to_string(&vocab.to_file()).unwrap();
        let restored: VocabularyFile = serde_json::from_str(&json).unwrap();
        assert_eq!(Vocabulary::from_file(restored).unwrap(), vocab);

        let mut stale = vocab.to_file();
        stale.schema_version += 1;
        assert!(matches!(Vocabulary::from_file(stale), Err(Error::Config(_))));

        let mut shuffled = vocab.to_file();
        shuffled.tokens.swap(0, 2);
        assert!(matches!(
            Vocabulary::from_file(shuffled),
            Err(Error::Config(_))
        ));

        let duplicated = vec![
            PAD_TOKEN.to_string(),
            UNK_TOKEN.to_string(),
            "hot".to_string(),
            "hot".to_string(),
        ];
        assert!(matches!(
            Vocabulary::from_tokens(duplicated),
            Err(Error::Config(_))
        ));
    }
}
