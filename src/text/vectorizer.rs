use std::sync::Arc;

use super::{
    tokenizer::tokenize,
    vocabulary::{Vocabulary, UNK_ID},
};

/// An ordered list of vocabulary ids representing one document
pub type TokenSequence = Vec<usize>;

/// Maps raw text to token ids using a shared, immutable vocabulary
#[derive(Clone, Debug)]
pub struct Vectorizer {
    /// The vocabulary used for lookups
    vocabulary: Arc<Vocabulary>,

    /// Optional cap on the number of tokens kept per document
    max_tokens: Option<usize>,
}

impl Vectorizer {
    /// Create a vectorizer over the given vocabulary
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            max_tokens: None,
        }
    }

    /// Keep at most `max_tokens` tokens from the start of each document
    pub fn with_max_tokens(mut self, max_tokens: Option<usize>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The vocabulary behind this vectorizer
    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    /// The per-document token cap, if any
    pub fn max_tokens(&self) -> Option<usize> {
        self.max_tokens
    }

    /// Map one document to ids. Unknown tokens become `UNK_ID`, empty text an empty sequence.
    pub fn vectorize(&self, text: &str) -> TokenSequence {
        let tokens = tokenize(text);
        let limit = self.max_tokens.unwrap_or(tokens.len());

        tokens
            .iter()
            .take(limit)
            .map(|token| self.vocabulary.id(token).unwrap_or(UNK_ID))
            .collect()
    }

    /// Map a set of documents to ids
    pub fn vectorize_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<TokenSequence> {
        texts
            .iter()
            .map(|text| self.vectorize(text.as_ref()))
            .collect()
    }

    /// Map ids back to tokens. Ids outside the vocabulary decode as `<unk>`.
    pub fn decode(&self, ids: &[usize]) -> Vec<&str> {
        let unknown = self.vocabulary.tokens()[UNK_ID].as_str();

        ids.iter()
            .map(|id| self.vocabulary.token(*id).unwrap_or(unknown))
            .collect()
    }
}
