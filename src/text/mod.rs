/// The fixed tokenization rule
pub mod tokenizer;

/// Frequency-ranked vocabularies
pub mod vocabulary;

/// Text to token id conversion
pub mod vectorizer;

/// Padded batches with masks
pub mod batch;

/// Multi-hot, count and TF-IDF document vectors
pub mod bag_of_words;

pub use bag_of_words::{BagOfWords, OutputMode};
pub use batch::Batch;
pub use tokenizer::tokenize;
pub use vectorizer::{TokenSequence, Vectorizer};
pub use vocabulary::{
    Vocabulary, VocabularyBuilder, VocabularyFile, PAD_ID, PAD_TOKEN, UNK_ID, UNK_TOKEN,
};
