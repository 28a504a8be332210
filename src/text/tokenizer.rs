//! The fixed tokenization rule shared by the vocabulary builder and the vectorizer.
//!
//! Text is lowercased (Unicode-aware), then split on every run of characters that are not
//! alphanumeric. Empty pieces are dropped, so punctuation and whitespace never produce tokens.
//! Because `<` and `>` are separators, the reserved `<pad>` and `<unk>` entries can never be
//! produced from input text.

/// Split text into lowercase alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}
