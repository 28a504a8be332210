use std::{collections::BTreeMap, hash::Hash};

/// Invert a map by swapping keys and values
pub fn invert_map<K, V, MK, MV>(original: MK) -> MV
where
    K: Ord + Hash + Eq,
    V: Ord + Hash + Eq + Clone,
    MK: IntoIterator<Item = (K, V)>,
    MV: FromIterator<(V, K)>,
{
    original
        .into_iter()
        .map(|(key, value)| (value, key))
        .collect()
}

/// Number an ordered list of class labels, trimming surrounding whitespace
pub fn id2label(labels: &[String]) -> BTreeMap<usize, String> {
    labels
        .iter()
        .enumerate()
        .map(|(i, s)| (i, s.trim().to_string()))
        .collect()
}

/// The reverse of `id2label`, mapping class names to their ids
pub fn label2id(labels: &[String]) -> BTreeMap<String, usize> {
    invert_map(id2label(labels))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn numbers_labels_in_order() {
        let labels = vec!["negative ".to_string(), "positive".to_string()];

        assert_eq!(id2label(&labels)[&1], "positive");
        assert_eq!(label2id(&labels)["negative"], 0);
    }
}
