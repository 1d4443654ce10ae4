use std::collections::BTreeMap;

use serde::Serialize;

/// A recommendable item with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub id: u64,
    pub content_type: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// Position of one recommended item inside a [`CandidateSet`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlateItem {
    pub content_type: String,
    pub index: usize,
}

impl SlateItem {
    pub fn new(content_type: impl Into<String>, index: usize) -> Self {
        SlateItem {
            content_type: content_type.into(),
            index,
        }
    }
}

/// Candidates for one step, grouped by content type.
///
/// Iteration order is content type (lexicographic), then position within the
/// type, and is the order every flattened view of the set uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    by_type: BTreeMap<String, Vec<Content>>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, content_type: impl Into<String>, contents: Vec<Content>) {
        self.by_type.insert(content_type.into(), contents);
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, item: &SlateItem) -> Option<&Content> {
        self.by_type
            .get(&item.content_type)
            .and_then(|contents| contents.get(item.index))
    }

    pub fn types(&self) -> impl Iterator<Item = (&str, &[Content])> {
        self.by_type
            .iter()
            .map(|(ctype, contents)| (ctype.as_str(), contents.as_slice()))
    }

    /// Every candidate paired with its slate position.
    pub fn iter(&self) -> impl Iterator<Item = (SlateItem, &Content)> {
        self.by_type.iter().flat_map(|(ctype, contents)| {
            contents
                .iter()
                .enumerate()
                .map(move |(index, content)| (SlateItem::new(ctype.as_str(), index), content))
        })
    }

    /// Embeddings of all candidates across types, flattened.
    pub fn embeddings(&self) -> Vec<Vec<f32>> {
        self.iter().map(|(_, c)| c.embedding.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(id: u64, ctype: &str) -> Content {
        Content {
            id,
            content_type: ctype.to_string(),
            embedding: vec![id as f32, 0.0],
        }
    }

    fn sample_set() -> CandidateSet {
        let mut set = CandidateSet::new();
        set.insert("video", vec![content(10, "video"), content(11, "video")]);
        set.insert("news", vec![content(1, "news")]);
        set
    }

    #[test]
    fn test_len_counts_all_types() {
        let set = sample_set();
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
        assert!(CandidateSet::new().is_empty());
    }

    #[test]
    fn test_iter_order_is_type_then_index() {
        let set = sample_set();
        let items: Vec<SlateItem> = set.iter().map(|(item, _)| item).collect();
        assert_eq!(
            items,
            vec![
                SlateItem::new("news", 0),
                SlateItem::new("video", 0),
                SlateItem::new("video", 1),
            ]
        );
    }

    #[test]
    fn test_get_resolves_slate_items() {
        let set = sample_set();
        assert_eq!(set.get(&SlateItem::new("video", 1)).map(|c| c.id), Some(11));
        assert!(set.get(&SlateItem::new("video", 2)).is_none());
        assert!(set.get(&SlateItem::new("music", 0)).is_none());
    }

    #[test]
    fn test_embeddings_flatten_in_iteration_order() {
        let set = sample_set();
        let embs = set.embeddings();
        assert_eq!(embs, vec![vec![1.0, 0.0], vec![10.0, 0.0], vec![11.0, 0.0]]);
    }
}
