use super::content::{CandidateSet, Content};

/// Narrows the catalog down to the candidates the agent may recommend.
pub trait CandidateGenerator {
    fn generate(&self, user_state: &[f32], catalog: &[Content]) -> CandidateSet;
}

/// Keeps the `top_k` items of each content type by dot-product affinity with
/// the user state.
#[derive(Debug, Clone)]
pub struct TopKGenerator {
    top_k: usize,
}

impl TopKGenerator {
    pub fn new(top_k: usize) -> Self {
        TopKGenerator { top_k }
    }
}

fn affinity(user_state: &[f32], embedding: &[f32]) -> f32 {
    user_state.iter().zip(embedding).map(|(a, b)| a * b).sum()
}

impl CandidateGenerator for TopKGenerator {
    fn generate(&self, user_state: &[f32], catalog: &[Content]) -> CandidateSet {
        let mut grouped: std::collections::BTreeMap<&str, Vec<(f32, &Content)>> =
            std::collections::BTreeMap::new();
        for content in catalog {
            grouped
                .entry(content.content_type.as_str())
                .or_default()
                .push((affinity(user_state, &content.embedding), content));
        }

        let mut set = CandidateSet::new();
        for (ctype, mut scored) in grouped {
            // Stable sort: equal scores keep catalog order.
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            let kept = scored
                .into_iter()
                .take(self.top_k)
                .map(|(_, c)| c.clone())
                .collect();
            set.insert(ctype, kept);
        }
        set
    }
}
