use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use rand::SeedableRng;

use super::agent::Agent;
use crate::env::{CandidateSet, SlateItem};
use crate::error::TrainingError;

/// `min(max_recs, n)` distinct candidates drawn uniformly.
pub(crate) fn random_slate(
    rng: &mut StdRng,
    candidates: &CandidateSet,
    max_recs: usize,
) -> Vec<SlateItem> {
    let items: Vec<SlateItem> = candidates.iter().map(|(item, _)| item).collect();
    let k = max_recs.min(items.len());
    index::sample(rng, items.len(), k)
        .iter()
        .map(|i| items[i].clone())
        .collect()
}

/// An agent that recommends uniformly at random.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        RandomAgent {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomAgent {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "Random"
    }

    fn select_action(
        &mut self,
        _user_state: &[f32],
        candidates: &[Vec<f32>],
        _training: bool,
    ) -> Result<usize, TrainingError> {
        if candidates.is_empty() {
            return Err(TrainingError::EmptyCandidates);
        }
        Ok(self.rng.random_range(0..candidates.len()))
    }

    fn select_slate(
        &mut self,
        _user_state: &[f32],
        candidates: &CandidateSet,
        max_recs: usize,
        _training: bool,
    ) -> Result<Vec<SlateItem>, TrainingError> {
        Ok(random_slate(&mut self.rng, candidates, max_recs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Content;
    use std::collections::HashSet;

    fn candidates(n: usize) -> CandidateSet {
        let mut set = CandidateSet::new();
        set.insert(
            "news",
            (0..n)
                .map(|i| Content {
                    id: i as u64,
                    content_type: "news".to_string(),
                    embedding: vec![0.0; 2],
                })
                .collect(),
        );
        set
    }

    #[test]
    fn test_random_slate_distinct_and_sized() {
        let mut agent = RandomAgent::with_seed(1);
        let set = candidates(10);
        for _ in 0..50 {
            let slate = agent.select_slate(&[], &set, 4, true).unwrap();
            assert_eq!(slate.len(), 4);
            let unique: HashSet<_> = slate.iter().collect();
            assert_eq!(unique.len(), 4);
            assert!(slate.iter().all(|item| set.get(item).is_some()));
        }
    }

    #[test]
    fn test_slate_capped_by_candidate_count() {
        let mut agent = RandomAgent::with_seed(2);
        let slate = agent.select_slate(&[], &candidates(3), 5, true).unwrap();
        assert_eq!(slate.len(), 3);
    }

    #[test]
    fn test_empty_candidates_give_empty_slate() {
        let mut agent = RandomAgent::with_seed(3);
        let slate = agent.select_slate(&[], &CandidateSet::new(), 5, true).unwrap();
        assert!(slate.is_empty());
    }

    #[test]
    fn test_select_action_in_range() {
        let mut agent = RandomAgent::new();
        let cands = vec![vec![0.0]; 7];
        for _ in 0..100 {
            let action = agent.select_action(&[], &cands, false).unwrap();
            assert!(action < 7);
        }
        assert!(matches!(
            agent.select_action(&[], &[], false),
            Err(TrainingError::EmptyCandidates)
        ));
    }

    #[test]
    fn test_random_agent_name() {
        assert_eq!(RandomAgent::new().name(), "Random");
    }
}
