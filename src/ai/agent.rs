use crate::env::{CandidateSet, SlateItem};
use crate::error::TrainingError;

/// A single recommendation step as stored in the replay buffer.
///
/// `next_candidates` holds the embeddings of every candidate (all content
/// types) available in `next_state`; the TD target maximizes over them.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f32>,
    pub content: Vec<f32>,
    pub reward: f32,
    pub next_state: Vec<f32>,
    pub next_candidates: Vec<Vec<f32>>,
    pub done: bool,
}

/// Metrics returned from a training update.
#[derive(Debug, Clone, Default)]
pub struct UpdateMetrics {
    pub loss: f32,
    pub learn_step: usize,
    pub target_synced: bool,
}

/// Universal interface for recommendation agents.
pub trait Agent {
    /// Return the agent's display name.
    fn name(&self) -> &str;

    /// Pick one candidate index from a flat list of candidate embeddings.
    /// When `training` is true, the agent may explore; otherwise it exploits.
    fn select_action(
        &mut self,
        user_state: &[f32],
        candidates: &[Vec<f32>],
        training: bool,
    ) -> Result<usize, TrainingError>;

    /// Pick up to `max_recs` distinct candidates to recommend together.
    fn select_slate(
        &mut self,
        user_state: &[f32],
        candidates: &CandidateSet,
        max_recs: usize,
        training: bool,
    ) -> Result<Vec<SlateItem>, TrainingError>;

    /// Record a transition for later learning.
    fn store(&mut self, _transition: Transition) {}

    /// Run one learning step. `None` when there is not enough experience yet.
    fn learn(&mut self) -> Result<Option<UpdateMetrics>, TrainingError> {
        Ok(None)
    }

    /// Called once per finished training episode (epsilon decay).
    fn end_episode(&mut self) {}

    /// Current exploration rate.
    fn epsilon(&self) -> f32 {
        0.0
    }

    /// Number of learning steps taken so far.
    fn step_count(&self) -> usize {
        0
    }
}
