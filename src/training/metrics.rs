use std::collections::VecDeque;
use std::path::PathBuf;

use serde::Serialize;

use crate::simulation::Persona;

/// Result of a single episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeResult {
    pub total_reward: f32,
    pub clicks: usize,
    /// Items recommended over the episode.
    pub impressions: usize,
    pub steps: usize,
    /// Learn steps taken during the episode.
    pub learn_steps: usize,
    /// Mean loss of those learn steps, if any.
    pub mean_loss: Option<f32>,
}

impl EpisodeResult {
    pub fn click_through_rate(&self) -> f32 {
        if self.impressions == 0 {
            0.0
        } else {
            self.clicks as f32 / self.impressions as f32
        }
    }
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    fn last_episodes(&self, last_n: usize) -> impl Iterator<Item = &EpisodeResult> {
        let n = self.episode_results.len().min(last_n);
        self.episode_results.iter().rev().take(n)
    }

    /// Mean loss over every learn step of the last N episodes.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        let (sum, steps) = self
            .last_episodes(last_n)
            .filter_map(|r| r.mean_loss.map(|loss| (loss * r.learn_steps as f32, r.learn_steps)))
            .fold((0.0, 0), |(s, n), (loss, k)| (s + loss, n + k));
        if steps == 0 {
            0.0
        } else {
            sum / steps as f32
        }
    }

    /// Average total episode reward over the last N episodes.
    pub fn average_reward(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.last_episodes(n).map(|r| r.total_reward).sum();
        sum / n as f32
    }

    /// Clicks per impression pooled over the last N episodes.
    pub fn click_through_rate(&self, last_n: usize) -> f32 {
        let (clicks, impressions) = self
            .last_episodes(last_n)
            .fold((0, 0), |(c, i), r| (c + r.clicks, i + r.impressions));
        if impressions == 0 {
            0.0
        } else {
            clicks as f32 / impressions as f32
        }
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of training and evaluating one seed.
#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub seed: u64,
    pub agent: String,
    pub persona: Persona,
    pub episodes: Vec<EpisodeResult>,
    pub learn_steps: usize,
    pub final_epsilon: f32,
    /// Mean training reward over the last `log_interval` episodes.
    pub recent_reward: f32,
    pub recent_click_through_rate: f32,
    /// Mean greedy episode reward after training.
    pub eval_reward: f32,
    /// Mean episode reward of the uniform-random baseline.
    pub random_reward: f32,
    pub step_log_path: PathBuf,
    pub episode_log_path: PathBuf,
}

impl SeedSummary {
    /// Greedy evaluation reward minus the random baseline.
    pub fn improvement(&self) -> f32 {
        self.eval_reward - self.random_reward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(total_reward: f32, clicks: usize, impressions: usize) -> EpisodeResult {
        EpisodeResult {
            total_reward,
            clicks,
            impressions,
            steps: 1,
            learn_steps: 0,
            mean_loss: None,
        }
    }

    fn learning_episode(losses: &[f32]) -> EpisodeResult {
        EpisodeResult {
            learn_steps: losses.len(),
            mean_loss: Some(losses.iter().sum::<f32>() / losses.len() as f32),
            ..episode(0.0, 0, 1)
        }
    }

    #[test]
    fn test_average_loss() {
        let mut m = TrainingMetrics::new();
        m.record_episode(learning_episode(&[1.0]));
        m.record_episode(learning_episode(&[3.0]));
        assert!((m.average_loss(10) - 2.0).abs() < 1e-6);
        assert!((m.average_loss(1) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_average_loss_covers_every_update_in_window() {
        let mut m = TrainingMetrics::with_capacity(1);
        m.record_episode(learning_episode(&[9.0]));
        m.record_episode(learning_episode(&[1.0, 2.0, 3.0, 4.0]));
        assert!((m.average_loss(1) - 2.5).abs() < 1e-6);
        assert!((m.average_loss(usize::MAX) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_average_loss_weights_by_learn_steps() {
        let mut m = TrainingMetrics::with_capacity(3);
        m.record_episode(learning_episode(&[1.0, 2.0, 3.0]));
        m.record_episode(episode(0.0, 0, 1));
        m.record_episode(learning_episode(&[6.0]));
        // (1 + 2 + 3 + 6) / 4, the episode without learning adds nothing
        assert!((m.average_loss(3) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_average_reward_window() {
        let mut m = TrainingMetrics::new();
        m.record_episode(episode(10.0, 0, 5));
        m.record_episode(episode(2.0, 0, 5));
        m.record_episode(episode(4.0, 0, 5));
        assert!((m.average_reward(2) - 3.0).abs() < 1e-6);
        assert!((m.average_reward(10) - 16.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_click_through_rate_pools_impressions() {
        let mut m = TrainingMetrics::new();
        m.record_episode(episode(0.0, 1, 10));
        m.record_episode(episode(0.0, 3, 10));
        assert!((m.click_through_rate(10) - 0.2).abs() < 1e-6);
        assert_eq!(episode(0.0, 0, 0).click_through_rate(), 0.0);
    }

    #[test]
    fn test_empty_metrics_are_zero() {
        let m = TrainingMetrics::default();
        assert_eq!(m.average_loss(5), 0.0);
        assert_eq!(m.average_reward(5), 0.0);
        assert_eq!(m.click_through_rate(5), 0.0);
    }

    #[test]
    fn test_window_capacity_keeps_lifetime_count() {
        let mut m = TrainingMetrics::with_capacity(2);
        for i in 0..5 {
            m.record_episode(episode(i as f32, 0, 1));
        }
        assert_eq!(m.total_episodes(), 5);
        assert!((m.average_reward(100) - 3.5).abs() < 1e-6);
    }
}
