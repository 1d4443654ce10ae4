//! Training infrastructure: replay buffer, episode runner, rolling metrics,
//! and the multi-seed trainer.

pub mod episode;
pub mod metrics;
pub mod replay_buffer;
pub mod trainer;

pub use episode::{derive_seed, run_episode, EpisodeTrace, StepRecord};
pub use metrics::{EpisodeResult, SeedSummary, TrainingMetrics};
pub use replay_buffer::ReplayBuffer;
pub use trainer::{ClientFactory, Trainer};
