//! Recommendation environment: content catalog, candidate generation,
//! user-state embedding, and the episodic `reset`/`step` loop.

mod candidates;
mod content;
mod embedder;
mod environment;

pub use candidates::{CandidateGenerator, TopKGenerator};
pub use content::{CandidateSet, Content, SlateItem};
pub use embedder::{project, random_catalog, DriftEmbedder, StateEmbedder};
pub use environment::{Observation, RecEnv, StepOutcome};
