//! Recommendation agents: the [`Agent`] trait, the DQN family, a random
//! baseline, and the Q-networks they train.

mod agent;
pub mod algorithms;
pub mod encoding;
mod epsilon;
pub mod networks;
mod random;

pub use agent::{Agent, Transition, UpdateMetrics};
pub use algorithms::{build_agent, td_loss, DqnAgent, InferBackend, TrainBackend};
pub use epsilon::EpsilonSchedule;
pub use networks::{DuelingQNetwork, DuelingQNetworkConfig, QNetwork, QNetworkConfig, QValueModel};
pub use random::RandomAgent;
