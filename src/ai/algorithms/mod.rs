mod dqn;

use burn::backend::{Autodiff, NdArray};

pub use dqn::{td_loss, DqnAgent};

use crate::ai::agent::Agent;
use crate::ai::networks::{DuelingQNetworkConfig, QNetworkConfig};
use crate::config::{AgentKind, ExperimentConfig};

pub type InferBackend = NdArray<f32>;
pub type TrainBackend = Autodiff<InferBackend>;

/// Build the agent named by `config.agent.kind`, seeded with `seed`.
pub fn build_agent(config: &ExperimentConfig, seed: u64) -> Box<dyn Agent> {
    let device = Default::default();
    let params = config.agent.params.clone();
    let user_dim = config.embedder.params.user_dim;
    let content_dim = config.embedder.params.content_dim;
    let capacity = config.replay.capacity;

    match config.agent.kind {
        AgentKind::Dqn => {
            let net = QNetworkConfig::new(user_dim, content_dim, params.hidden_dim)
                .init::<TrainBackend>(&device);
            Box::new(DqnAgent::new(net, params, capacity, seed, "DQN"))
        }
        AgentKind::DuelingDqn => {
            let net = DuelingQNetworkConfig::new(user_dim, content_dim, params.hidden_dim)
                .init::<TrainBackend>(&device);
            Box::new(DqnAgent::new(net, params, capacity, seed, "DuelingDQN"))
        }
    }
}
