use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

use super::QValueModel;

/// Dueling pairwise Q-network: a state-value stream and a pair-advantage
/// stream, combined as `Q(s, c) = V(s) + A(s, c)`.
///
/// ```text
/// Value:      user_state -> hidden, ReLU -> 1
/// Advantage:  user_state ++ content -> hidden, ReLU -> hidden, ReLU -> 1
/// ```
#[derive(Module, Debug)]
pub struct DuelingQNetwork<B: Backend> {
    value_fc: Linear<B>,
    value_head: Linear<B>,
    advantage_fc1: Linear<B>,
    advantage_fc2: Linear<B>,
    advantage_head: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct DuelingQNetworkConfig {
    pub user_dim: usize,
    pub content_dim: usize,
    pub hidden_dim: usize,
}

impl DuelingQNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> DuelingQNetwork<B> {
        DuelingQNetwork {
            value_fc: LinearConfig::new(self.user_dim, self.hidden_dim).init(device),
            value_head: LinearConfig::new(self.hidden_dim, 1).init(device),
            advantage_fc1: LinearConfig::new(self.user_dim + self.content_dim, self.hidden_dim)
                .init(device),
            advantage_fc2: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            advantage_head: LinearConfig::new(self.hidden_dim, 1).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> DuelingQNetwork<B> {
    /// Returns `(q, value, advantage)`, each `[batch, 1]`.
    pub fn forward_streams(
        &self,
        user_states: Tensor<B, 2>,
        contents: Tensor<B, 2>,
    ) -> (Tensor<B, 2>, Tensor<B, 2>, Tensor<B, 2>) {
        let value = self
            .value_head
            .forward(self.relu.forward(self.value_fc.forward(user_states.clone())));

        let x = Tensor::cat(vec![user_states, contents], 1);
        let x = self.relu.forward(self.advantage_fc1.forward(x));
        let x = self.relu.forward(self.advantage_fc2.forward(x));
        let advantage = self.advantage_head.forward(x);

        (value.clone() + advantage.clone(), value, advantage)
    }

    pub fn forward(&self, user_states: Tensor<B, 2>, contents: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward_streams(user_states, contents).0
    }
}

impl<B: Backend> QValueModel<B> for DuelingQNetwork<B> {
    fn q_values(&self, user_states: Tensor<B, 2>, contents: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward(user_states, contents)
    }
}
