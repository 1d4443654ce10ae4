mod dueling_network;
mod q_network;

use burn::prelude::*;

pub use dueling_network::{DuelingQNetwork, DuelingQNetworkConfig};
pub use q_network::{QNetwork, QNetworkConfig};

/// A network scoring (user state, content) pairs.
///
/// Both inputs are `[batch, dim]`; the output is `[batch, 1]` Q-values.
pub trait QValueModel<B: Backend>: Module<B> {
    fn q_values(&self, user_states: Tensor<B, 2>, contents: Tensor<B, 2>) -> Tensor<B, 2>;
}
