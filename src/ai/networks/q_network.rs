use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

use super::QValueModel;

/// Pairwise Q-network.
///
/// ```text
/// Input:  user_state [batch, user_dim] ++ content [batch, content_dim]
/// FC1:    user_dim + content_dim -> hidden, ReLU
/// FC2:    hidden -> hidden, ReLU
/// Out:    hidden -> 1  (Q(s, c))
/// ```
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    out: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct QNetworkConfig {
    pub user_dim: usize,
    pub content_dim: usize,
    pub hidden_dim: usize,
}

impl QNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            fc1: LinearConfig::new(self.user_dim + self.content_dim, self.hidden_dim).init(device),
            fc2: LinearConfig::new(self.hidden_dim, self.hidden_dim).init(device),
            out: LinearConfig::new(self.hidden_dim, 1).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> QNetwork<B> {
    pub fn forward(&self, user_states: Tensor<B, 2>, contents: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = Tensor::cat(vec![user_states, contents], 1);
        let x = self.relu.forward(self.fc1.forward(x));
        let x = self.relu.forward(self.fc2.forward(x));
        self.out.forward(x)
    }
}

impl<B: Backend> QValueModel<B> for QNetwork<B> {
    fn q_values(&self, user_states: Tensor<B, 2>, contents: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward(user_states, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_network_output_shape() {
        let device = Default::default();
        let network = QNetworkConfig::new(4, 6, 16).init::<TestBackend>(&device);

        let states = Tensor::zeros([3, 4], &device);
        let contents = Tensor::zeros([3, 6], &device);
        let output = network.forward(states, contents);
        assert_eq!(output.shape().dims, [3, 1]);
    }

    #[test]
    fn test_network_single_pair() {
        let device = Default::default();
        let network = QNetworkConfig::new(2, 2, 8).init::<TestBackend>(&device);

        let output = network.q_values(Tensor::ones([1, 2], &device), Tensor::ones([1, 2], &device));
        assert_eq!(output.shape().dims, [1, 1]);
    }
}
