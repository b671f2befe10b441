use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Fully-connected action-value network.
///
/// ```text
/// Input:  [batch, input_size]
/// FC1:    input_size -> hidden, ReLU
/// FC2:    hidden -> hidden, ReLU
/// FC3:    hidden -> num_actions  (one Q-value per action)
/// ```
#[derive(Module, Debug)]
pub struct ValueNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct ValueNetworkConfig {
    pub input_size: usize,
    pub num_actions: usize,
    #[config(default = 128)]
    pub hidden_size: usize,
}

impl ValueNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ValueNetwork<B> {
        ValueNetwork {
            fc1: LinearConfig::new(self.input_size, self.hidden_size).init(device),
            fc2: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            fc3: LinearConfig::new(self.hidden_size, self.num_actions).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> ValueNetwork<B> {
    /// Forward pass: input [batch, input_size] -> output [batch, num_actions].
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.fc1.forward(input));
        let x = self.relu.forward(self.fc2.forward(x));
        self.fc3.forward(x)
    }
}
