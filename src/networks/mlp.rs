use tch::nn::{self, Module};
use tch::Tensor;

/// Two hidden ReLU layers followed by a linear output layer.
pub struct Mlp {
    pub model: nn::Sequential,
}

impl Mlp {
    pub fn new(p: &nn::Path, input_dim: i64, hidden: [i64; 2], output_dim: i64) -> Self {
        let model = nn::seq()
            .add(nn::linear(p / "l1", input_dim, hidden[0], Default::default()))
            .add_fn(|xs| xs.relu())
            .add(nn::linear(p / "l2", hidden[0], hidden[1], Default::default()))
            .add_fn(|xs| xs.relu())
            .add(nn::linear(p / "l3", hidden[1], output_dim, Default::default()));
        Mlp { model }
    }

    pub fn forward(&self, xs: &Tensor) -> Tensor {
        self.model.forward(xs)
    }
}
