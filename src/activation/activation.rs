use serde::{Serialize, Deserialize};

/// Nonlinearity shared by every layer of a network.
///
/// Chosen once when the network is built and copied into each layer, so a
/// single binary can train with either variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Sigmoid,
    #[serde(rename = "relu")]
    ReLU,
}

impl Activation {
    /// Element-wise activation of a pre-activation `z`.
    pub fn function(&self, z: f32) -> f32 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-z).exp()),
            Activation::ReLU => if z > 0.0 { z } else { 0.0 },
        }
    }

    /// Derivative of the activation with respect to `z`.
    ///
    /// Sigmoid uses `σ(z)·(1 - σ(z))`. ReLU is a step; at `z == 0` it is 0.
    pub fn derivative(&self, z: f32) -> f32 {
        match self {
            Activation::Sigmoid => {
                let fz = self.function(z);
                fz * (1.0 - fz)
            }
            Activation::ReLU => if z > 0.0 { 1.0 } else { 0.0 },
        }
    }
}
