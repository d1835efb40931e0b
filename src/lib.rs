pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optim;
pub mod sample;
pub mod train;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::params::Parameters;
pub use activation::activation::Activation;
pub use layers::dense::{Layer, PassState};
pub use loss::squared_error::{one_hot, SquaredError};
pub use network::network::{argmax, Network};
pub use network::spec::{LayerSpec, NetworkSpec};
pub use optim::sgd::Sgd;
pub use sample::{LabeledSample, Sample};
pub use train::{train_loop, EpochStats, TrainConfig, TrainSummary};
