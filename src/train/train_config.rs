use rand::{rngs::StdRng, SeedableRng};
use serde::{Serialize, Deserialize};

use crate::error::Result;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`        — number of batch updates; each epoch draws one batch
/// - `batch_size`    — samples per batch, drawn with replacement
/// - `learning_rate` — gradient scale of the SGD correction
/// - `eval_every`    — epochs between cost evaluations; `0` evaluates only
///                     after the last epoch
/// - `seed`          — fixes batch sampling (and initialization, when the
///                     caller builds the network from `rng()`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub eval_every: usize,
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 2000,
            batch_size: 100,
            learning_rate: 3.0,
            eval_every: 500,
            seed: None,
        }
    }
}

impl TrainConfig {
    /// Creates a `TrainConfig` with default evaluation interval and no seed.
    pub fn new(epochs: usize, batch_size: usize, learning_rate: f32) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            learning_rate,
            ..TrainConfig::default()
        }
    }

    /// Random generator for this run: seeded if `seed` is set.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Deserializes a `TrainConfig` from a JSON file; missing fields take
    /// their default values.
    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
