use serde::{Serialize, Deserialize};
use tracing::info;

use crate::activation::activation::Activation;
use crate::error::{Error, Result};

/// Dimensions of one layer in a network specification.
///
/// Fields:
/// - `input_count`  — values fed into the layer (the previous layer's output
///                    count, or the raw input length for the first layer)
/// - `output_count` — number of neurons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub input_count: usize,
    pub output_count: usize,
}

/// Architecture of a network: ordered layer dimensions (input → output) and
/// the activation shared by every layer.
///
/// A spec is needed both to build a fresh network and to validate a
/// parameter stream, which carries no header of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name.
    pub name: String,
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub activation: Activation,
}

impl NetworkSpec {
    /// Builds a chain from a list of widths: `[2, 3, 2]` is a 2→3 layer
    /// followed by a 3→2 layer.
    pub fn from_dims(name: &str, dims: &[usize], activation: Activation) -> NetworkSpec {
        let layers = dims.windows(2)
            .map(|pair| LayerSpec { input_count: pair[0], output_count: pair[1] })
            .collect();
        NetworkSpec { name: name.to_owned(), layers, activation }
    }

    /// 28×28 grayscale digits: 784 → 16 → 16 → 10, sigmoid.
    pub fn mnist() -> NetworkSpec {
        NetworkSpec::from_dims("mnist", &[28 * 28, 16, 16, 10], Activation::Sigmoid)
    }

    /// Checks that there is at least one layer, that no layer is empty, and
    /// that every layer's output count equals the next layer's input count.
    pub fn validate(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::InvalidTopology("network has no layers".to_owned()));
        }

        for (i, layer) in self.layers.iter().enumerate() {
            if layer.input_count == 0 || layer.output_count == 0 {
                return Err(Error::InvalidTopology(format!(
                    "layer {} has zero-sized dimensions {}x{}",
                    i, layer.input_count, layer.output_count
                )));
            }
        }

        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].output_count != pair[1].input_count {
                return Err(Error::InvalidTopology(format!(
                    "layer {} outputs {} values but layer {} expects {} inputs",
                    i, pair[0].output_count, i + 1, pair[1].input_count
                )));
            }
        }

        Ok(())
    }

    /// Raw input length of the network.
    pub fn input_count(&self) -> Option<usize> {
        self.layers.first().map(|l| l.input_count)
    }

    /// Number of output neurons, i.e. of classes.
    pub fn output_count(&self) -> Option<usize> {
        self.layers.last().map(|l| l.output_count)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        info!(path, layers = self.layers.len(), "saved network spec");
        Ok(())
    }

    /// Deserializes and validates a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let spec: NetworkSpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        info!(path, layers = spec.layers.len(), "loaded network spec");
        Ok(spec)
    }
}
