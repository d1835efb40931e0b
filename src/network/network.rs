use rand::Rng;
use tracing::debug;

use crate::{
    activation::activation::Activation,
    error::{Error, Result},
    layers::dense::Layer,
    loss::squared_error::{one_hot, SquaredError},
    network::spec::NetworkSpec,
    sample::LabeledSample,
};

/// An ordered chain of fully-connected layers.
///
/// Layer `k`'s output count always equals layer `k + 1`'s input count.
/// All per-pass buffers live in the layers and are shared between calls, so
/// a network processes one sample at a time.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    /// Builds a randomly initialized network from a validated spec.
    pub fn new<R: Rng + ?Sized>(spec: &NetworkSpec, rng: &mut R) -> Result<Network> {
        spec.validate()?;
        let layers = spec.layers.iter()
            .map(|l| Layer::new(l.input_count, l.output_count, spec.activation, rng))
            .collect();
        Ok(Network { layers })
    }

    /// Wraps existing layers after checking that they form a chain and share
    /// one activation.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Network> {
        if layers.is_empty() {
            return Err(Error::InvalidTopology("network has no layers".to_owned()));
        }
        let activation = layers[0].activation();
        if let Some(i) = layers.iter().position(|l| l.activation() != activation) {
            return Err(Error::InvalidTopology(format!(
                "layer {} uses {:?} but layer 0 uses {:?}",
                i, layers[i].activation(), activation
            )));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].output_count() != pair[1].input_count() {
                return Err(Error::InvalidTopology(format!(
                    "layer {} outputs {} values but layer {} expects {} inputs",
                    i, pair[0].output_count(), i + 1, pair[1].input_count()
                )));
            }
        }
        Ok(Network { layers })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> &Layer {
        &self.layers[index]
    }

    pub fn input_count(&self) -> usize {
        self.layers[0].input_count()
    }

    pub fn output_count(&self) -> usize {
        self.last_layer().output_count()
    }

    pub fn activation(&self) -> Activation {
        self.layers[0].activation()
    }

    /// Describes this network's dimensions as a spec.
    pub fn spec(&self, name: &str) -> NetworkSpec {
        let mut dims: Vec<usize> = vec![self.input_count()];
        dims.extend(self.layers.iter().map(|l| l.output_count()));
        NetworkSpec::from_dims(name, &dims, self.activation())
    }

    fn last_layer(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    /// Forward pass; every layer keeps its results for backpropagation.
    ///
    /// Returns the last layer's activations. No softmax and no decision:
    /// picking a class is up to the caller.
    ///
    /// # Panics
    /// Panics if `input.len()` differs from the first layer's input count.
    pub fn forward(&mut self, input: &[f32]) -> &[f32] {
        self.layers[0].forward(input);
        for i in 1..self.layers.len() {
            let (before, after) = self.layers.split_at_mut(i);
            after[0].forward_from(&before[i - 1]);
        }
        self.last_layer().activations()
    }

    /// Index of the largest output for `input`.
    pub fn classify(&mut self, input: &[f32]) -> usize {
        argmax(self.forward(input))
    }

    /// Gradient of the batch cost for every parameter of every layer.
    ///
    /// Per sample, in order: one forward pass, then the output layer's
    /// backward step, then each hidden layer from the second-to-last down to
    /// the first. Gradients are summed across samples and, for batches of
    /// more than one sample, divided by the sample count. A single-sample
    /// batch returns the summed gradient as is, without a division.
    ///
    /// # Panics
    /// Panics if `samples` is empty, or on any input length or label that
    /// does not fit the network.
    pub fn backpropagate_batch<S: LabeledSample>(&mut self, samples: &[S]) -> Vec<Vec<f32>> {
        assert!(!samples.is_empty(), "batch must contain at least one sample");

        for layer in &mut self.layers {
            layer.reset_gradient_accumulator();
        }

        for sample in samples {
            self.backpropagate_sample(sample);
        }

        let averaged = samples.len() > 1;
        debug!(batch_size = samples.len(), averaged, "backpropagated batch");

        let count = samples.len() as f32;
        self.layers.iter()
            .map(|layer| {
                let sum = layer.gradient_accumulator();
                if averaged {
                    sum.iter().map(|g| g / count).collect()
                } else {
                    sum.to_vec()
                }
            })
            .collect()
    }

    fn backpropagate_sample<S: LabeledSample>(&mut self, sample: &S) {
        let input = sample.input();
        self.forward(input);

        let last = self.layers.len() - 1;
        let target = one_hot(sample.label(), self.layers[last].output_count());

        let (before, after) = self.layers.split_at_mut(last);
        let previous = before.last().map_or(input, |l| l.activations());
        after[0].backward_as_output_layer(&target, previous);

        // Layer k reads layer k + 1's error signals, so walk output to input.
        for k in (0..last).rev() {
            let (before, rest) = self.layers.split_at_mut(k);
            let (current, after) = rest.split_at_mut(1);
            let previous = before.last().map_or(input, |l| l.activations());
            current[0].backward_as_hidden_layer(&after[0], previous);
        }
    }

    /// Adds one pre-scaled correction vector to each layer's parameters.
    ///
    /// # Panics
    /// Panics if the number of vectors or any vector's length does not match.
    pub fn apply_update(&mut self, correction_per_layer: &[Vec<f32>]) {
        assert_eq!(
            correction_per_layer.len(),
            self.layers.len(),
            "expected one correction vector per layer"
        );
        for (layer, correction) in self.layers.iter_mut().zip(correction_per_layer.iter()) {
            layer.apply_correction(correction);
        }
    }

    /// Mean over samples of the squared error between the outputs and the
    /// one-hot targets. Overwrites every layer's forward results.
    ///
    /// # Panics
    /// Panics if `samples` is empty.
    pub fn compute_cost<S: LabeledSample>(&mut self, samples: &[S]) -> f32 {
        assert!(!samples.is_empty(), "cannot compute the cost of an empty sample set");

        let output_count = self.output_count();
        let total: f64 = samples.iter()
            .map(|sample| {
                let target = one_hot(sample.label(), output_count);
                SquaredError::cost(self.forward(sample.input()), &target) as f64
            })
            .sum();
        (total / samples.len() as f64) as f32
    }

    /// Fraction of samples whose arg-max output equals the label.
    ///
    /// # Panics
    /// Panics if `samples` is empty.
    pub fn accuracy<S: LabeledSample>(&mut self, samples: &[S]) -> f32 {
        assert!(!samples.is_empty(), "cannot compute the accuracy of an empty sample set");
        let correct = samples.iter()
            .filter(|sample| self.classify(sample.input()) == sample.label())
            .count();
        correct as f32 / samples.len() as f32
    }

    /// First NaN or infinite parameter as `(layer, index, value)`.
    pub fn first_non_finite(&self) -> Option<(usize, usize, f32)> {
        self.layers.iter().enumerate()
            .find_map(|(l, layer)| layer.first_non_finite().map(|(i, v)| (l, i, v)))
    }

    /// Fails with `Error::NonFinite` if any parameter is NaN or infinite.
    pub fn check_finite(&self) -> Result<()> {
        match self.first_non_finite() {
            Some((layer, index, value)) => Err(Error::NonFinite { layer, index, value }),
            None => Ok(()),
        }
    }
}

/// Index of the maximum element in a slice.
pub fn argmax(v: &[f32]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
