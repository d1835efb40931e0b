use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::{
    activation::activation::Activation,
    loss::squared_error::SquaredError,
    math::params::Parameters,
};

/// Which pass results a layer currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Freshly built or reset; no forward results to differentiate.
    Clean,
    /// Holds the results of exactly one forward pass.
    Forwarded,
    /// Holds a forward pass and the backward pass derived from it.
    Backpropagated,
}

// Source of forward-pass ids. Layers fed by the same chain of forward calls
// share one id.
static NEXT_PASS_ID: AtomicU64 = AtomicU64::new(1);

/// One fully-connected layer: an affine transform followed by the network's
/// activation function.
///
/// Besides its parameters, a layer keeps the transient results of the most
/// recent forward pass (`pre_activations`, `activations`) and backward pass
/// (`error_signals`). Every call overwrites them. Gradients, in contrast, are
/// summed into `gradients` until `reset_gradient_accumulator` is called.
#[derive(Debug, Clone)]
pub struct Layer {
    input_count: usize,
    output_count: usize,
    parameters: Parameters,
    pre_activations: Vec<f32>,
    activations: Vec<f32>,
    error_signals: Vec<f32>,
    gradients: Parameters,
    activator: Activation,
    state: PassState,
    pass_id: u64,
}

impl Layer {
    /// Builds a layer whose parameters are all drawn from N(0, 1).
    ///
    /// # Panics
    /// Panics if either count is zero.
    pub fn new<R: Rng + ?Sized>(
        input_count: usize,
        output_count: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Layer {
        assert!(input_count > 0, "layer input count must be positive");
        assert!(output_count > 0, "layer output count must be positive");
        Layer::from_parameters(
            Parameters::standard_normal(input_count, output_count, rng),
            activation,
        )
    }

    /// Builds a layer around existing parameters; transient buffers are
    /// sized from the parameter layout and zeroed.
    pub fn from_parameters(parameters: Parameters, activation: Activation) -> Layer {
        let input_count = parameters.inputs();
        let output_count = parameters.neuron_count();
        assert!(input_count > 0, "layer input count must be positive");
        assert!(output_count > 0, "layer output count must be positive");

        Layer {
            input_count,
            output_count,
            gradients: Parameters::zeros(input_count, output_count),
            parameters,
            pre_activations: vec![0.0; output_count],
            activations: vec![0.0; output_count],
            error_signals: vec![0.0; output_count],
            activator: activation,
            state: PassState::Clean,
            pass_id: 0,
        }
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn activation(&self) -> Activation {
        self.activator
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    /// Weighted sums `z` of the last forward pass.
    pub fn pre_activations(&self) -> &[f32] {
        &self.pre_activations
    }

    /// Neuron outputs of the last forward pass.
    pub fn activations(&self) -> &[f32] {
        &self.activations
    }

    /// ∂cost/∂z per neuron from the last backward pass.
    pub fn error_signals(&self) -> &[f32] {
        &self.error_signals
    }

    /// Summed gradients since the last reset, same layout as `parameters`.
    pub fn gradient_accumulator(&self) -> &[f32] {
        self.gradients.as_slice()
    }

    /// Computes `z_i = Σ_j w(i,j)·input_j + b_i` and its activation for each
    /// neuron, stores both and returns the activations.
    ///
    /// Starts a new forward pass. Use [`Layer::forward_from`] for the layers
    /// after the first so the whole chain belongs to the same pass.
    ///
    /// # Panics
    /// Panics if `input.len() != input_count`.
    pub fn forward(&mut self, input: &[f32]) -> &[f32] {
        let pass_id = NEXT_PASS_ID.fetch_add(1, Ordering::Relaxed);
        self.forward_in_pass(input, pass_id)
    }

    /// Forward pass fed by `previous`'s activations, joining its pass.
    ///
    /// # Panics
    /// Panics if `previous.output_count() != input_count`.
    pub fn forward_from(&mut self, previous: &Layer) -> &[f32] {
        self.forward_in_pass(&previous.activations, previous.pass_id)
    }

    fn forward_in_pass(&mut self, input: &[f32], pass_id: u64) -> &[f32] {
        assert_eq!(
            input.len(),
            self.input_count,
            "forward input length {} does not match layer input count {}",
            input.len(),
            self.input_count
        );

        for (i, neuron) in self.parameters.neurons().enumerate() {
            let z = neuron.weights.iter().zip(input.iter())
                .map(|(w, x)| w * x)
                .sum::<f32>()
                + neuron.bias;
            self.pre_activations[i] = z;
            self.activations[i] = self.activator.function(z);
        }

        self.state = PassState::Forwarded;
        self.pass_id = pass_id;
        &self.activations
    }

    /// Backward step for the last layer of a network.
    ///
    /// `δ_i = 2·(a_i - target_i)·σ'(z_i)`, then accumulates
    /// `δ_i·previous_activations[j]` into weight `(i, j)` and `δ_i` into bias `i`.
    ///
    /// # Panics
    /// Panics on length mismatches or if this layer has no forward pass pending.
    pub fn backward_as_output_layer(&mut self, target: &[f32], previous_activations: &[f32]) {
        assert_eq!(
            target.len(),
            self.output_count,
            "target length {} does not match layer output count {}",
            target.len(),
            self.output_count
        );
        self.check_backward_preconditions(previous_activations);

        for i in 0..self.output_count {
            let d_cost = SquaredError::derivative(self.activations[i], target[i]);
            let delta = d_cost * self.activator.derivative(self.pre_activations[i]);
            self.error_signals[i] = delta;
            self.accumulate(i, delta, previous_activations);
        }

        self.state = PassState::Backpropagated;
    }

    /// Backward step for any layer but the last.
    ///
    /// `δ_i = (Σ_k next.δ_k · next.w(k, i))·σ'(z_i)`: this layer's output `i` is
    /// input `i` of `next`. Requires `next` to have completed its own backward
    /// step for the same forward pass, i.e. `next` was fed through
    /// [`Layer::forward_from`] by this layer's latest forward call.
    ///
    /// # Panics
    /// Panics on dimension mismatches, if `next` has not been backpropagated,
    /// or if this layer has no forward pass pending.
    pub fn backward_as_hidden_layer(&mut self, next: &Layer, previous_activations: &[f32]) {
        assert_eq!(
            next.input_count,
            self.output_count,
            "next layer input count {} does not match layer output count {}",
            next.input_count,
            self.output_count
        );
        assert_eq!(
            next.state,
            PassState::Backpropagated,
            "next layer must run its backward step before this one"
        );
        self.check_backward_preconditions(previous_activations);
        assert_eq!(
            next.pass_id,
            self.pass_id,
            "next layer's error signals belong to a different forward pass"
        );

        for i in 0..self.output_count {
            let propagated: f32 = next.error_signals.iter().enumerate()
                .map(|(k, next_delta)| next_delta * next.parameters.weight(k, i))
                .sum();
            let delta = propagated * self.activator.derivative(self.pre_activations[i]);
            self.error_signals[i] = delta;
            self.accumulate(i, delta, previous_activations);
        }

        self.state = PassState::Backpropagated;
    }

    /// Zeroes the gradient accumulator. Call once before every batch.
    pub fn reset_gradient_accumulator(&mut self) {
        self.gradients.fill(0.0);
        self.state = PassState::Clean;
    }

    /// Adds `correction` to the parameters elementwise. No scaling is applied.
    ///
    /// # Panics
    /// Panics if `correction.len()` differs from the parameter count.
    pub fn apply_correction(&mut self, correction: &[f32]) {
        self.parameters.add_assign(correction);
        // Stored pass results no longer describe these parameters.
        self.state = PassState::Clean;
    }

    /// First NaN or infinite parameter, as `(index, value)`.
    pub fn first_non_finite(&self) -> Option<(usize, f32)> {
        self.parameters.as_slice().iter().copied()
            .enumerate()
            .find(|(_, value)| !value.is_finite())
    }

    fn check_backward_preconditions(&self, previous_activations: &[f32]) {
        assert_eq!(
            previous_activations.len(),
            self.input_count,
            "previous activations length {} does not match layer input count {}",
            previous_activations.len(),
            self.input_count
        );
        assert_eq!(
            self.state,
            PassState::Forwarded,
            "backward step requires exactly one preceding forward pass"
        );
    }

    fn accumulate(&mut self, neuron: usize, delta: f32, previous_activations: &[f32]) {
        let block = self.gradients.neuron_mut(neuron);
        let (weights, bias) = block.split_at_mut(self.input_count);
        for (g, a) in weights.iter_mut().zip(previous_activations.iter()) {
            *g += delta * a;
        }
        bias[0] += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn layer(inputs: usize, data: Vec<f32>) -> Layer {
        let neurons = data.len() / (inputs + 1);
        Layer::from_parameters(Parameters::from_data(inputs, neurons, data), Activation::Sigmoid)
    }

    #[test]
    fn forward_computes_weighted_sum_plus_bias() {
        let mut l = layer(2, vec![1.0, 2.0, 0.5, -1.0, 0.0, 0.25]);
        l.forward(&[0.5, 0.25]);
        assert_relative_eq!(l.pre_activations()[0], 0.5 + 0.5 + 0.5);
        assert_relative_eq!(l.pre_activations()[1], -0.5 + 0.25);
        assert_relative_eq!(l.activations()[0], Activation::Sigmoid.function(1.5));
        assert_eq!(l.state(), PassState::Forwarded);
    }

    #[test]
    fn output_backward_accumulates_across_calls() {
        let mut l = layer(1, vec![0.0, 0.0]);
        l.forward(&[2.0]);
        l.backward_as_output_layer(&[1.0], &[2.0]);
        // δ = 2·(0.5 - 1)·0.25
        assert_relative_eq!(l.error_signals()[0], -0.25);
        assert_relative_eq!(l.gradient_accumulator()[0], -0.5);
        assert_relative_eq!(l.gradient_accumulator()[1], -0.25);

        l.forward(&[2.0]);
        l.backward_as_output_layer(&[1.0], &[2.0]);
        assert_relative_eq!(l.gradient_accumulator()[0], -1.0);
        assert_relative_eq!(l.gradient_accumulator()[1], -0.5);

        l.reset_gradient_accumulator();
        assert!(l.gradient_accumulator().iter().all(|g| *g == 0.0));
        assert_eq!(l.state(), PassState::Clean);
    }

    #[test]
    #[should_panic(expected = "preceding forward pass")]
    fn backward_without_forward_panics() {
        let mut l = layer(1, vec![0.0, 0.0]);
        l.backward_as_output_layer(&[1.0], &[2.0]);
    }

    #[test]
    #[should_panic(expected = "preceding forward pass")]
    fn second_backward_on_same_forward_panics() {
        let mut l = layer(1, vec![0.0, 0.0]);
        l.forward(&[1.0]);
        l.backward_as_output_layer(&[1.0], &[1.0]);
        l.backward_as_output_layer(&[1.0], &[1.0]);
    }

    #[test]
    #[should_panic(expected = "run its backward step")]
    fn hidden_backward_before_successor_panics() {
        let mut hidden = layer(1, vec![0.5, 0.0]);
        let mut next = layer(1, vec![0.5, 0.0]);
        hidden.forward(&[1.0]);
        next.forward_from(&hidden);
        hidden.backward_as_hidden_layer(&next, &[1.0]);
    }

    #[test]
    fn forward_from_joins_the_previous_pass() {
        let mut first = layer(1, vec![0.5, 0.0]);
        let mut second = layer(1, vec![2.0, 0.0]);
        first.forward(&[1.0]);
        let out = second.forward_from(&first).to_vec();
        assert_eq!(second.pass_id, first.pass_id);
        assert_relative_eq!(out[0], Activation::Sigmoid.function(2.0 * first.activations()[0]));

        first.forward(&[1.0]);
        assert_ne!(second.pass_id, first.pass_id);
    }

    #[test]
    fn apply_correction_invalidates_pass_state() {
        let mut l = layer(1, vec![0.0, 0.0]);
        l.forward(&[1.0]);
        l.apply_correction(&[0.5, -0.5]);
        assert_eq!(l.parameters().as_slice(), &[0.5, -0.5]);
        assert_eq!(l.state(), PassState::Clean);
    }

    #[test]
    fn first_non_finite_finds_nan() {
        let mut l = layer(1, vec![0.0, 0.0, 1.0, 1.0]);
        assert_eq!(l.first_non_finite(), None);
        l.apply_correction(&[0.0, 0.0, f32::NAN, 0.0]);
        let (index, value) = l.first_non_finite().unwrap();
        assert_eq!(index, 2);
        assert!(value.is_nan());
    }
}
