// Compares backpropagated gradients against central finite differences of
// the cost, for every parameter of a small 2→3→2 network.

use approx::assert_relative_eq;
use ferrite_backprop::{Activation, Layer, Network, Parameters, Sample};

const EPSILON: f32 = 1e-2;

fn network(activation: Activation) -> Network {
    let hidden = vec![0.5, -0.4, 0.1, 0.3, 0.8, -0.2, -0.6, 0.2, 0.05];
    let output = vec![0.7, -0.5, 0.4, 0.1, -0.3, 0.9, -0.8, -0.1];
    Network::from_layers(vec![
        Layer::from_parameters(Parameters::from_data(2, 3, hidden), activation),
        Layer::from_parameters(Parameters::from_data(3, 2, output), activation),
    ])
    .unwrap()
}

/// Cost of `samples` after nudging one parameter by `delta`.
fn nudged_cost(net: &Network, layer: usize, index: usize, delta: f32, samples: &[Sample]) -> f32 {
    let mut nudged = net.clone();
    let mut corrections: Vec<Vec<f32>> = net.layers().iter()
        .map(|l| vec![0.0; l.parameters().len()])
        .collect();
    corrections[layer][index] = delta;
    nudged.apply_update(&corrections);
    nudged.compute_cost(samples)
}

fn check_gradients(activation: Activation, samples: &[Sample]) {
    let mut net = network(activation);
    let analytic = net.backpropagate_batch(samples);

    for (layer, grads) in analytic.iter().enumerate() {
        for (index, &g) in grads.iter().enumerate() {
            let plus = nudged_cost(&net, layer, index, EPSILON, samples);
            let minus = nudged_cost(&net, layer, index, -EPSILON, samples);
            let numeric = (plus - minus) / (2.0 * EPSILON);
            assert_relative_eq!(g, numeric, epsilon = 1e-6, max_relative = 1e-3);
        }
    }
}

// ============================================================================
// Sigmoid
// ============================================================================

mod sigmoid_tests {
    use super::*;

    #[test]
    fn test_single_sample_label_0() {
        check_gradients(Activation::Sigmoid, &[Sample::new(vec![0.9, 0.3], 0)]);
    }

    #[test]
    fn test_single_sample_label_1() {
        check_gradients(Activation::Sigmoid, &[Sample::new(vec![0.9, 0.3], 1)]);
    }

    #[test]
    fn test_batch_matches_mean_cost() {
        check_gradients(Activation::Sigmoid, &[
            Sample::new(vec![0.9, 0.3], 0),
            Sample::new(vec![0.9, 0.3], 1),
        ]);
    }
}

// ============================================================================
// ReLU
// ============================================================================

mod relu_tests {
    use super::*;

    #[test]
    fn test_single_sample_label_0() {
        check_gradients(Activation::ReLU, &[Sample::new(vec![0.9, 0.3], 0)]);
    }

    #[test]
    fn test_single_sample_label_1() {
        check_gradients(Activation::ReLU, &[Sample::new(vec![0.9, 0.3], 1)]);
    }

    #[test]
    fn test_inactive_hidden_neuron_gets_no_gradient() {
        // Hidden neuron 2: z = -0.6·0.9 + 0.2·0.3 + 0.05 < 0.
        let mut net = network(Activation::ReLU);
        let grads = net.backpropagate_batch(&[Sample::new(vec![0.9, 0.3], 0)]);
        assert_eq!(net.layer(0).activations()[2], 0.0);
        assert_eq!(&grads[0][6..9], &[0.0, 0.0, 0.0]);
        // Its outgoing weights see a zero activation too.
        assert_eq!(grads[1][2], 0.0);
        assert_eq!(grads[1][6], 0.0);
    }
}
