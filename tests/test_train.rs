// Tests for the mini-batch training driver.

use ferrite_backprop::{
    train_loop, Activation, Error, Network, NetworkSpec, Sample, TrainConfig,
};
use rand::{rngs::StdRng, SeedableRng};

/// Class 1 when the first input dominates, class 0 otherwise.
fn separable_samples() -> Vec<Sample> {
    vec![
        Sample::new(vec![1.0, 0.0], 1),
        Sample::new(vec![0.9, 0.2], 1),
        Sample::new(vec![0.0, 1.0], 0),
        Sample::new(vec![0.2, 0.9], 0),
    ]
}

fn network(seed: u64) -> Network {
    let spec = NetworkSpec::from_dims("train", &[2, 3, 2], Activation::Sigmoid);
    Network::new(&spec, &mut StdRng::seed_from_u64(seed)).unwrap()
}

// ============================================================================
// Convergence
// ============================================================================

mod convergence_tests {
    use super::*;

    #[test]
    fn test_learns_separable_problem() {
        let samples = separable_samples();
        let mut net = network(1);
        let initial_cost = net.compute_cost(&samples);

        let config = TrainConfig { seed: Some(1), eval_every: 0, ..TrainConfig::new(2000, 4, 2.0) };
        let summary = train_loop(&mut net, &samples, None, &config, &mut config.rng()).unwrap();

        let last = summary.last().unwrap();
        assert_eq!(summary.epochs_run, 2000);
        assert!(last.cost < initial_cost, "cost went from {} to {}", initial_cost, last.cost);
        assert_eq!(last.accuracy, 1.0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let samples = separable_samples();
        let config = TrainConfig { seed: Some(5), ..TrainConfig::new(50, 2, 1.0) };

        let mut a = network(2);
        let mut b = network(2);
        train_loop(&mut a, &samples, None, &config, &mut config.rng()).unwrap();
        train_loop(&mut b, &samples, None, &config, &mut config.rng()).unwrap();

        for (la, lb) in a.layers().iter().zip(b.layers().iter()) {
            assert_eq!(la.parameters(), lb.parameters());
        }
    }

    #[test]
    fn test_divergence_stops_training() {
        let samples = separable_samples();
        let mut net = network(3);
        let config = TrainConfig::new(100, 4, f32::INFINITY);

        let err = train_loop(&mut net, &samples, None, &config, &mut StdRng::seed_from_u64(3))
            .unwrap_err();
        assert!(matches!(err, Error::NonFinite { .. }));
        assert!(net.first_non_finite().is_some());
    }
}

// ============================================================================
// Evaluation schedule
// ============================================================================

mod evaluation_tests {
    use super::*;

    #[test]
    fn test_evaluates_every_interval_and_at_the_end() {
        let samples = separable_samples();
        let mut net = network(4);
        let config = TrainConfig { eval_every: 3, ..TrainConfig::new(10, 2, 0.5) };

        let summary = train_loop(&mut net, &samples, None, &config, &mut StdRng::seed_from_u64(4))
            .unwrap();
        let epochs: Vec<usize> = summary.history.iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![3, 6, 9, 10]);
    }

    #[test]
    fn test_zero_interval_evaluates_only_last_epoch() {
        let samples = separable_samples();
        let mut net = network(5);
        let config = TrainConfig { eval_every: 0, ..TrainConfig::new(7, 2, 0.5) };

        let summary = train_loop(&mut net, &samples, None, &config, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert_eq!(summary.history.len(), 1);
        assert_eq!(summary.history[0].epoch, 7);
    }

    #[test]
    fn test_cost_is_measured_on_eval_set() {
        let samples = separable_samples();
        let held_out = vec![Sample::new(vec![0.8, 0.1], 1), Sample::new(vec![0.1, 0.7], 0)];
        let mut net = network(6);
        let config = TrainConfig { eval_every: 0, ..TrainConfig::new(20, 4, 1.0) };

        let summary = train_loop(
            &mut net,
            &samples,
            Some(held_out.as_slice()),
            &config,
            &mut StdRng::seed_from_u64(6),
        )
        .unwrap();

        let last = summary.last().unwrap();
        assert_eq!(last.cost, net.compute_cost(&held_out));
        assert_eq!(last.accuracy, net.accuracy(&held_out));
    }

    #[test]
    fn test_zero_epochs_leaves_network_unchanged() {
        let samples = separable_samples();
        let mut net = network(7);
        let before = net.clone();
        let config = TrainConfig::new(0, 4, 1.0);

        let summary = train_loop(&mut net, &samples, None, &config, &mut StdRng::seed_from_u64(7))
            .unwrap();
        assert_eq!(summary.epochs_run, 0);
        assert!(summary.history.is_empty());
        for (a, b) in net.layers().iter().zip(before.layers().iter()) {
            assert_eq!(a.parameters(), b.parameters());
        }
    }
}

// ============================================================================
// Contract violations
// ============================================================================

mod contract_tests {
    use super::*;

    #[test]
    #[should_panic(expected = "train_samples must not be empty")]
    fn test_empty_training_set_panics() {
        let mut net = network(8);
        let empty: Vec<Sample> = Vec::new();
        let _ = train_loop(&mut net, &empty, None, &TrainConfig::default(), &mut StdRng::seed_from_u64(8));
    }

    #[test]
    #[should_panic(expected = "batch_size must be at least 1")]
    fn test_zero_batch_size_panics() {
        let mut net = network(9);
        let config = TrainConfig::new(1, 0, 1.0);
        let _ = train_loop(&mut net, &separable_samples(), None, &config, &mut StdRng::seed_from_u64(9));
    }
}
