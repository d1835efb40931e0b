use rand::Rng;
use tracing::{info, warn};

use crate::error::Result;
use crate::network::network::Network;
use crate::optim::sgd::Sgd;
use crate::sample::LabeledSample;
use crate::train::epoch_stats::{EpochStats, TrainSummary};
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` with plain mini-batch gradient descent.
///
/// Every epoch draws `config.batch_size` samples uniformly with replacement,
/// backpropagates them as one batch and applies `-learning_rate * gradient`.
///
/// # Arguments
/// - `network`       — modified in place
/// - `train_samples` — pool batches are drawn from
/// - `eval_samples`  — set the cost is measured on; the training pool if `None`
/// - `config`        — hyperparameters
/// - `rng`           — drives batch sampling
///
/// # Errors
/// Stops with `Error::NonFinite` as soon as an update produces a NaN or
/// infinite parameter.
///
/// # Panics
/// Panics if `train_samples` is empty or `batch_size == 0`.
pub fn train_loop<S, R>(
    network: &mut Network,
    train_samples: &[S],
    eval_samples: Option<&[S]>,
    config: &TrainConfig,
    rng: &mut R,
) -> Result<TrainSummary>
where
    S: LabeledSample,
    R: Rng + ?Sized,
{
    assert!(!train_samples.is_empty(), "train_samples must not be empty");
    assert!(config.batch_size > 0, "batch_size must be at least 1");

    let optimizer = Sgd::new(config.learning_rate);
    let eval_set = eval_samples.filter(|s| !s.is_empty()).unwrap_or(train_samples);
    let mut summary = TrainSummary::default();

    for epoch in 1..=config.epochs {
        let batch: Vec<&S> = (0..config.batch_size)
            .map(|_| &train_samples[rng.gen_range(0..train_samples.len())])
            .collect();

        let gradients = network.backpropagate_batch(&batch);
        network.apply_update(&optimizer.correction(&gradients));
        summary.epochs_run = epoch;

        if let Err(e) = network.check_finite() {
            warn!(epoch, error = %e, "training diverged");
            return Err(e);
        }

        if is_eval_epoch(epoch, config) {
            let stats = evaluate(network, eval_set, epoch);
            info!(epoch, cost = stats.cost, accuracy = stats.accuracy, "evaluated");
            summary.history.push(stats);
        }
    }

    Ok(summary)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn is_eval_epoch(epoch: usize, config: &TrainConfig) -> bool {
    epoch == config.epochs || (config.eval_every > 0 && epoch % config.eval_every == 0)
}

fn evaluate<S: LabeledSample>(network: &mut Network, samples: &[S], epoch: usize) -> EpochStats {
    EpochStats {
        epoch,
        cost: network.compute_cost(samples),
        accuracy: network.accuracy(samples),
    }
}
