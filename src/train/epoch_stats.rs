use serde::{Serialize, Deserialize};

/// Cost and accuracy measured after one evaluated epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Mean squared-error cost over the evaluation set.
    pub cost: f32,
    /// Fraction in [0, 1] of evaluation samples whose arg-max output matches the label.
    pub accuracy: f32,
}

/// Outcome of a `train_loop` run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainSummary {
    pub epochs_run: usize,
    /// One entry per evaluation, in order.
    pub history: Vec<EpochStats>,
}

impl TrainSummary {
    /// Most recent evaluation, if any.
    pub fn last(&self) -> Option<&EpochStats> {
        self.history.last()
    }
}
