use serde::{Deserialize, Serialize};

/// Stopping rule for [`Network::train_dataset`](crate::Network::train_dataset).
///
/// Training stops after `max_epochs`, or earlier once the average loss
/// gradient magnitude of an epoch stays below `tolerance` for `patience`
/// consecutive epochs. This is a heuristic, not a convergence proof.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingPolicy {
    pub max_epochs: usize,
    pub tolerance: f64,
    pub patience: usize,
    /// Visit the examples in a new random order each epoch.
    pub shuffle: bool,
}

impl Default for TrainingPolicy {
    fn default() -> Self {
        Self {
            max_epochs: 1000,
            tolerance: 0.01,
            patience: 5,
            shuffle: false,
        }
    }
}

impl TrainingPolicy {
    pub fn max_epochs(self, max_epochs: usize) -> Self {
        Self { max_epochs, ..self }
    }

    pub fn tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    pub fn patience(self, patience: usize) -> Self {
        Self { patience, ..self }
    }

    pub fn shuffle(self, shuffle: bool) -> Self {
        Self { shuffle, ..self }
    }
}

/// Outcome of an epoch loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub epochs: usize,
    /// Average loss per example over the last epoch.
    pub average_loss: f64,
    /// Average `|dLoss/dOutput|` per output neuron over the last epoch.
    pub average_gradient: f64,
    pub converged: bool,
}

/// Running averages of one epoch.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EpochStats {
    loss_sum: f64,
    gradient_sum: f64,
    examples: usize,
    outputs: usize,
}

impl EpochStats {
    pub(crate) fn record(&mut self, loss: f64, gradient_magnitude_sum: f64, outputs: usize) {
        self.loss_sum += loss;
        self.gradient_sum += gradient_magnitude_sum;
        self.examples += 1;
        self.outputs += outputs;
    }

    pub(crate) fn average_loss(&self) -> f64 {
        if self.examples == 0 {
            0.0
        } else {
            self.loss_sum / self.examples as f64
        }
    }

    pub(crate) fn average_gradient(&self) -> f64 {
        if self.outputs == 0 {
            0.0
        } else {
            self.gradient_sum / self.outputs as f64
        }
    }
}

/// Counts consecutive epochs below the tolerance.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Convergence {
    policy: TrainingPolicy,
    streak: usize,
}

impl Convergence {
    pub(crate) fn new(policy: TrainingPolicy) -> Self {
        Self { policy, streak: 0 }
    }

    /// Feeds one epoch's average gradient; returns `true` once training should stop.
    pub(crate) fn observe(&mut self, average_gradient: f64) -> bool {
        if average_gradient.abs() < self.policy.tolerance {
            self.streak += 1;
        } else {
            self.streak = 0;
        }
        self.streak >= self.policy.patience.max(1)
    }
}
