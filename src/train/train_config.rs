use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use serde::{Deserialize, Serialize};

use crate::error::{GanError, Result};
use crate::loss::gan::LabelSmoothing;
use crate::optim::adam::AdamConfig;
use crate::train::step_stats::StepStats;
use crate::train::stopping::StoppingPredicate;

/// Configuration for an adversarial training run.
///
/// # Fields
/// - `steps`: upper bound on adversarial steps (discriminator + generator update)
/// - `batch_size`: real images sampled per step
/// - `seed`: drives parameter initialization, batch sampling and latent noise
/// - `log_every`: a progress line is emitted when `step % log_every == 0`
/// - `progress_tx`: optional channel sender; receives the same `StepStats`
///   as the progress line.  A dropped receiver is ignored.
/// - `stop_flag`: optional atomic flag; when set to `true` from another
///   thread the loop terminates before the next step.
/// - `stopping`: optional predicate consulted after every step.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub steps: usize,
    pub batch_size: usize,
    pub seed: u64,
    pub log_every: usize,
    pub optimizer: AdamConfig,
    pub smoothing: LabelSmoothing,
    /// Copied into the saved model's metadata.
    pub description: Option<String>,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<StepStats>>,
    #[serde(skip)]
    pub stop_flag: Option<Arc<AtomicBool>>,
    #[serde(skip)]
    pub stopping: Option<Box<dyn StoppingPredicate>>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            steps: 10_000,
            batch_size: 16,
            seed: 0,
            log_every: 100,
            optimizer: AdamConfig::default(),
            smoothing: LabelSmoothing::default(),
            description: None,
            progress_tx: None,
            stop_flag: None,
            stopping: None,
        }
    }
}

impl TrainConfig {
    /// Creates a `TrainConfig` with default optimizer and smoothing settings
    /// and no hooks.
    pub fn new(steps: usize, batch_size: usize, seed: u64) -> Self {
        TrainConfig { steps, batch_size, seed, ..TrainConfig::default() }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(GanError::InvalidConfig(msg));
        if self.batch_size == 0 {
            return invalid("batch_size must be at least 1".to_string());
        }
        if self.log_every == 0 {
            return invalid("log_every must be at least 1".to_string());
        }
        let AdamConfig { learning_rate, beta1, beta2, epsilon } = self.optimizer;
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return invalid(format!("learning_rate must be positive, got {learning_rate}"));
        }
        for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return invalid(format!("{name} must lie in [0, 1), got {beta}"));
            }
        }
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return invalid(format!("epsilon must be positive, got {epsilon}"));
        }
        for (name, label) in [("real", self.smoothing.real), ("fake", self.smoothing.fake)] {
            if !(0.0..=1.0).contains(&label) {
                return invalid(format!("{name} label must lie in [0, 1], got {label}"));
            }
        }
        Ok(())
    }
}
