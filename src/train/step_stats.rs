use serde::{Serialize, Deserialize};

/// Losses of one completed adversarial step.
///
/// Emitted as a progress line every `log_every` steps and, when a
/// `progress_tx` channel is configured in `TrainConfig`, sent to it as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    /// 0-based step index.
    pub step: usize,
    pub generator_loss: f64,
    /// Real and fake terms summed.
    pub discriminator_loss: f64,
    /// Wall-clock duration of this step in milliseconds.
    pub elapsed_ms: u64,
}

impl StepStats {
    pub fn is_finite(&self) -> bool {
        self.generator_loss.is_finite() && self.discriminator_loss.is_finite()
    }
}
