use serde::{Deserialize, Serialize};

/// Optional annotations attached to a saved generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Number of completed adversarial steps.
    pub trained_steps: Option<usize>,
    pub seed: Option<u64>,
    pub final_generator_loss: Option<f64>,
    pub final_discriminator_loss: Option<f64>,
}
