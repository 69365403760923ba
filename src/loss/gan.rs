//! Adversarial losses. Both take discriminator logits by reference and own
//! neither network.

use serde::{Deserialize, Serialize};

use crate::loss::bce::BceWithLogitsLoss;
use crate::math::Matrix;

/// Soft discriminator targets, 0.9 for real and 0.1 for fake by default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelSmoothing {
    pub real: f64,
    pub fake: f64,
}

impl Default for LabelSmoothing {
    fn default() -> Self {
        LabelSmoothing { real: 0.9, fake: 0.1 }
    }
}

/// A scalar loss and its gradient with respect to the `batch × 1` logits.
#[derive(Debug, Clone)]
pub struct LossOutput {
    pub value: f64,
    pub grad: Matrix,
}

impl LossOutput {
    fn bce(logits: &Matrix, target: f64) -> LossOutput {
        let x = logits.column(0);
        let y = labels(x.len(), target);
        LossOutput {
            value: BceWithLogitsLoss::loss(&x, &y),
            grad: Matrix::column_vector(&BceWithLogitsLoss::derivative(&x, &y)),
        }
    }
}

/// Both halves of the discriminator objective.
#[derive(Debug, Clone)]
pub struct DiscriminatorLoss {
    pub real: LossOutput,
    pub fake: LossOutput,
}

impl DiscriminatorLoss {
    /// Real and fake terms summed, not averaged.
    pub fn value(&self) -> f64 {
        self.real.value + self.fake.value
    }
}

/// `n` copies of `value`.
pub fn labels(n: usize, value: f64) -> Vec<f64> {
    vec![value; n]
}

/// Mean cross-entropy of the discriminator's verdict on generated images
/// against an all-ones target: the generator wants its output called real.
pub fn generator_loss(fake_logits: &Matrix) -> LossOutput {
    LossOutput::bce(fake_logits, 1.0)
}

/// Mean cross-entropy of real logits against `smoothing.real` plus mean
/// cross-entropy of fake logits against `smoothing.fake`.
pub fn discriminator_loss(
    real_logits: &Matrix,
    fake_logits: &Matrix,
    smoothing: LabelSmoothing,
) -> DiscriminatorLoss {
    DiscriminatorLoss {
        real: LossOutput::bce(real_logits, smoothing.real),
        fake: LossOutput::bce(fake_logits, smoothing.fake),
    }
}
