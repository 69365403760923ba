use crate::activation::activation::sigmoid;

/// Binary cross-entropy on raw logits (sigmoid folded in).
pub struct BceWithLogitsLoss;

impl BceWithLogitsLoss {
    /// Scalar loss: mean(max(x, 0) − x·y + ln(1 + e^−|x|)).
    ///
    /// Algebraically equal to −mean(y·ln σ(x) + (1−y)·ln(1−σ(x))) but never
    /// takes the log of zero.
    pub fn loss(logits: &[f64], targets: &[f64]) -> f64 {
        let n = logits.len() as f64;
        logits.iter().zip(targets.iter())
            .map(|(&x, &y)| x.max(0.0) - x * y + (-x.abs()).exp().ln_1p())
            .sum::<f64>() / n
    }

    /// Per-logit gradient of the mean loss: (σ(x) − y) / n
    pub fn derivative(logits: &[f64], targets: &[f64]) -> Vec<f64> {
        let n = logits.len() as f64;
        logits.iter().zip(targets.iter())
            .map(|(&x, &y)| (sigmoid(x) - y) / n)
            .collect()
    }
}
