use serde::{Deserialize, Serialize};

use crate::train::step_stats::StepStats;

/// Decides after each step whether training goes on. The step bound in
/// `TrainConfig` always applies as well.
pub trait StoppingPredicate: Send {
    fn should_continue(&mut self, stats: &StepStats) -> bool;
}

impl<F> StoppingPredicate for F
where
    F: FnMut(&StepStats) -> bool + Send,
{
    fn should_continue(&mut self, stats: &StepStats) -> bool {
        self(stats)
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    StepLimit,
    /// The stop flag was raised.
    Cancelled,
    /// The stopping predicate returned `false`.
    Predicate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_predicates() {
        let mut seen = 0;
        let mut p = |s: &StepStats| {
            seen += 1;
            s.step < 2
        };
        let stats = |step| StepStats { step, generator_loss: 0.7, discriminator_loss: 1.3, elapsed_ms: 0 };
        assert!(p.should_continue(&stats(0)));
        assert!(!p.should_continue(&stats(2)));
        assert_eq!(seen, 2);
    }
}
