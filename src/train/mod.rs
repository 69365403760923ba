pub mod trainer;
pub mod step_stats;
pub mod stopping;
pub mod train_config;
pub mod loop_fn;

pub use trainer::{GanTrainer, TrainingReport, TrainingState};
pub use step_stats::StepStats;
pub use stopping::{StopReason, StoppingPredicate};
pub use train_config::TrainConfig;
pub use loop_fn::train;
