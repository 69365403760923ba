pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod train;
pub mod inference;
pub mod config;

// Convenience re-exports
pub use error::{GanError, Result};
pub use math::{Matrix, Shape, Tensor};
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{GanSpec, GeneratorInput, Network, NetworkSpec, SavedGenerator};
pub use data::{load_dataset, ImageDataset};
pub use train::{train, GanTrainer, StepStats, StopReason, TrainConfig, TrainingReport};
pub use inference::{generate_file, generate_image, sample_file, LoadedGenerator};
pub use config::PipelineConfig;
