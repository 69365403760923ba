use std::path::Path;

use tracing::info;

use crate::data::dataset::ImageDataset;
use crate::error::Result;
use crate::network::spec::GanSpec;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::{GanTrainer, TrainingReport};

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains a generator/discriminator pair on every image under `dataset_dir`
/// and writes the trained generator to `model_path`.
///
/// # Errors
/// - `InvalidConfig`: the configuration or `spec.image_shape` is unusable
/// - `DatasetLoad`: no usable images under `dataset_dir`; raised before any
///   network is built
/// - `Construction`: `spec` describes an impossible network
/// - `Persistence`: the model file could not be written
///
/// The model file is only written once every step has completed, so a
/// failed run never leaves a partial model behind.
pub fn train(
    dataset_dir: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
    spec: &GanSpec,
    config: TrainConfig,
) -> Result<TrainingReport> {
    config.validate()?;
    let dataset = ImageDataset::load(dataset_dir.as_ref(), &spec.image_shape)?;
    info!(
        images = dataset.len(),
        shape = %spec.image_shape.batched_label(),
        "dataset ready"
    );

    let mut trainer = GanTrainer::new(spec.clone(), config, dataset)?;
    let report = trainer.run()?;
    trainer.save(model_path)?;
    Ok(report)
}
