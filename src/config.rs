use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GanError, Result};
use crate::network::spec::GanSpec;
use crate::train::train_config::TrainConfig;

/// A whole run in one JSON document: what to build and how to train it.
///
/// ```json
/// {
///   "architecture": { "image_shape": [64, 64, 3], "generator_input": { "type": "latent", "dim": 100 } },
///   "training": { "steps": 2000, "batch_size": 32, "seed": 42 }
/// }
/// ```
///
/// Every field may be omitted and falls back to its default.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub architecture: GanSpec,
    pub training: TrainConfig,
}

impl PipelineConfig {
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let persistence = |source: std::io::Error| GanError::Persistence {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::create(path).map_err(persistence)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| persistence(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }

    /// Reads a config and checks that it describes a trainable setup.
    pub fn load_json(path: impl AsRef<Path>) -> Result<PipelineConfig> {
        let path = path.as_ref();
        let invalid = |reason: String| GanError::InvalidConfig(format!("{}: {reason}", path.display()));

        let file = std::fs::File::open(path).map_err(|e| invalid(e.to_string()))?;
        let config: PipelineConfig = serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| invalid(e.to_string()))?;
        config.training.validate()?;
        config.architecture.generator_spec().validate()?;
        config.architecture.discriminator_spec().validate()?;
        Ok(config)
    }
}
