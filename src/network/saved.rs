use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{GanError, Result};
use crate::network::metadata::ModelMetadata;
use crate::network::network::{Network, Role};
use crate::network::spec::GeneratorInput;

/// Bumped whenever the on-disk layout changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk form of a trained generator: its structure, parameters and the
/// `generator/input` / `generator/output` endpoints inference binds to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedGenerator {
    pub format_version: u32,
    pub input_mode: GeneratorInput,
    #[serde(default)]
    pub metadata: ModelMetadata,
    pub network: Network,
}

impl SavedGenerator {
    pub fn new(network: Network, input_mode: GeneratorInput, metadata: ModelMetadata) -> SavedGenerator {
        SavedGenerator { format_version: FORMAT_VERSION, input_mode, metadata, network }
    }

    /// Writes pretty-printed JSON to a temporary file next to `path`, then
    /// renames it into place. On failure nothing is left at `path`.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let persistence = |source: std::io::Error| GanError::Persistence {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(persistence)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(persistence)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, self)
                .map_err(|e| persistence(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
            writer.flush().map_err(persistence)?;
        }
        tmp.as_file().sync_all().map_err(persistence)?;
        tmp.persist(path).map_err(|e| persistence(e.error))?;
        Ok(())
    }

    /// Reads and validates a model written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<SavedGenerator> {
        let path = path.as_ref();
        let load_error = |reason: String| GanError::ModelLoad { path: path.to_path_buf(), reason };

        let file = File::open(path).map_err(|e| load_error(e.to_string()))?;
        let saved: SavedGenerator = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| load_error(format!("not a valid model file: {e}")))?;
        saved.validate().map_err(load_error)?;
        Ok(saved)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.format_version
            ));
        }
        let net = &self.network;
        if net.role != Role::Generator {
            return Err(format!("model holds a {} network, not a generator", net.role));
        }
        if net.input.name != Role::Generator.input_port_name()
            || net.output.name != Role::Generator.output_port_name()
        {
            return Err(format!(
                "unexpected endpoints `{}` / `{}`",
                net.input.name, net.output.name
            ));
        }
        net.validate()?;
        net.output.shape.check_image()?;
        if let GeneratorInput::Latent { dim } = self.input_mode {
            if net.input.shape.dims() != [dim] {
                return Err(format!(
                    "latent input of {dim} values does not match input port {}",
                    net.input.shape
                ));
            }
        } else if net.input.shape != net.output.shape {
            return Err(format!(
                "image-to-image generator takes {} but produces {}",
                net.input.shape, net.output.shape
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Shape;
    use crate::network::spec::NetworkSpec;
    use tempfile::tempdir;

    fn small_generator() -> SavedGenerator {
        let net = NetworkSpec::generator(Shape::image(4, 4, 3), Shape::image(4, 4, 3), vec![6])
            .build(7)
            .unwrap();
        SavedGenerator::new(net, GeneratorInput::Image, ModelMetadata::default())
    }

    #[test]
    fn save_then_load_preserves_parameters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("gan_model.json");
        let saved = small_generator();
        saved.save_json(&path).unwrap();

        let loaded = SavedGenerator::load_json(&path).unwrap();
        assert_eq!(loaded.network.layers[0].weights, saved.network.layers[0].weights);
        assert_eq!(loaded.network.input, saved.network.input);
        assert_eq!(loaded.input_mode, GeneratorInput::Image);
    }

    #[test]
    fn missing_file_is_model_load_error() {
        let dir = tempdir().unwrap();
        let err = SavedGenerator::load_json(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, GanError::ModelLoad { .. }));
    }

    #[test]
    fn corrupt_file_is_model_load_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, b"{ \"format_version\": 1, \"network\": [").unwrap();
        let err = SavedGenerator::load_json(&path).unwrap_err();
        assert!(matches!(err, GanError::ModelLoad { .. }));
    }

    #[test]
    fn inconsistent_layers_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tampered.json");
        let mut saved = small_generator();
        saved.network.layers[1].input_size = 5;
        saved.save_json(&path).unwrap();
        let err = SavedGenerator::load_json(&path).unwrap_err();
        assert!(matches!(err, GanError::ModelLoad { .. }), "{err}");
    }

    #[test]
    fn overflowing_port_shape_is_model_load_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.json");
        let mut saved = small_generator();
        let huge = Shape::image(1usize << 33, 1usize << 33, 3);
        saved.network.input.shape = huge.clone();
        saved.network.output.shape = huge;
        saved.save_json(&path).unwrap();

        let err = SavedGenerator::load_json(&path).unwrap_err();
        assert!(matches!(err, GanError::ModelLoad { .. }), "{err}");
    }

    #[test]
    fn discriminator_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("disc.json");
        let net = NetworkSpec::discriminator(Shape::image(4, 4, 3), vec![2]).build(0).unwrap();
        SavedGenerator::new(net, GeneratorInput::Image, ModelMetadata::default())
            .save_json(&path)
            .unwrap();
        assert!(matches!(
            SavedGenerator::load_json(&path),
            Err(GanError::ModelLoad { .. })
        ));
    }

    #[test]
    fn unwritable_destination_is_persistence_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let err = small_generator().save_json(blocker.join("model.json")).unwrap_err();
        assert!(matches!(err, GanError::Persistence { .. }));
        assert!(!blocker.join("model.json").exists());
    }
}
