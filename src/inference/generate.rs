use std::path::Path;

use image::DynamicImage;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::data::image_adapter::{from_tensor, postprocess, to_tensor};
use crate::error::{GanError, Result};
use crate::math::{Matrix, Shape, Tensor};
use crate::network::saved::SavedGenerator;
use crate::network::spec::GeneratorInput;

/// A validated generator, ready for any number of forward passes.
///
/// Inference never mutates the model, so one `LoadedGenerator` can serve
/// concurrent callers by shared reference.
#[derive(Debug, Clone)]
pub struct LoadedGenerator {
    saved: SavedGenerator,
}

impl LoadedGenerator {
    pub fn load(path: impl AsRef<Path>) -> Result<LoadedGenerator> {
        let path = path.as_ref();
        let saved = SavedGenerator::load_json(path)?;
        debug!(
            path = %path.display(),
            input = %saved.network.input.shape,
            output = %saved.network.output.shape,
            "loaded generator"
        );
        Ok(LoadedGenerator { saved })
    }

    pub fn input_shape(&self) -> &Shape {
        &self.saved.network.input.shape
    }

    pub fn output_shape(&self) -> &Shape {
        &self.saved.network.output.shape
    }

    pub fn input_mode(&self) -> GeneratorInput {
        self.saved.input_mode
    }

    pub fn saved(&self) -> &SavedGenerator {
        &self.saved
    }

    /// One forward pass from `generator/input` to `generator/output`.
    pub fn run(&self, input: &Tensor) -> Result<Tensor> {
        self.saved.network.predict(input)
    }

    /// Resizes `image` to the trained resolution, runs the generator once and
    /// decodes the result at that same resolution.
    pub fn generate(&self, image: &DynamicImage) -> Result<DynamicImage> {
        if let GeneratorInput::Latent { .. } = self.saved.input_mode {
            let port = &self.saved.network.input;
            return Err(GanError::ShapeMismatch {
                port: port.name.clone(),
                expected: port.shape.batched_label(),
                actual: format!("an image of {}x{}", image.width(), image.height()),
            });
        }
        let input = to_tensor(image, self.input_shape())?;
        from_tensor(&self.run(&input)?)
    }

    /// Generates one image from a latent vector drawn with `seed`.
    pub fn sample(&self, seed: u64) -> Result<DynamicImage> {
        let port = &self.saved.network.input;
        let dim = match self.saved.input_mode {
            GeneratorInput::Latent { dim } => dim,
            GeneratorInput::Image => {
                return Err(GanError::ShapeMismatch {
                    port: port.name.clone(),
                    expected: port.shape.batched_label(),
                    actual: "a latent vector".to_string(),
                })
            }
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let z = Matrix::normal(1, dim, 1.0, &mut rng);
        let input = Tensor::from_matrix(&z, port.shape.clone())?;
        from_tensor(&self.run(&input)?)
    }
}

/// Loads the model at `model_path` and runs it once on `image`.
pub fn generate_image(model_path: impl AsRef<Path>, image: &DynamicImage) -> Result<DynamicImage> {
    LoadedGenerator::load(model_path)?.generate(image)
}

/// Reads `input`, generates, and writes a `size × size` result to `output`.
/// The format follows `output`'s extension.
///
/// The model is loaded before anything else, so a bad model path leaves no
/// output file.
pub fn generate_file(
    input: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    size: u32,
) -> Result<()> {
    let generator = LoadedGenerator::load(model_path)?;
    let input = input.as_ref();
    let image = image::open(input).map_err(|source| GanError::Image {
        path: input.to_path_buf(),
        source,
    })?;
    let generated = generator.generate(&image)?;
    save_image(&postprocess(&generated, size).into(), output.as_ref())
}

/// Samples a latent model with `seed` and writes a `size × size` result to
/// `output`.
pub fn sample_file(
    model_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    seed: u64,
    size: u32,
) -> Result<()> {
    let generated = LoadedGenerator::load(model_path)?.sample(seed)?;
    save_image(&postprocess(&generated, size).into(), output.as_ref())
}

fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    image.save(path).map_err(|source| GanError::Image {
        path: path.to_path_buf(),
        source,
    })
}
