use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{GanError, Result};
use crate::layers::dense::Layer;
use crate::math::Shape;
use crate::network::network::{Network, Port, Role};

/// What the generator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeneratorInput {
    /// A preprocessed source image at the training resolution. During
    /// training the sampled real batch is fed in.
    Image,
    /// A standard-normal latent vector with `dim` elements.
    Latent { dim: usize },
}

impl GeneratorInput {
    pub fn shape(&self, image_shape: &Shape) -> Shape {
        match self {
            GeneratorInput::Image => image_shape.clone(),
            GeneratorInput::Latent { dim } => Shape::vector(*dim),
        }
    }
}

/// Everything needed to build one network.
///
/// - `hidden_layers`: widths of the hidden dense layers, input → output
/// - `hidden_activation` / `output_activation`: applied after each linear map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub role: Role,
    pub input_shape: Shape,
    pub output_shape: Shape,
    pub hidden_layers: Vec<usize>,
    pub hidden_activation: ActivationFunction,
    pub output_activation: ActivationFunction,
}

impl NetworkSpec {
    /// ReLU hidden layers, tanh output producing `image_shape` pixels in [-1, 1].
    pub fn generator(input_shape: Shape, image_shape: Shape, hidden_layers: Vec<usize>) -> NetworkSpec {
        NetworkSpec {
            role: Role::Generator,
            input_shape,
            output_shape: image_shape,
            hidden_layers,
            hidden_activation: ActivationFunction::ReLU,
            output_activation: ActivationFunction::Tanh,
        }
    }

    /// LeakyReLU hidden layers, one raw logit per image.
    pub fn discriminator(image_shape: Shape, hidden_layers: Vec<usize>) -> NetworkSpec {
        NetworkSpec {
            role: Role::Discriminator,
            input_shape: image_shape,
            output_shape: Shape::vector(1),
            hidden_layers,
            hidden_activation: ActivationFunction::LeakyReLU { alpha: 0.2 },
            output_activation: ActivationFunction::Identity,
        }
    }

    fn construction_error(&self, reason: String) -> GanError {
        GanError::Construction { role: self.role.to_string(), reason }
    }

    /// Rejects the spec before any parameter is allocated.
    pub fn validate(&self) -> Result<()> {
        self.input_shape.check_positive()
            .map_err(|e| self.construction_error(format!("input shape: {e}")))?;
        self.output_shape.check_positive()
            .map_err(|e| self.construction_error(format!("output shape: {e}")))?;

        match self.role {
            Role::Generator => {
                self.output_shape.check_image()
                    .map_err(|e| self.construction_error(format!("output shape: {e}")))?;
            }
            Role::Discriminator => {
                self.input_shape.check_image()
                    .map_err(|e| self.construction_error(format!("input shape: {e}")))?;
                if self.output_shape != Shape::vector(1) {
                    return Err(self.construction_error(format!(
                        "discriminator must output one logit per image, got {}",
                        self.output_shape
                    )));
                }
            }
        }

        if let Some(i) = self.hidden_layers.iter().position(|&w| w == 0) {
            return Err(self.construction_error(format!("hidden layer {i} has zero width")));
        }
        Ok(())
    }

    /// Builds the network with weights drawn from a generator seeded by `seed`.
    /// The same spec and seed always give the same parameters.
    pub fn build(&self, seed: u64) -> Result<Network> {
        self.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut widths = vec![self.input_shape.volume()];
        widths.extend_from_slice(&self.hidden_layers);
        widths.push(self.output_shape.volume());

        let last = widths.len() - 2;
        let layers = widths.windows(2).enumerate()
            .map(|(i, pair)| {
                let activation = if i == last { self.output_activation } else { self.hidden_activation };
                Layer::new(pair[1], pair[0], activation, &mut rng)
            })
            .collect();

        Ok(Network {
            role: self.role,
            input: Port { name: self.role.input_port_name(), shape: self.input_shape.clone() },
            output: Port { name: self.role.output_port_name(), shape: self.output_shape.clone() },
            layers,
        })
    }
}

/// Architecture of the whole adversarial pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GanSpec {
    /// Resolution and channel count of real and generated images.
    pub image_shape: Shape,
    pub generator_input: GeneratorInput,
    pub generator_hidden: Vec<usize>,
    pub discriminator_hidden: Vec<usize>,
}

impl Default for GanSpec {
    fn default() -> Self {
        GanSpec {
            image_shape: Shape::image(64, 64, 3),
            generator_input: GeneratorInput::Image,
            generator_hidden: vec![128, 256],
            discriminator_hidden: vec![256],
        }
    }
}

impl GanSpec {
    pub fn generator_spec(&self) -> NetworkSpec {
        NetworkSpec::generator(
            self.generator_input.shape(&self.image_shape),
            self.image_shape.clone(),
            self.generator_hidden.clone(),
        )
    }

    pub fn discriminator_spec(&self) -> NetworkSpec {
        NetworkSpec::discriminator(self.image_shape.clone(), self.discriminator_hidden.clone())
    }
}
