use std::fmt;

use serde::{Serialize, Deserialize};

use crate::error::{GanError, Result};
use crate::layers::dense::Layer;
use crate::math::{Matrix, Shape, Tensor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Generator,
    Discriminator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Generator => "generator",
            Role::Discriminator => "discriminator",
        }
    }

    pub fn input_port_name(&self) -> String {
        format!("{}/input", self.as_str())
    }

    pub fn output_port_name(&self) -> String {
        format!("{}/output", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named network endpoint and the per-sample shape it accepts or produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub shape: Shape,
}

impl Port {
    /// Fails with `ShapeMismatch` unless `tensor` carries exactly this
    /// port's sample shape.
    pub fn check(&self, tensor: &Tensor) -> Result<()> {
        if tensor.sample_shape() != &self.shape {
            return Err(GanError::ShapeMismatch {
                port: self.name.clone(),
                expected: self.shape.batched_label(),
                actual: format!("{:?}", tensor.dims()),
            });
        }
        Ok(())
    }
}

/// A feed-forward stack of dense layers between one input port and one
/// output port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub role: Role,
    pub input: Port,
    pub output: Port,
    pub layers: Vec<Layer>,
}

impl Network {
    /// Training forward pass; stores activations in each layer for backprop.
    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        self.input.check(input)?;
        let out = self.forward_matrix(&input.to_matrix());
        Tensor::from_matrix(&out, self.output.shape.clone())
    }

    /// Read-only forward pass for inference.
    pub fn predict(&self, input: &Tensor) -> Result<Tensor> {
        self.input.check(input)?;
        let out = self.predict_matrix(&input.to_matrix());
        Tensor::from_matrix(&out, self.output.shape.clone())
    }

    /// Forward pass on a `batch × input volume` matrix. Callers guarantee the
    /// column count; use `forward` for port-checked input.
    pub(crate) fn forward_matrix(&mut self, input: &Matrix) -> Matrix {
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current);
        }
        current
    }

    pub(crate) fn predict_matrix(&self, input: &Matrix) -> Matrix {
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.predict(&current);
        }
        current
    }

    /// Accumulates parameter gradients for the last `forward` batch and
    /// returns ∂L/∂input.
    pub fn backward(&mut self, grad_output: &Matrix) -> Matrix {
        let mut delta = grad_output.clone();
        for layer in self.layers.iter_mut().rev() {
            delta = layer.backward(&delta);
        }
        delta
    }

    /// Like `backward`, but leaves every gradient accumulator untouched. Used
    /// to push the generator's loss through the discriminator.
    pub fn backward_input(&self, grad_output: &Matrix) -> Matrix {
        let mut delta = grad_output.clone();
        for layer in self.layers.iter().rev() {
            delta = layer.backward_input(&delta);
        }
        delta
    }

    pub fn zero_grad(&mut self) {
        for layer in &mut self.layers {
            layer.zero_grad();
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Checks that ports and layers describe one consistent chain. Used on
    /// models read from disk.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.input.shape.check_positive()
            .map_err(|e| format!("input port `{}`: {e}", self.input.name))?;
        self.output.shape.check_positive()
            .map_err(|e| format!("output port `{}`: {e}", self.output.name))?;

        let first = self.layers.first().ok_or("network has no layers")?;
        if first.input_size != self.input.shape.volume() {
            return Err(format!(
                "first layer takes {} inputs but `{}` declares {}",
                first.input_size, self.input.name, self.input.shape
            ));
        }
        for (i, pair) in self.layers.windows(2).enumerate() {
            if pair[0].size != pair[1].input_size {
                return Err(format!(
                    "layer {} outputs {} values but layer {} takes {}",
                    i, pair[0].size, i + 1, pair[1].input_size
                ));
            }
        }
        if let Some(i) = self.layers.iter().position(|l| !l.is_consistent()) {
            return Err(format!("layer {i} parameters do not match its declared sizes"));
        }
        let last = &self.layers[self.layers.len() - 1];
        if last.size != self.output.shape.volume() {
            return Err(format!(
                "last layer outputs {} values but `{}` declares {}",
                last.size, self.output.name, self.output.shape
            ));
        }
        Ok(())
    }
}
