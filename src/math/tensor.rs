use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GanError, Result};
use crate::math::matrix::Matrix;

/// Per-sample dimensions, without the batch axis: `[64, 64, 3]` for an RGB
/// image (height, width, channels) or `[100]` for a latent vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn new(dims: Vec<usize>) -> Shape {
        Shape(dims)
    }

    pub fn image(height: usize, width: usize, channels: usize) -> Shape {
        Shape(vec![height, width, channels])
    }

    pub fn vector(len: usize) -> Shape {
        Shape(vec![len])
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Number of scalars in one sample, or `None` if it overflows `usize`.
    pub fn checked_volume(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Number of scalars in one sample. Saturates at `usize::MAX`; shapes
    /// that passed `check_positive` never reach it.
    pub fn volume(&self) -> usize {
        self.checked_volume().unwrap_or(usize::MAX)
    }

    /// Rank at least one, every dimension positive, volume addressable.
    pub fn check_positive(&self) -> std::result::Result<(), String> {
        if self.0.is_empty() {
            return Err("shape has no dimensions".to_string());
        }
        if let Some(axis) = self.0.iter().position(|&d| d == 0) {
            return Err(format!("dimension {axis} of {self} is zero"));
        }
        if self.checked_volume().is_none() {
            return Err(format!("shape {self} has more elements than fit in memory"));
        }
        Ok(())
    }

    /// An `[height, width, channels]` shape with 1 (grayscale) or 3 (RGB)
    /// channels. Returns `(height, width, channels)`.
    pub fn check_image(&self) -> std::result::Result<(usize, usize, usize), String> {
        self.check_positive()?;
        let (h, w, c) = self.as_image()
            .ok_or_else(|| format!("image shape must have rank 3 (H, W, C), got {self}"))?;
        if !matches!(c, 1 | 3) {
            return Err(format!("image shape must have 1 or 3 channels, got {self}"));
        }
        Ok((h, w, c))
    }

    /// `(height, width, channels)` for rank-3 shapes.
    pub fn as_image(&self) -> Option<(usize, usize, usize)> {
        match self.0.as_slice() {
            &[h, w, c] => Some((h, w, c)),
            _ => None,
        }
    }

    /// Renders the shape with a symbolic leading batch axis.
    pub fn batched_label(&self) -> String {
        let mut label = String::from("[batch");
        for d in &self.0 {
            label.push_str(&format!(", {d}"));
        }
        label.push(']');
        label
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// A batch of samples: full shape `[batch, ..sample_shape]`, flat data.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    batch: usize,
    sample_shape: Shape,
    data: Vec<f64>,
}

impl Tensor {
    pub fn new(batch: usize, sample_shape: Shape, data: Vec<f64>) -> Result<Tensor> {
        let expected = sample_shape.checked_volume().and_then(|v| v.checked_mul(batch));
        if expected != Some(data.len()) {
            return Err(GanError::ShapeMismatch {
                port: "tensor".to_string(),
                expected: format!("{batch} x {sample_shape} values"),
                actual: format!("{} values", data.len()),
            });
        }
        Ok(Tensor { batch, sample_shape, data })
    }

    /// Rows of `matrix` become batch elements.
    pub fn from_matrix(matrix: &Matrix, sample_shape: Shape) -> Result<Tensor> {
        if matrix.cols != sample_shape.volume() {
            return Err(GanError::ShapeMismatch {
                port: "tensor".to_string(),
                expected: sample_shape.batched_label(),
                actual: format!("[{}, {}]", matrix.rows, matrix.cols),
            });
        }
        let data = matrix.data.iter().flatten().copied().collect();
        Ok(Tensor { batch: matrix.rows, sample_shape, data })
    }

    pub fn to_matrix(&self) -> Matrix {
        let cols = self.sample_shape.volume();
        if cols == 0 {
            return Matrix::zeros(self.batch, 0);
        }
        Matrix::from_data(self.data.chunks(cols).map(|c| c.to_vec()).collect())
    }

    pub fn batch_size(&self) -> usize {
        self.batch
    }

    pub fn sample_shape(&self) -> &Shape {
        &self.sample_shape
    }

    /// Full shape including the batch axis.
    pub fn dims(&self) -> Vec<usize> {
        let mut dims = vec![self.batch];
        dims.extend_from_slice(self.sample_shape.dims());
        dims
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Values of batch element `index`.
    pub fn sample(&self, index: usize) -> &[f64] {
        let n = self.sample_shape.volume();
        &self.data[index * n..(index + 1) * n]
    }
}
