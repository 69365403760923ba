use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully connected layer computing `activator(x · W + b)` over a batch.
///
/// Only the parameters are persisted; the forward cache and the gradient
/// accumulators are rebuilt on demand after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    pub input_size: usize,
    pub weights: Matrix, // input_size × size
    pub biases: Matrix,  // 1 × size
    pub activator: ActivationFunction,
    #[serde(skip)]
    input: Matrix,
    #[serde(skip)]
    pre_neurons: Matrix,  // pre-activation values (z = xW + b) needed for correct derivative
    #[serde(skip)]
    weights_grad: Matrix,
    #[serde(skip)]
    biases_grad: Matrix,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let weights = if activation.prefers_he_init() {
            Matrix::he(input_size, size, rng)
        } else {
            Matrix::xavier(input_size, size, rng)
        };

        Layer {
            size,
            input_size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
            input: Matrix::default(),
            pre_neurons: Matrix::default(),
            weights_grad: Matrix::zeros(input_size, size),
            biases_grad: Matrix::zeros(1, size),
        }
    }

    /// Forward pass that caches what `backward` needs.
    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let z = input.matmul(&self.weights).add_row(&self.biases);
        let a = z.map(|x| self.activator.function(x));
        self.input = input.clone();
        self.pre_neurons = z;
        a
    }

    /// Forward pass that leaves the layer untouched.
    pub fn predict(&self, input: &Matrix) -> Matrix {
        input.matmul(&self.weights)
            .add_row(&self.biases)
            .map(|x| self.activator.function(x))
    }

    /// Local error δ = ∂L/∂a ⊙ σ'(z), from the cached pre-activation.
    fn delta(&self, grad_output: &Matrix) -> Matrix {
        assert!(
            grad_output.same_shape(&self.pre_neurons),
            "backward called without a matching forward pass"
        );
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        grad_output.hadamard(&act_derivative)
    }

    /// Accumulates parameter gradients for the cached batch and returns
    /// ∂L/∂input.
    pub fn backward(&mut self, grad_output: &Matrix) -> Matrix {
        let delta = self.delta(grad_output);

        let weights_grad = self.input.transposed_matmul(&delta);
        let biases_grad = delta.sum_rows();
        if self.weights_grad.is_empty() {
            self.zero_grad();
        }
        self.weights_grad += &weights_grad;
        self.biases_grad += &biases_grad;

        delta.matmul_transposed(&self.weights)
    }

    /// Propagates ∂L/∂output to ∂L/∂input without touching the gradient
    /// accumulators.
    pub fn backward_input(&self, grad_output: &Matrix) -> Matrix {
        self.delta(grad_output).matmul_transposed(&self.weights)
    }

    pub fn zero_grad(&mut self) {
        self.weights_grad = Matrix::zeros(self.input_size, self.size);
        self.biases_grad = Matrix::zeros(1, self.size);
    }

    pub fn gradients(&self) -> (&Matrix, &Matrix) {
        (&self.weights_grad, &self.biases_grad)
    }

    /// Parameters and their accumulated gradients, for the optimizer.
    pub fn parameters_and_gradients(&mut self) -> [(&mut Matrix, &Matrix); 2] {
        if self.weights_grad.is_empty() {
            self.zero_grad();
        }
        [
            (&mut self.weights, &self.weights_grad),
            (&mut self.biases, &self.biases_grad),
        ]
    }

    pub fn parameter_count(&self) -> usize {
        self.input_size * self.size + self.size
    }

    /// Stored parameter shapes agree with the declared sizes.
    pub fn is_consistent(&self) -> bool {
        self.weights.rows == self.input_size
            && self.weights.cols == self.size
            && self.weights.data.len() == self.input_size
            && self.weights.data.iter().all(|row| row.len() == self.size)
            && self.biases.rows == 1
            && self.biases.cols == self.size
            && self.biases.data.len() == 1
            && self.biases.data[0].len() == self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Sum of outputs as a scalar loss, so ∂L/∂a is all ones.
    fn loss(layer: &Layer, input: &Matrix) -> f64 {
        layer.predict(input).data.iter().flatten().sum()
    }

    #[test]
    fn weight_gradient_matches_finite_difference() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut layer = Layer::new(3, 4, ActivationFunction::Tanh, &mut rng);
        let input = Matrix::normal(2, 4, 1.0, &mut rng);

        let out = layer.forward(&input);
        layer.backward(&Matrix::filled(out.rows, out.cols, 1.0));
        let (w_grad, b_grad) = layer.gradients();
        let (w_grad, b_grad) = (w_grad.clone(), b_grad.clone());

        let h = 1e-6;
        for (i, j) in [(0, 0), (2, 1), (3, 2)] {
            let mut plus = layer.clone();
            plus.weights.data[i][j] += h;
            let mut minus = layer.clone();
            minus.weights.data[i][j] -= h;
            let numeric = (loss(&plus, &input) - loss(&minus, &input)) / (2.0 * h);
            assert!((numeric - w_grad.data[i][j]).abs() < 1e-5);
        }

        let mut plus = layer.clone();
        plus.biases.data[0][1] += h;
        let mut minus = layer.clone();
        minus.biases.data[0][1] -= h;
        let numeric = (loss(&plus, &input) - loss(&minus, &input)) / (2.0 * h);
        assert!((numeric - b_grad.data[0][1]).abs() < 1e-5);
    }

    #[test]
    fn input_gradient_does_not_accumulate() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut layer = Layer::new(2, 3, ActivationFunction::LeakyReLU { alpha: 0.2 }, &mut rng);
        let input = Matrix::normal(4, 3, 1.0, &mut rng);
        let out = layer.forward(&input);
        let ones = Matrix::filled(out.rows, out.cols, 1.0);

        let via_input_only = layer.backward_input(&ones);
        assert!(layer.gradients().0.data.iter().flatten().all(|&g| g == 0.0));

        let via_backward = layer.backward(&ones);
        assert_eq!(via_input_only, via_backward);
    }

    #[test]
    fn backward_accumulates_until_zeroed() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut layer = Layer::new(2, 2, ActivationFunction::Identity, &mut rng);
        let input = Matrix::filled(1, 2, 1.0);
        let ones = Matrix::filled(1, 2, 1.0);

        layer.forward(&input);
        layer.backward(&ones);
        layer.backward(&ones);
        assert_eq!(layer.gradients().1.data[0], vec![2.0, 2.0]);

        layer.zero_grad();
        assert_eq!(layer.gradients().1.data[0], vec![0.0, 0.0]);
    }

    #[test]
    fn deserialized_layer_keeps_parameters() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let layer = Layer::new(3, 2, ActivationFunction::ReLU, &mut rng);
        let json = serde_json::to_string(&layer).unwrap();
        let loaded: Layer = serde_json::from_str(&json).unwrap();
        assert!(loaded.is_consistent());
        assert_eq!(loaded.weights, layer.weights);
        let x = Matrix::filled(1, 2, 0.5);
        assert_eq!(loaded.predict(&x), layer.predict(&x));
    }
}
