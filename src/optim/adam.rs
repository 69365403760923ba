use serde::{Deserialize, Serialize};

use crate::{math::matrix::Matrix, network::network::Network};

/// Adam hyperparameters. Defaults are the usual GAN settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        AdamConfig { learning_rate: 2e-4, beta1: 0.5, beta2: 0.999, epsilon: 1e-8 }
    }
}

/// First and second moment estimates for one parameter matrix.
#[derive(Debug, Clone)]
struct Moments {
    m: Matrix,
    v: Matrix,
}

impl Moments {
    fn for_param(param: &Matrix) -> Moments {
        Moments {
            m: Matrix::zeros(param.rows, param.cols),
            v: Matrix::zeros(param.rows, param.cols),
        }
    }
}

/// Adam optimizer bound to one network's parameter layout.
///
/// Each network gets its own instance; stepping only ever touches the
/// network passed in and this instance's moment state.
#[derive(Debug, Clone)]
pub struct Adam {
    pub config: AdamConfig,
    t: u64,
    moments: Vec<Moments>, // weights then biases, per layer
}

impl Adam {
    pub fn new(config: AdamConfig, network: &Network) -> Adam {
        let moments = network.layers.iter()
            .flat_map(|layer| [Moments::for_param(&layer.weights), Moments::for_param(&layer.biases)])
            .collect();
        Adam { config, t: 0, moments }
    }

    /// Number of updates applied so far.
    pub fn step_count(&self) -> u64 {
        self.t
    }

    /// One bias-corrected update from the gradients accumulated in `network`:
    ///   m ← β1·m + (1−β1)·g
    ///   v ← β2·v + (1−β2)·g²
    ///   θ ← θ − lr·√(1−β2ᵗ)/(1−β1ᵗ) · m / (√v + ε)
    pub fn step(&mut self, network: &mut Network) {
        assert_eq!(
            self.moments.len(),
            network.layers.len() * 2,
            "optimizer was built for a different network"
        );
        self.t += 1;

        let AdamConfig { learning_rate, beta1, beta2, epsilon } = self.config;
        let t = self.t as i32;
        let lr_t = learning_rate * (1.0 - beta2.powi(t)).sqrt() / (1.0 - beta1.powi(t));

        let params = network.layers.iter_mut().flat_map(|layer| layer.parameters_and_gradients());
        for ((param, grad), state) in params.zip(self.moments.iter_mut()) {
            assert!(param.same_shape(&state.m), "optimizer was built for a different network");
            for (((p_row, g_row), m_row), v_row) in param.data.iter_mut()
                .zip(&grad.data)
                .zip(state.m.data.iter_mut())
                .zip(state.v.data.iter_mut())
            {
                for (((p, &g), m), v) in p_row.iter_mut()
                    .zip(g_row)
                    .zip(m_row.iter_mut())
                    .zip(v_row.iter_mut())
                {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *p -= lr_t * *m / (v.sqrt() + epsilon);
                }
            }
        }
    }
}
