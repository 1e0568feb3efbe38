use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Slope used by leaky ReLU for non-positive inputs.
pub const LEAKY_RELU_SLOPE: f64 = 0.01;

/// Transfer function shared by every neuron of a layer.
///
/// Derivatives take the already computed output value, not the net value,
/// e.g. `sigmoid'(net) = out * (1 - out)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferFunction {
    Relu,
    LeakyRelu,
    Sigmoid,
    Tanh,
    /// Needs every net value of the layer, see [`TransferFunction::compute_layer`].
    Softmax,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax: the maximum is subtracted before exponentiating.
pub fn softmax(x: ArrayView1<f64>) -> Array1<f64> {
    let max_element = x.iter().fold(f64::NEG_INFINITY, |v, &w| v.max(w));
    let exp_each = x.map(|v| (v - max_element).exp());
    let exp_sum = exp_each.sum();
    exp_each / exp_sum
}

impl TransferFunction {
    /// Applies the function to a single net value.
    ///
    /// Softmax of a single value in isolation is always `1.0`; layers never
    /// call this for softmax and use [`TransferFunction::compute_layer`] instead.
    pub fn compute(&self, x: f64) -> f64 {
        match self {
            Self::Relu => x.max(0.0),
            Self::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_RELU_SLOPE * x
                }
            }
            Self::Sigmoid => sigmoid(x),
            Self::Tanh => x.tanh(),
            Self::Softmax => 1.0,
        }
    }

    /// Derivative with respect to the net value, expressed through the output.
    ///
    /// Softmax uses the diagonal term `out * (1 - out)` only. The off-diagonal
    /// entries of the softmax Jacobian are ignored, so the gradient is inexact
    /// for layers with more than one neuron.
    pub fn derivative(&self, output: f64) -> f64 {
        match self {
            Self::Relu => {
                if output > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::LeakyRelu => {
                if output > 0.0 {
                    1.0
                } else {
                    LEAKY_RELU_SLOPE
                }
            }
            Self::Sigmoid | Self::Softmax => output * (1.0 - output),
            Self::Tanh => 1.0 - output.powi(2),
        }
    }

    /// Applies the function to every net value of a layer.
    pub fn compute_layer(&self, net: ArrayView1<f64>) -> Array1<f64> {
        match self {
            Self::Softmax => softmax(net),
            _ => net.map(|&v| self.compute(v)),
        }
    }
}
