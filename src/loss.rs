use ndarray::{ArrayView1, Zip};
use serde::{Deserialize, Serialize};

/// Smallest output value passed to the logarithm in cross-entropy.
pub const CROSS_ENTROPY_EPSILON: f64 = 1e-12;

/// Loss function of the output layer. Arguments are `(target, output)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LossFunction {
    /// `0.5 * (target - output)^2`
    MeanSquaredError,
    /// `-target * ln(output)`
    CrossEntropy,
}

impl LossFunction {
    pub fn compute(&self, target: f64, output: f64) -> f64 {
        match self {
            Self::MeanSquaredError => 0.5 * (target - output).powi(2),
            Self::CrossEntropy => -target * output.clamp(CROSS_ENTROPY_EPSILON, 1.0).ln(),
        }
    }

    /// Derivative of the loss with respect to the output value.
    pub fn derivative(&self, target: f64, output: f64) -> f64 {
        match self {
            Self::MeanSquaredError => -(target - output),
            Self::CrossEntropy => output - target,
        }
    }

    /// Sum of the loss over every output neuron.
    pub fn total(&self, targets: ArrayView1<f64>, outputs: ArrayView1<f64>) -> f64 {
        assert_eq!(targets.len(), outputs.len());
        Zip::from(&targets)
            .and(&outputs)
            .fold(0.0, |loss, &t, &y| loss + self.compute(t, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn compute_mse() {
        let loss = LossFunction::MeanSquaredError;
        assert_relative_eq!(0.125, loss.compute(1.0, 0.5));
        assert_relative_eq!(0.5, loss.derivative(0.0, 0.5));
        assert_relative_eq!(-0.5, loss.derivative(1.0, 0.5));
    }

    #[test]
    fn total_mse() {
        let targets = arr1(&[1.0, 0.0, 0.0]);
        let outputs = arr1(&[1.0, 0.5, -0.1]);
        let total = LossFunction::MeanSquaredError.total(targets.view(), outputs.view());
        assert_relative_eq!(0.13, total, epsilon = 1e-12);
    }

    #[test]
    fn compute_cross_entropy() {
        let loss = LossFunction::CrossEntropy;
        assert_relative_eq!(-(0.7f64.ln()), loss.compute(1.0, 0.7));
        assert_relative_eq!(0.0, loss.compute(0.0, 0.7));
        assert_relative_eq!(-0.3, loss.derivative(1.0, 0.7), epsilon = 1e-12);
    }

    #[test]
    fn cross_entropy_of_zero_output_is_finite() {
        let value = LossFunction::CrossEntropy.compute(1.0, 0.0);
        assert!(value.is_finite());
        assert_relative_eq!(-(CROSS_ENTROPY_EPSILON.ln()), value);
    }
}
