use ndarray::{ArrayView1, ArrayViewMut2, Zip};

/// Plain gradient descent on one layer's incoming edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientDescent {
    learning_rate: f64,
}

impl GradientDescent {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// `weights[[i, j]] -= learning_rate * inputs[i] * deltas[j]`, where
    /// `inputs` are the predecessor outputs (bias last) and `deltas` the
    /// error deltas of the layer's neurons.
    pub fn update(
        &self,
        mut weights: ArrayViewMut2<f64>,
        inputs: ArrayView1<f64>,
        deltas: ArrayView1<f64>,
    ) {
        assert_eq!(weights.dim(), (inputs.len(), deltas.len()));
        Zip::indexed(&mut weights).for_each(|(i, j), w| {
            *w -= self.learning_rate * inputs[i] * deltas[j];
        });
    }
}
