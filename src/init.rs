use ndarray::{Array2, ArrayViewMut2};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use serde::{Deserialize, Serialize};

/// Bound of the symmetric range `[-RANDOM_WEIGHT_RANGE, RANDOM_WEIGHT_RANGE]`
/// used by [`WeightInit::Random`].
pub const RANDOM_WEIGHT_RANGE: f64 = 1.0;

/// How edge weights are set once the topology is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeightInit {
    /// Keep the initial weight each layer was appended with.
    #[default]
    Default,
    /// Independent uniform draws from `[-1.0, 1.0]`.
    Random,
    /// Every incoming edge of a neuron gets `1 / fan_in`, the bias edge included.
    InverseFanIn,
}

impl WeightInit {
    /// Initializes the incoming weights of one layer, shaped `(fan_in, neurons)`.
    pub fn apply<R>(&self, mut weights: ArrayViewMut2<f64>, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let fan_in = weights.nrows();
        if fan_in == 0 {
            return;
        }
        match self {
            Self::Default => {}
            Self::Random => {
                let random = Array2::random_using(
                    weights.raw_dim(),
                    Uniform::new_inclusive(-RANDOM_WEIGHT_RANGE, RANDOM_WEIGHT_RANGE),
                    rng,
                );
                weights.assign(&random);
            }
            Self::InverseFanIn => weights.fill(1.0 / fan_in as f64),
        }
    }
}
