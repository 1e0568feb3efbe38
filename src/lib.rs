//! A small feed-forward neural network built as a layered, weighted graph of
//! neurons, trained with gradient-descent backpropagation.

pub mod activation;
pub mod data;
pub mod error;
pub mod graph;
pub mod init;
pub mod layer;
pub mod loss;
pub mod network;
pub mod neuron;
pub mod optimizer;
pub mod persist;
pub mod training;

pub use activation::TransferFunction;
pub use data::{DataSet, Example};
pub use error::{Error, Result};
pub use init::WeightInit;
pub use loss::LossFunction;
pub use network::Network;
pub use training::{TrainingPolicy, TrainingReport};

/// Compares two 1D arrays element-wise with `approx::assert_relative_eq!`.
/// Extra arguments such as `epsilon = 1e-12` are forwarded.
#[macro_export]
macro_rules! assert_rel_eq_arr1 {
    ($actual:expr, $expected:expr $(, $opt:ident = $val:expr)*) => {
        assert_eq!($actual.shape(), $expected.shape());
        ndarray::Zip::from(&$actual)
            .and(&$expected)
            .for_each(|v, w| {
                assert_relative_eq!(v, w $(, $opt = $val)*);
            });
    };
}
