use crate::{DiscreteSpace, Float, Sample};
use ndarray::ArrayView1;
use std::error::Error;

/// Common interface for the factorization-machine recommenders.
///
/// Each variant owns its own parameters; the trait only fixes the lifecycle:
/// `prepare` allocates and initializes, `practice` trains in place,
/// `predict` scores a discrete feature tuple with the current parameters.
pub trait Recommender<F: Float>: Sized {
    /// Hyperparameters accepted by `prepare`.
    type Config;
    /// Summary returned by a training run.
    type Report;
    type Error: Error;

    /// Allocate and initialize parameters for the given feature space.
    fn prepare(config: Self::Config, space: &DiscreteSpace) -> Result<Self, Self::Error>;

    /// Train on `samples`, in order, mutating the parameters in place.
    fn practice(&mut self, samples: &[Sample<F>]) -> Result<Self::Report, Self::Error>;

    /// Predict the score of one discrete feature tuple.
    fn predict(&self, features: ArrayView1<usize>) -> Result<F, Self::Error>;
}
