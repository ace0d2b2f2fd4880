use ndarray::NdFloat;

// Include submodules
mod common;
mod convergence;
mod recommender;

// Re-export types from submodules
pub use common::{DiscreteSpace, Sample};
pub use convergence::{ConvergenceHook, HookAction, LossDeltaConvergence};
pub use recommender::Recommender;

/// Scalar type of model parameters and scores.
pub trait Float: NdFloat {
    /// Narrows an `f64` (a sampled value or a literal constant) into `Self`.
    fn lossy_from(x: f64) -> Self;
}

impl Float for f32 {
    fn lossy_from(x: f64) -> Self {
        x as f32
    }
}

impl Float for f64 {
    fn lossy_from(x: f64) -> Self {
        x
    }
}
