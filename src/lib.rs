//! Factorization-machine recommenders.
//!
//! Re-exports the shared vocabulary from `fmrec-helpers` and the algorithm crates.

pub use fmrec_helpers::{
    ConvergenceHook, DiscreteSpace, Float, HookAction, LossDeltaConvergence, Recommender, Sample,
};

pub use ffm;
