//! Field-aware factorization machine trained with online SGD.
//!
//! A sample is one discrete feature id per field. The model scores it as
//! `bias + sum of weights + field-aware pairwise interactions`, where each feature
//! keeps a separate latent vector for every field it can interact with.

mod config;
mod error;
mod feature;
mod field;
mod model;
mod recommender;
mod trainer;

pub use config::{FactorInit, FfmConfig, fill_from_distribution};
pub use error::FfmError;
pub use feature::{FeatureEntry, FeatureVector};
pub use field::FieldIndex;
pub use model::FfmModel;
pub use trainer::{Trainer, TrainingReport, TrainingState};
