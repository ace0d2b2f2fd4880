use ndarray::Array1;
use crate::Float;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Represents a single training or prediction instance.
///
/// `features` holds one flattened discrete feature id per field, in field order.
/// `mark` is the target (rating, click, ...).
///
/// F: The float type for the mark (e.g., f32, f64).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Sample<F>
where
    F: Float,
{
    pub features: Array1<usize>,
    pub mark: F,
}

impl<F> Sample<F>
where
    F: Float,
{
    pub fn new(features: Array1<usize>, mark: F) -> Self {
        Sample { features, mark }
    }

    /// Number of discrete features carried by this sample.
    pub fn order(&self) -> usize {
        self.features.len()
    }
}

/// Shape of the discrete feature space produced by the dataset loader.
///
/// `cardinalities[f]` is the number of categories of field `f`. Fields are laid out
/// contiguously, so the sum of the cardinalities is expected to match
/// `number_of_features`; consumers are responsible for checking that.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct DiscreteSpace {
    pub number_of_features: usize,
    pub cardinalities: Vec<usize>,
}

impl DiscreteSpace {
    pub fn new(number_of_features: usize, cardinalities: Vec<usize>) -> Self {
        DiscreteSpace {
            number_of_features,
            cardinalities,
        }
    }

    /// Builds a space whose feature count is derived from the cardinalities.
    pub fn from_cardinalities(cardinalities: Vec<usize>) -> Self {
        let number_of_features = cardinalities.iter().sum();
        DiscreteSpace {
            number_of_features,
            cardinalities,
        }
    }

    pub fn number_of_fields(&self) -> usize {
        self.cardinalities.len()
    }
}
