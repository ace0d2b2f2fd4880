//! Hyperparameters of the field-aware factorization machine.

use crate::error::FfmError;
use fmrec_helpers::Float;
use ndarray::ArrayViewMut2;
use rand::Rng;
use rand::distr::Uniform;
use rand_distr::{Distribution, Normal};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Strategy for drawing the initial latent factors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub enum FactorInit {
    /// Gaussian with the given mean and standard deviation.
    Normal { mean: f64, std: f64 },
    /// Uniform over `[low, high)`.
    Uniform { low: f64, high: f64 },
    /// Every factor starts at the same value.
    Constant(f64),
}

impl Default for FactorInit {
    fn default() -> Self {
        FactorInit::Normal {
            mean: 0.0,
            std: 0.1,
        }
    }
}

impl FactorInit {
    fn validate(&self) -> Result<(), FfmError> {
        match *self {
            FactorInit::Normal { mean, std } => {
                if !mean.is_finite() || !std.is_finite() || std < 0.0 {
                    return Err(FfmError::configuration(format!(
                        "normal initializer needs a finite mean and a non-negative std, got mean={mean}, std={std}"
                    )));
                }
            }
            FactorInit::Uniform { low, high } => {
                if !low.is_finite() || !high.is_finite() || low >= high {
                    return Err(FfmError::configuration(format!(
                        "uniform initializer needs finite low < high, got [{low}, {high})"
                    )));
                }
            }
            FactorInit::Constant(value) => {
                if !value.is_finite() {
                    return Err(FfmError::configuration(format!(
                        "constant initializer must be finite, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Fills `target` in row-major order.
    pub fn fill<F, R>(&self, target: ArrayViewMut2<F>, rng: &mut R) -> Result<(), FfmError>
    where
        F: Float,
        R: Rng + ?Sized,
    {
        self.validate()?;
        match *self {
            FactorInit::Normal { mean, std } => {
                let normal = Normal::new(mean, std)
                    .map_err(|e| FfmError::configuration(format!("normal initializer: {e}")))?;
                fill_from_distribution(target, &normal, rng);
            }
            FactorInit::Uniform { low, high } => {
                let uniform = Uniform::new(low, high)
                    .map_err(|e| FfmError::configuration(format!("uniform initializer: {e}")))?;
                fill_from_distribution(target, &uniform, rng);
            }
            FactorInit::Constant(value) => {
                let mut target = target;
                target.fill(F::lossy_from(value));
            }
        }
        Ok(())
    }
}

/// Fills `target` in row-major order with draws from `distribution`.
pub fn fill_from_distribution<F, D, R>(mut target: ArrayViewMut2<F>, distribution: &D, rng: &mut R)
where
    F: Float,
    D: Distribution<f64> + ?Sized,
    R: Rng + ?Sized,
{
    for value in target.iter_mut() {
        *value = F::lossy_from(distribution.sample(rng));
    }
}

/// Configuration for an [`FfmModel`](crate::FfmModel).
///
/// # Example
///
/// ```
/// use ffm::{FactorInit, FfmConfig};
///
/// let config = FfmConfig::<f64>::default()
///     .with_number_of_factors(4)
///     .with_learn_rate(0.05)
///     .with_score_range(1.0, 5.0)
///     .with_factor_init(FactorInit::Uniform { low: -0.01, high: 0.01 })
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", default)
)]
pub struct FfmConfig<F: Float> {
    /// Step size of every SGD update.
    pub learn_rate: F,
    pub bias_regularization: F,
    pub weight_regularization: F,
    pub factor_regularization: F,
    /// Latent dimension per (feature, partner field) block.
    pub number_of_factors: usize,
    pub number_of_epoches: usize,
    pub minimum_of_score: F,
    pub maximum_of_score: F,
    /// Whether a `Stop` from the convergence hook ends training early.
    pub early_stop: bool,
    pub factor_init: FactorInit,
    /// Seed for factor initialization; a random seed is drawn when absent.
    pub seed: Option<u64>,
}

impl<F: Float> Default for FfmConfig<F> {
    fn default() -> Self {
        Self {
            learn_rate: F::lossy_from(0.01),
            bias_regularization: F::lossy_from(0.01),
            weight_regularization: F::lossy_from(0.01),
            factor_regularization: F::lossy_from(0.01),
            number_of_factors: 10,
            number_of_epoches: 100,
            minimum_of_score: F::zero(),
            maximum_of_score: F::one(),
            early_stop: false,
            factor_init: FactorInit::default(),
            seed: None,
        }
    }
}

impl<F: Float> FfmConfig<F> {
    pub fn with_learn_rate(mut self, learn_rate: F) -> Self {
        self.learn_rate = learn_rate;
        self
    }

    /// Sets bias, weight and factor regularization at once.
    pub fn with_regularization(mut self, bias: F, weight: F, factor: F) -> Self {
        self.bias_regularization = bias;
        self.weight_regularization = weight;
        self.factor_regularization = factor;
        self
    }

    pub fn with_number_of_factors(mut self, number_of_factors: usize) -> Self {
        self.number_of_factors = number_of_factors;
        self
    }

    pub fn with_number_of_epoches(mut self, number_of_epoches: usize) -> Self {
        self.number_of_epoches = number_of_epoches;
        self
    }

    pub fn with_score_range(mut self, minimum: F, maximum: F) -> Self {
        self.minimum_of_score = minimum;
        self.maximum_of_score = maximum;
        self
    }

    pub fn with_early_stop(mut self, early_stop: bool) -> Self {
        self.early_stop = early_stop;
        self
    }

    pub fn with_factor_init(mut self, factor_init: FactorInit) -> Self {
        self.factor_init = factor_init;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks the hyperparameters before any parameter is allocated.
    ///
    /// # Errors
    ///
    /// Returns `FfmError::InvalidModelConfiguration` for zero factors, an inverted or
    /// non-finite score range, a negative or non-finite learn rate or regularization,
    /// or invalid initializer parameters.
    pub fn validate(&self) -> Result<(), FfmError> {
        if self.number_of_factors == 0 {
            return Err(FfmError::configuration("number_of_factors must be positive"));
        }
        let rates = [
            ("learn_rate", self.learn_rate),
            ("bias_regularization", self.bias_regularization),
            ("weight_regularization", self.weight_regularization),
            ("factor_regularization", self.factor_regularization),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < F::zero() {
                return Err(FfmError::configuration(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !self.minimum_of_score.is_finite()
            || !self.maximum_of_score.is_finite()
            || self.minimum_of_score > self.maximum_of_score
        {
            return Err(FfmError::configuration(format!(
                "score range [{}, {}] is not a finite, ordered interval",
                self.minimum_of_score, self.maximum_of_score
            )));
        }
        self.factor_init.validate()
    }
}
