use crate::config::{FfmConfig, fill_from_distribution};
use crate::error::FfmError;
use crate::feature::FeatureVector;
use crate::field::FieldIndex;
use crate::trainer::{Trainer, TrainingReport};
use fmrec_helpers::{DiscreteSpace, Float, LossDeltaConvergence, Sample};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use rand::{Rng, SeedableRng};
use rand_distr::Distribution;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::info;

/// A field-aware factorization machine.
///
/// Row `i` of `factors` holds one block of `number_of_factors` latent values per
/// field: block `f` is feature `i`'s latent vector when it interacts with a feature
/// of field `f`.
///
/// # Example
///
/// ```
/// use ffm::{FactorInit, FfmConfig, FfmModel};
/// use fmrec_helpers::{DiscreteSpace, Sample};
/// use ndarray::array;
///
/// let space = DiscreteSpace::from_cardinalities(vec![2, 3]);
/// let config = FfmConfig::<f64>::default()
///     .with_number_of_factors(2)
///     .with_number_of_epoches(5)
///     .with_seed(7);
/// let mut model = FfmModel::prepare(config, &space).unwrap();
///
/// let samples = vec![Sample::new(array![0, 3], 1.0), Sample::new(array![1, 2], 0.0)];
/// let report = model.practice(&samples).unwrap();
/// assert_eq!(report.epochs_run(), 5);
///
/// let score = model.predict(array![0, 3].view()).unwrap();
/// assert!((0.0..=1.0).contains(&score));
/// ```
#[derive(Debug, Clone)]
pub struct FfmModel<F: Float> {
    pub(crate) config: FfmConfig<F>,
    pub(crate) fields: FieldIndex,
    pub(crate) global_bias: F,
    pub(crate) weights: Array1<F>,
    pub(crate) factors: Array2<F>,
}

impl<F: Float> FfmModel<F> {
    /// Allocates the parameters and draws the latent factors from `config.factor_init`.
    ///
    /// Bias and weights start at zero. The factor RNG is a `Xoshiro256PlusPlus` seeded
    /// with `config.seed`, or with a random seed when none is set.
    ///
    /// # Errors
    ///
    /// Returns `FfmError::InvalidModelConfiguration` for invalid hyperparameters or a
    /// malformed feature space.
    pub fn prepare(config: FfmConfig<F>, space: &DiscreteSpace) -> Result<Self, FfmError> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut model = Self::zeroed(config, space)?;
        model
            .config
            .factor_init
            .fill(model.factors.view_mut(), &mut rng)?;
        info!(
            features = model.fields.number_of_features(),
            fields = model.fields.number_of_fields(),
            factors = model.config.number_of_factors,
            seed,
            "prepared FFM parameters"
        );
        Ok(model)
    }

    /// Like [`prepare`](Self::prepare), with latent factors drawn from a caller-supplied
    /// distribution and RNG instead of `config.factor_init`.
    pub fn prepare_with_distribution<D, R>(
        config: FfmConfig<F>,
        space: &DiscreteSpace,
        distribution: &D,
        rng: &mut R,
    ) -> Result<Self, FfmError>
    where
        D: Distribution<f64> + ?Sized,
        R: Rng + ?Sized,
    {
        let mut model = Self::zeroed(config, space)?;
        fill_from_distribution(model.factors.view_mut(), distribution, rng);
        Ok(model)
    }

    /// Builds a model from explicit parameter arrays.
    ///
    /// # Errors
    ///
    /// Returns `FfmError::InvalidModelConfiguration` if the configuration or space is
    /// invalid, or if `weights`/`factors` do not have the shapes the space implies.
    pub fn from_parts(
        config: FfmConfig<F>,
        space: &DiscreteSpace,
        global_bias: F,
        weights: Array1<F>,
        factors: Array2<F>,
    ) -> Result<Self, FfmError> {
        let mut model = Self::zeroed(config, space)?;
        if weights.dim() != model.weights.dim() {
            return Err(FfmError::configuration(format!(
                "weight vector has length {}, expected {}",
                weights.len(),
                model.weights.len()
            )));
        }
        if factors.dim() != model.factors.dim() {
            return Err(FfmError::configuration(format!(
                "factor matrix has shape {:?}, expected {:?}",
                factors.dim(),
                model.factors.dim()
            )));
        }
        model.global_bias = global_bias;
        model.weights = weights;
        model.factors = factors;
        Ok(model)
    }

    fn zeroed(config: FfmConfig<F>, space: &DiscreteSpace) -> Result<Self, FfmError> {
        config.validate()?;
        let fields = FieldIndex::from_space(space)?;
        let rows = fields.number_of_features();
        let columns = config.number_of_factors * fields.number_of_fields();
        Ok(Self {
            config,
            fields,
            global_bias: F::zero(),
            weights: Array1::zeros(rows),
            factors: Array2::zeros((rows, columns)),
        })
    }

    /// Trains with the default loss-delta convergence monitor.
    ///
    /// See [`Trainer`] to supply a different hook.
    pub fn practice(&mut self, samples: &[Sample<F>]) -> Result<TrainingReport<F>, FfmError> {
        Trainer::new(self, LossDeltaConvergence::default()).run(samples)
    }

    /// Predicts the clipped score of one discrete feature tuple.
    ///
    /// # Errors
    ///
    /// Fails like [`FeatureVector::one_hot`] for malformed tuples.
    pub fn predict(&self, features: ArrayView1<usize>) -> Result<F, FfmError> {
        let vector = self.feature_vector(features)?;
        Ok(self.predict_vector(&vector))
    }

    /// Builds the sparse vector of a feature tuple against this model's field index.
    pub fn feature_vector(&self, features: ArrayView1<usize>) -> Result<FeatureVector<F>, FfmError> {
        FeatureVector::one_hot(features, &self.fields)
    }

    /// Bias, linear term and field-aware pairwise term, clipped to the score range.
    ///
    /// The pairwise sum visits every ordered pair of distinct ids, so each unordered
    /// interaction contributes twice. NaN is not clipped and propagates.
    pub(crate) fn predict_vector(&self, vector: &FeatureVector<F>) -> F {
        let mut value = self.global_bias;

        let mut linear = F::zero();
        for entry in vector {
            linear += self.weights[entry.feature] * entry.value;
        }
        value += linear;

        for k in 0..self.config.number_of_factors {
            for outer in vector {
                for inner in vector {
                    if outer.feature != inner.feature {
                        value += self.factors[[outer.feature, self.slice_start(inner.field) + k]]
                            * self.factors[[inner.feature, self.slice_start(outer.field) + k]]
                            * outer.value
                            * inner.value;
                    }
                }
            }
        }

        if value > self.config.maximum_of_score {
            value = self.config.maximum_of_score;
        }
        if value < self.config.minimum_of_score {
            value = self.config.minimum_of_score;
        }
        value
    }

    /// Column where the factor block for interactions with `field` starts.
    pub(crate) fn slice_start(&self, field: usize) -> usize {
        field * self.config.number_of_factors
    }

    /// Latent vector of `feature` specialized for interacting with `field`.
    pub fn factor_block(&self, feature: usize, field: usize) -> Result<ArrayView1<'_, F>, FfmError> {
        if feature >= self.fields.number_of_features() {
            return Err(FfmError::InvalidFeatureId {
                feature,
                number_of_features: self.fields.number_of_features(),
            });
        }
        if field >= self.fields.number_of_fields() {
            return Err(FfmError::configuration(format!(
                "field {field} does not exist, there are {} fields",
                self.fields.number_of_fields()
            )));
        }
        let start = self.slice_start(field);
        Ok(self
            .factors
            .slice(s![feature, start..start + self.config.number_of_factors]))
    }

    pub fn global_bias(&self) -> F {
        self.global_bias
    }

    pub fn weights(&self) -> ArrayView1<'_, F> {
        self.weights.view()
    }

    pub fn factors(&self) -> ArrayView2<'_, F> {
        self.factors.view()
    }

    pub fn config(&self) -> &FfmConfig<F> {
        &self.config
    }

    pub fn fields(&self) -> &FieldIndex {
        &self.fields
    }
}
