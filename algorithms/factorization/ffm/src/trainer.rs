//! Online SGD over field-aware latent factors.
//!
//! Samples are visited in dataset order, one at a time; every update is applied to
//! the shared parameters before the next sample's forward pass.

use crate::error::FfmError;
use crate::feature::FeatureVector;
use crate::model::FfmModel;
use fmrec_helpers::{ConvergenceHook, Float, Sample};
use tracing::info;

/// Where a training run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingState {
    Running,
    /// The hook asked to stop after `epoch` and early stopping is enabled.
    Converged { epoch: usize },
    /// All `number_of_epoches` epochs ran.
    ExhaustedEpochs,
}

/// Outcome of [`Trainer::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport<F: Float> {
    /// Halved loss of each completed epoch, in order.
    pub losses: Vec<F>,
    pub state: TrainingState,
}

impl<F: Float> TrainingReport<F> {
    pub fn epochs_run(&self) -> usize {
        self.losses.len()
    }

    pub fn final_loss(&self) -> Option<F> {
        self.losses.last().copied()
    }

    pub fn converged(&self) -> bool {
        matches!(self.state, TrainingState::Converged { .. })
    }
}

/// Runs SGD epochs over a model it borrows exclusively for the duration of the run.
///
/// # Example
///
/// ```
/// use ffm::{FfmConfig, FfmModel, Trainer, TrainingState};
/// use fmrec_helpers::{DiscreteSpace, LossDeltaConvergence, Sample};
/// use ndarray::array;
///
/// let space = DiscreteSpace::from_cardinalities(vec![2, 2]);
/// let config = FfmConfig::<f64>::default()
///     .with_number_of_epoches(50)
///     .with_early_stop(true)
///     .with_seed(1);
/// let mut model = FfmModel::prepare(config, &space).unwrap();
/// let samples = vec![Sample::new(array![0, 2], 1.0), Sample::new(array![1, 3], 0.0)];
///
/// let mut hook = LossDeltaConvergence::new(1e-3);
/// let report = Trainer::new(&mut model, &mut hook).run(&samples).unwrap();
/// assert!(report.epochs_run() <= 50);
/// assert_ne!(report.state, TrainingState::Running);
/// ```
pub struct Trainer<'m, F, H>
where
    F: Float,
    H: ConvergenceHook<F>,
{
    model: &'m mut FfmModel<F>,
    hook: H,
    state: TrainingState,
}

impl<'m, F, H> Trainer<'m, F, H>
where
    F: Float,
    H: ConvergenceHook<F>,
{
    pub fn new(model: &'m mut FfmModel<F>, hook: H) -> Self {
        Self {
            model,
            hook,
            state: TrainingState::Running,
        }
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// Trains on `samples` until the hook stops it or the epochs run out.
    ///
    /// Every sample is converted to its feature vector before the first epoch, so a
    /// malformed sample fails the run without touching the parameters.
    ///
    /// # Errors
    ///
    /// `FfmError::InvalidModelConfiguration` for a sample whose width differs from the
    /// number of fields, `FfmError::InvalidFeatureId` for an out-of-range id.
    pub fn run(&mut self, samples: &[Sample<F>]) -> Result<TrainingReport<F>, FfmError> {
        let vectors = samples
            .iter()
            .map(|sample| -> Result<(FeatureVector<F>, F), FfmError> {
                let vector = self.model.feature_vector(sample.features.view())?;
                Ok((vector, sample.mark))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let epochs = self.model.config.number_of_epoches;
        info!(samples = vectors.len(), epochs, "starting FFM training");

        self.state = TrainingState::Running;
        let mut losses = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            let loss = self.epoch(&vectors);
            losses.push(loss);
            let action = self.hook.after_epoch(epoch, loss);
            if action.is_stop() && self.model.config.early_stop {
                self.state = TrainingState::Converged { epoch };
                break;
            }
        }
        if self.state == TrainingState::Running {
            self.state = TrainingState::ExhaustedEpochs;
        }

        info!(
            epochs_run = losses.len(),
            state = ?self.state,
            loss = ?losses.last(),
            "finished FFM training"
        );
        Ok(TrainingReport {
            losses,
            state: self.state,
        })
    }

    /// One pass over the samples; returns half the accumulated loss.
    fn epoch(&mut self, vectors: &[(FeatureVector<F>, F)]) -> F {
        let mut total = F::zero();
        for (vector, mark) in vectors {
            self.step(vector, *mark, &mut total);
        }
        total * F::lossy_from(0.5)
    }

    /// Forward pass, then the regularized updates of bias, weights and factors.
    ///
    /// Factor updates for feature `i` read and write the block of `i`'s own field,
    /// on both `i` and its partners, while the forward pass reads partner-field
    /// blocks. The loss adds each penalty with the value before its update.
    fn step(&mut self, vector: &FeatureVector<F>, mark: F, total: &mut F) {
        let error = self.model.predict_vector(vector) - mark;
        *total += error * error;

        let model = &mut *self.model;
        let learn_rate = model.config.learn_rate;
        let bias_regularization = model.config.bias_regularization;
        let weight_regularization = model.config.weight_regularization;
        let factor_regularization = model.config.factor_regularization;
        let number_of_factors = model.config.number_of_factors;

        *total += bias_regularization * model.global_bias * model.global_bias;
        let gradient = error + bias_regularization * model.global_bias;
        model.global_bias -= learn_rate * gradient;

        for outer in vector {
            let old_weight = model.weights[outer.feature];
            let gradient = error * outer.value + weight_regularization * old_weight;
            model.weights[outer.feature] -= learn_rate * gradient;
            *total += weight_regularization * old_weight * old_weight;

            let start = model.slice_start(outer.field);
            for k in 0..number_of_factors {
                let column = start + k;
                let old_factor = model.factors[[outer.feature, column]];
                let mut contribution = F::zero();
                for inner in vector {
                    if inner.feature != outer.feature {
                        contribution +=
                            outer.value * model.factors[[inner.feature, column]] * inner.value;
                    }
                }
                let gradient = error * contribution + factor_regularization * old_factor;
                model.factors[[outer.feature, column]] -= learn_rate * gradient;
                *total += factor_regularization * old_factor * old_factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FactorInit, FfmConfig};
    use approx::assert_abs_diff_eq;
    use fmrec_helpers::{DiscreteSpace, HookAction, LossDeltaConvergence};
    use ndarray::{Array1, Array2, array};

    fn scenario_model(learn_rate: f64) -> FfmModel<f64> {
        let space = DiscreteSpace::from_cardinalities(vec![2, 3]);
        let config = FfmConfig::default()
            .with_number_of_factors(1)
            .with_number_of_epoches(1)
            .with_learn_rate(learn_rate)
            .with_regularization(0.0, 0.0, 0.0)
            .with_score_range(-10.0, 10.0);
        FfmModel::from_parts(
            config,
            &space,
            0.0,
            Array1::from_elem(5, 0.1),
            Array2::from_elem((5, 2), 0.1),
        )
        .unwrap()
    }

    fn scenario_samples() -> Vec<Sample<f64>> {
        vec![Sample::new(array![0, 3], 1.0)]
    }

    fn synthetic_samples() -> Vec<Sample<f64>> {
        let mut samples = Vec::new();
        for user in 0..3 {
            for item in 3..7 {
                for day in 7..9 {
                    let mark = if (user + item + day) % 3 == 0 { 1.0 } else { 0.0 };
                    samples.push(Sample::new(array![user, item, day], mark));
                }
            }
        }
        samples
    }

    fn synthetic_model(epochs: usize, early_stop: bool) -> FfmModel<f64> {
        let space = DiscreteSpace::from_cardinalities(vec![3, 4, 2]);
        let config = FfmConfig::default()
            .with_number_of_factors(3)
            .with_number_of_epoches(epochs)
            .with_learn_rate(0.05)
            .with_early_stop(early_stop)
            .with_seed(2024);
        FfmModel::prepare(config, &space).unwrap()
    }

    /// Records every call and asks to stop at a fixed epoch.
    struct StopAt {
        epoch: usize,
        calls: Vec<(usize, f64)>,
    }

    impl StopAt {
        fn new(epoch: usize) -> Self {
            Self {
                epoch,
                calls: Vec::new(),
            }
        }
    }

    impl ConvergenceHook<f64> for StopAt {
        fn after_epoch(&mut self, epoch: usize, loss: f64) -> HookAction {
            self.calls.push((epoch, loss));
            if epoch == self.epoch {
                HookAction::Stop
            } else {
                HookAction::Continue
            }
        }
    }

    #[test]
    fn test_scenario_single_epoch_updates() {
        let mut model = scenario_model(0.1);
        let report = model.practice(&scenario_samples()).unwrap();

        // predict = 0.22, error = -0.78, loss = 0.5 * 0.78^2
        assert_eq!(report.epochs_run(), 1);
        assert_abs_diff_eq!(report.losses[0], 0.3042, epsilon = 1e-12);

        assert_abs_diff_eq!(model.global_bias(), 0.078, epsilon = 1e-12);
        assert_abs_diff_eq!(model.weights()[0], 0.178, epsilon = 1e-12);
        assert_abs_diff_eq!(model.weights()[3], 0.178, epsilon = 1e-12);
        assert_abs_diff_eq!(model.weights()[1], 0.1, epsilon = 1e-12);

        // Only each feature's own-field block moves; the blocks the predictor
        // reads for the 0-3 interaction stay at their initial value.
        assert_abs_diff_eq!(model.factors()[[0, 0]], 0.1078, epsilon = 1e-12);
        assert_abs_diff_eq!(model.factors()[[3, 1]], 0.1078, epsilon = 1e-12);
        assert_abs_diff_eq!(model.factors()[[0, 1]], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(model.factors()[[3, 0]], 0.1, epsilon = 1e-12);

        // 0.078 + 2 * 0.178 + 2 * (0.1 * 0.1)
        let score = model.predict(array![0, 3].view()).unwrap();
        assert_abs_diff_eq!(score, 0.454, epsilon = 1e-12);
    }

    #[test]
    fn test_single_epoch_updates_with_two_factors() {
        let space = DiscreteSpace::from_cardinalities(vec![2, 3]);
        let config = FfmConfig::default()
            .with_number_of_factors(2)
            .with_number_of_epoches(1)
            .with_learn_rate(0.1)
            .with_regularization(0.0, 0.0, 0.0)
            .with_score_range(-10.0, 10.0);
        let mut model = FfmModel::from_parts(
            config,
            &space,
            0.0,
            Array1::from_elem(5, 0.1),
            Array2::from_elem((5, 4), 0.1),
        )
        .unwrap();
        let report = model.practice(&scenario_samples()).unwrap();

        // predict = 0.2 + 2 * 2 * (0.1 * 0.1) = 0.24, error = -0.76
        assert_abs_diff_eq!(report.losses[0], 0.2888, epsilon = 1e-12);
        assert_abs_diff_eq!(model.global_bias(), 0.076, epsilon = 1e-12);
        assert_abs_diff_eq!(model.weights()[0], 0.176, epsilon = 1e-12);
        assert_abs_diff_eq!(model.weights()[3], 0.176, epsilon = 1e-12);

        // Field 0 owns columns 0..2, field 1 owns columns 2..4.
        let expected = [
            [0.1076, 0.1076, 0.1, 0.1],
            [0.1, 0.1, 0.1, 0.1],
            [0.1, 0.1, 0.1, 0.1],
            [0.1, 0.1, 0.1076, 0.1076],
            [0.1, 0.1, 0.1, 0.1],
        ];
        for (row, values) in expected.iter().enumerate() {
            for (column, &value) in values.iter().enumerate() {
                assert_abs_diff_eq!(model.factors()[[row, column]], value, epsilon = 1e-12);
            }
        }

        // 0.076 + 2 * 0.176 + 2 * 2 * (0.1 * 0.1)
        let score = model.predict(array![0, 3].view()).unwrap();
        assert_abs_diff_eq!(score, 0.468, epsilon = 1e-12);
    }

    #[test]
    fn test_regularization_terms_enter_loss() {
        let space = DiscreteSpace::from_cardinalities(vec![2, 3]);
        let config = FfmConfig::default()
            .with_number_of_factors(1)
            .with_number_of_epoches(1)
            .with_learn_rate(0.0)
            .with_regularization(0.5, 0.25, 2.0)
            .with_score_range(-10.0, 10.0);
        let mut model = FfmModel::from_parts(
            config,
            &space,
            0.2,
            Array1::from_elem(5, 0.1),
            Array2::from_elem((5, 2), 0.1),
        )
        .unwrap();
        let report = model.practice(&scenario_samples()).unwrap();

        // predict = 0.2 + 0.2 + 0.02 = 0.42, error = -0.58
        let squared = 0.58 * 0.58;
        let bias = 0.5 * 0.2 * 0.2;
        let weights = 2.0 * 0.25 * 0.1 * 0.1;
        let factors = 2.0 * 2.0 * 0.1 * 0.1;
        assert_abs_diff_eq!(
            report.losses[0],
            0.5 * (squared + bias + weights + factors),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_zero_learn_rate_leaves_parameters_unchanged() {
        let mut model = synthetic_model(1, false);
        model.config.learn_rate = 0.0;
        let before = model.clone();
        let samples = synthetic_samples();

        let mut expected = 0.0;
        for sample in &samples {
            let vector = before.feature_vector(sample.features.view()).unwrap();
            let error = before.predict_vector(&vector) - sample.mark;
            expected += error * error;
            expected += before.config.bias_regularization * before.global_bias.powi(2);
            for entry in &vector {
                expected += before.config.weight_regularization
                    * before.weights[entry.feature].powi(2);
                let block = before.factor_block(entry.feature, entry.field).unwrap();
                for &factor in block.iter() {
                    expected += before.config.factor_regularization * factor * factor;
                }
            }
        }

        let report = model.practice(&samples).unwrap();
        assert_eq!(model.global_bias(), before.global_bias());
        assert_eq!(model.weights(), before.weights());
        assert_eq!(model.factors(), before.factors());
        assert_abs_diff_eq!(report.losses[0], 0.5 * expected, epsilon = 1e-9);
    }

    #[test]
    fn test_seeded_runs_are_bit_identical() {
        let samples = synthetic_samples();
        let mut first = synthetic_model(10, false);
        let mut second = synthetic_model(10, false);
        let first_report = first.practice(&samples).unwrap();
        let second_report = second.practice(&samples).unwrap();

        assert_eq!(first_report, second_report);
        assert_eq!(first.global_bias().to_bits(), second.global_bias().to_bits());
        assert_eq!(first.weights(), second.weights());
        assert_eq!(first.factors(), second.factors());
    }

    #[test]
    fn test_hook_stop_runs_exactly_k_plus_one_epochs() {
        let samples = synthetic_samples();
        let mut model = synthetic_model(20, true);
        let mut hook = StopAt::new(4);

        let report = Trainer::new(&mut model, &mut hook).run(&samples).unwrap();
        assert_eq!(report.epochs_run(), 5);
        assert_eq!(report.state, TrainingState::Converged { epoch: 4 });
        assert!(report.converged());
        assert_eq!(hook.calls.len(), 5);
        for (index, &(epoch, loss)) in hook.calls.iter().enumerate() {
            assert_eq!(epoch, index);
            assert_eq!(loss, report.losses[index]);
            assert!(loss.is_finite() && loss >= 0.0);
        }

        // Same seed, five epochs, no hook: identical parameters.
        let mut reference = synthetic_model(5, false);
        reference.practice(&samples).unwrap();
        assert_eq!(model.factors(), reference.factors());
        assert_eq!(model.weights(), reference.weights());
    }

    #[test]
    fn test_hook_ignored_without_early_stop() {
        let samples = synthetic_samples();
        let mut model = synthetic_model(6, false);
        let mut hook = StopAt::new(1);

        let report = Trainer::new(&mut model, &mut hook).run(&samples).unwrap();
        assert_eq!(report.epochs_run(), 6);
        assert_eq!(report.state, TrainingState::ExhaustedEpochs);
        assert_eq!(hook.calls.len(), 6);
    }

    #[test]
    fn test_loss_delta_convergence_stops_training() {
        let mut model = scenario_model(0.0);
        model.config.number_of_epoches = 10;
        model.config.early_stop = true;
        let mut hook = LossDeltaConvergence::new(1e-9);

        // A zero learn rate gives the same loss twice, which converges at epoch 1.
        let report = Trainer::new(&mut model, &mut hook).run(&scenario_samples()).unwrap();
        assert_eq!(report.state, TrainingState::Converged { epoch: 1 });
        assert_eq!(report.epochs_run(), 2);
    }

    #[test]
    fn test_losses_are_finite_and_non_negative() {
        let mut model = synthetic_model(15, false);
        let report = model.practice(&synthetic_samples()).unwrap();
        assert_eq!(report.epochs_run(), 15);
        assert!(report.losses.iter().all(|l| l.is_finite() && *l >= 0.0));
    }

    #[test]
    fn test_malformed_sample_fails_before_training() {
        let mut model = synthetic_model(3, false);
        let before = model.clone();
        let mut samples = synthetic_samples();
        samples.push(Sample::new(array![0, 3, 42], 1.0));

        let result = model.practice(&samples);
        assert!(matches!(
            result,
            Err(FfmError::InvalidFeatureId { feature: 42, .. })
        ));
        assert_eq!(model.factors(), before.factors());

        let result = model.practice(&[Sample::new(array![0, 3], 1.0)]);
        assert!(matches!(result, Err(FfmError::InvalidModelConfiguration(_))));

        let result = model.practice(&[Sample::new(array![0, 1, 7], 1.0)]);
        assert!(matches!(
            result,
            Err(FfmError::InvalidFeatureId { feature: 1, .. })
        ));
        assert_eq!(model.factors(), before.factors());
    }

    #[test]
    fn test_zero_epochs() {
        let mut model = synthetic_model(0, false);
        let report = model.practice(&synthetic_samples()).unwrap();
        assert_eq!(report.epochs_run(), 0);
        assert_eq!(report.final_loss(), None);
        assert_eq!(report.state, TrainingState::ExhaustedEpochs);
    }

    #[test]
    fn test_training_fits_a_simple_signal() {
        let space = DiscreteSpace::from_cardinalities(vec![2, 2]);
        let config = FfmConfig::default()
            .with_number_of_factors(2)
            .with_number_of_epoches(200)
            .with_learn_rate(0.1)
            .with_regularization(0.0, 0.0, 0.0)
            .with_factor_init(FactorInit::Normal {
                mean: 0.0,
                std: 0.01,
            })
            .with_seed(8);
        let mut model = FfmModel::prepare(config, &space).unwrap();
        let samples = vec![
            Sample::new(array![0, 2], 1.0),
            Sample::new(array![1, 3], 0.0),
        ];
        model.practice(&samples).unwrap();
        let high = model.predict(array![0, 2].view()).unwrap();
        let low = model.predict(array![1, 3].view()).unwrap();
        assert!(high > 0.8, "expected a high score, got {high}");
        assert!(low < 0.2, "expected a low score, got {low}");
    }
}
