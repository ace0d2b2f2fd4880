use crate::config::FfmConfig;
use crate::error::FfmError;
use crate::model::FfmModel;
use crate::trainer::TrainingReport;
use fmrec_helpers::{DiscreteSpace, Float, Recommender, Sample};
use ndarray::ArrayView1;

impl<F: Float> Recommender<F> for FfmModel<F> {
    type Config = FfmConfig<F>;
    type Report = TrainingReport<F>;
    type Error = FfmError;

    fn prepare(config: Self::Config, space: &DiscreteSpace) -> Result<Self, Self::Error> {
        FfmModel::prepare(config, space)
    }

    fn practice(&mut self, samples: &[Sample<F>]) -> Result<Self::Report, Self::Error> {
        FfmModel::practice(self, samples)
    }

    fn predict(&self, features: ArrayView1<usize>) -> Result<F, Self::Error> {
        FfmModel::predict(self, features)
    }
}
