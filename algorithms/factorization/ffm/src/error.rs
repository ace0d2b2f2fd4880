use thiserror::Error;

/// Errors that can occur when preparing, training or querying an FFM model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FfmError {
    /// A feature id lies outside `[0, number_of_features)`.
    #[error("feature id {feature} is out of range for {number_of_features} features")]
    InvalidFeatureId {
        feature: usize,
        number_of_features: usize,
    },

    /// Setup parameters, parameter shapes or sample widths do not fit together.
    #[error("invalid model configuration: {0}")]
    InvalidModelConfiguration(String),
}

impl FfmError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        FfmError::InvalidModelConfiguration(message.into())
    }
}
