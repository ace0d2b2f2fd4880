use crate::error::FfmError;
use crate::field::FieldIndex;
use fmrec_helpers::Float;
use ndarray::ArrayView1;

/// One active feature of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureEntry<F: Float> {
    pub feature: usize,
    /// Field owning `feature`, resolved when the vector is built.
    pub field: usize,
    pub value: F,
}

/// Sparse feature vector of a sample: one entry per field, in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector<F: Float> {
    entries: Vec<FeatureEntry<F>>,
}

impl<F: Float> FeatureVector<F> {
    /// Builds the one-hot vector of a discrete feature tuple.
    ///
    /// # Errors
    ///
    /// Returns `FfmError::InvalidModelConfiguration` if the tuple width differs from the
    /// number of fields and `FfmError::InvalidFeatureId` if an id is out of range or
    /// does not belong to the field of its position.
    pub fn one_hot(features: ArrayView1<usize>, index: &FieldIndex) -> Result<Self, FfmError> {
        if features.len() != index.number_of_fields() {
            return Err(FfmError::configuration(format!(
                "sample has {} features but the model has {} fields",
                features.len(),
                index.number_of_fields()
            )));
        }
        let entries = features
            .iter()
            .enumerate()
            .map(|(position, &feature)| -> Result<FeatureEntry<F>, FfmError> {
                let field = index.field_of(feature)?;
                if field != position {
                    return Err(FfmError::InvalidFeatureId {
                        feature,
                        number_of_features: index.number_of_features(),
                    });
                }
                Ok(FeatureEntry {
                    feature,
                    field,
                    value: F::one(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureEntry<F>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a, F: Float> IntoIterator for &'a FeatureVector<F> {
    type Item = &'a FeatureEntry<F>;
    type IntoIter = std::slice::Iter<'a, FeatureEntry<F>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
