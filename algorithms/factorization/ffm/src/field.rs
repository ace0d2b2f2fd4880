//! Mapping from flattened feature ids to the field they were one-hot expanded from.
//!
//! Fields are laid out contiguously: field 0 owns ids `[0, size0)`, field 1 owns
//! `[size0, size0 + size1)`, and so on.

use crate::error::FfmError;
use fmrec_helpers::DiscreteSpace;
use std::ops::Range;

/// Feature-to-field lookup table, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIndex {
    /// `fields[feature]` is the field owning `feature`.
    fields: Vec<usize>,
    /// `offsets[field]` is the first feature id of `field`; one extra trailing entry.
    offsets: Vec<usize>,
}

impl FieldIndex {
    /// Builds the index from ordered per-field cardinalities.
    ///
    /// # Errors
    ///
    /// Returns `FfmError::InvalidModelConfiguration` if there are no fields, a field
    /// has no categories, or the cardinalities do not sum to `number_of_features`.
    pub fn new(cardinalities: &[usize], number_of_features: usize) -> Result<Self, FfmError> {
        if cardinalities.is_empty() {
            return Err(FfmError::configuration("at least one field is required"));
        }
        if let Some(field) = cardinalities.iter().position(|&size| size == 0) {
            return Err(FfmError::configuration(format!(
                "field {field} has no categories"
            )));
        }
        let total: usize = cardinalities.iter().sum();
        if total != number_of_features {
            return Err(FfmError::configuration(format!(
                "field cardinalities sum to {total}, expected {number_of_features} features"
            )));
        }

        let mut fields = Vec::with_capacity(number_of_features);
        let mut offsets = Vec::with_capacity(cardinalities.len() + 1);
        let mut count = 0;
        for (field, &size) in cardinalities.iter().enumerate() {
            offsets.push(count);
            fields.extend(std::iter::repeat_n(field, size));
            count += size;
        }
        offsets.push(count);

        Ok(Self { fields, offsets })
    }

    pub fn from_space(space: &DiscreteSpace) -> Result<Self, FfmError> {
        Self::new(&space.cardinalities, space.number_of_features)
    }

    pub fn number_of_features(&self) -> usize {
        self.fields.len()
    }

    pub fn number_of_fields(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Field owning `feature`.
    pub fn field_of(&self, feature: usize) -> Result<usize, FfmError> {
        self.fields
            .get(feature)
            .copied()
            .ok_or(FfmError::InvalidFeatureId {
                feature,
                number_of_features: self.number_of_features(),
            })
    }

    /// Feature ids owned by `field`.
    pub fn field_range(&self, field: usize) -> Result<Range<usize>, FfmError> {
        self.check_field(field)?;
        Ok(self.offsets[field]..self.offsets[field + 1])
    }

    /// First feature id of `field`.
    pub fn offset(&self, field: usize) -> Result<usize, FfmError> {
        self.field_range(field).map(|range| range.start)
    }

    pub fn cardinality(&self, field: usize) -> Result<usize, FfmError> {
        self.field_range(field).map(|range| range.len())
    }

    /// Per-field cardinalities, in field order.
    pub fn cardinalities(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Flattened feature id of the `category`-th value of `field`.
    ///
    /// # Errors
    ///
    /// `InvalidModelConfiguration` for an unknown field, `InvalidFeatureId` when
    /// `category` exceeds the field's cardinality.
    pub fn flatten(&self, field: usize, category: usize) -> Result<usize, FfmError> {
        let range = self.field_range(field)?;
        if category >= range.len() {
            return Err(FfmError::InvalidFeatureId {
                feature: range.start + category,
                number_of_features: self.number_of_features(),
            });
        }
        Ok(range.start + category)
    }

    fn check_field(&self, field: usize) -> Result<(), FfmError> {
        if field >= self.number_of_fields() {
            return Err(FfmError::configuration(format!(
                "field {field} does not exist, there are {} fields",
                self.number_of_fields()
            )));
        }
        Ok(())
    }
}
