//! Error types for the ksmooth-filter crate.

use ksmooth_model::ModelError;

/// Error type for all fallible operations in the ksmooth-filter crate.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FilterError {
    /// Returned when there are no observations to filter.
    #[error("observations are empty")]
    EmptyObservations,

    /// Returned when the observation array does not have `k_endog` columns.
    #[error("observations have {got} columns, model has k_endog={k_endog}")]
    ObservationShape {
        /// Number of observation components in the model.
        k_endog: usize,
        /// Number of columns supplied.
        got: usize,
    },

    /// Returned when externally supplied filter parts disagree on shape.
    #[error("filter part {part} has shape {got:?}, expected {expected:?}")]
    PartShape {
        /// Name of the offending part.
        part: &'static str,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Returned when the model is inconsistent with the observations.
    #[error(transparent)]
    Model(#[from] ModelError),
}
