//! Error types for the ksmooth-model crate.

/// Error type for all fallible operations in the ksmooth-model crate.
///
/// Every variant describes an input precondition violation detected while
/// assembling a [`StateSpaceModel`](crate::StateSpaceModel).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Returned when a model dimension is zero.
    #[error("dimension {name} must be >= 1")]
    EmptyDimension {
        /// Name of the offending dimension.
        name: &'static str,
    },

    /// Returned when a system matrix has the wrong shape.
    #[error("{matrix} has shape {got:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Name of the system matrix.
        matrix: &'static str,
        /// Expected `(rows, cols)`.
        expected: (usize, usize),
        /// Actual `(rows, cols)`.
        got: (usize, usize),
    },

    /// Returned when a time-varying matrix is given with no time slices.
    #[error("{matrix} is time-varying but has no time slices")]
    EmptySeries {
        /// Name of the system matrix.
        matrix: &'static str,
    },

    /// Returned when two time-varying matrices disagree on the number of periods.
    #[error("{matrix} has {got} time slices, expected {expected}")]
    PeriodMismatch {
        /// Name of the system matrix.
        matrix: &'static str,
        /// Expected number of time slices.
        expected: usize,
        /// Actual number of time slices.
        got: usize,
    },

    /// Returned when the observation covariance has non-zero off-diagonal entries.
    #[error("observation covariance at t={t} is not diagonal")]
    NonDiagonalObsCov {
        /// First time slice found to be non-diagonal.
        t: usize,
    },

    /// Returned when the initial state or covariance has the wrong length.
    #[error("initialization {what} has length {got}, expected {expected}")]
    InitializationMismatch {
        /// Which part of the initialization is wrong.
        what: &'static str,
        /// Expected length / side.
        expected: usize,
        /// Actual length / side.
        got: usize,
    },

    /// Returned when the approximate-diffuse variance is non-finite or non-positive.
    #[error("diffuse variance must be finite and positive, got {variance}")]
    InvalidDiffuseVariance {
        /// The rejected variance.
        variance: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_empty_dimension() {
        let err = ModelError::EmptyDimension { name: "k_states" };
        assert_eq!(err.to_string(), "dimension k_states must be >= 1");
    }

    #[test]
    fn error_shape_mismatch() {
        let err = ModelError::ShapeMismatch {
            matrix: "transition",
            expected: (2, 2),
            got: (2, 3),
        };
        assert_eq!(
            err.to_string(),
            "transition has shape (2, 3), expected (2, 2)"
        );
    }

    #[test]
    fn error_period_mismatch() {
        let err = ModelError::PeriodMismatch {
            matrix: "design",
            expected: 10,
            got: 9,
        };
        assert_eq!(err.to_string(), "design has 9 time slices, expected 10");
    }

    #[test]
    fn error_non_diagonal() {
        let err = ModelError::NonDiagonalObsCov { t: 3 };
        assert_eq!(err.to_string(), "observation covariance at t=3 is not diagonal");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<ModelError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<ModelError>();
    }
}
