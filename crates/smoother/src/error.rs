//! Error types for the ksmooth-smoother crate.

use ksmooth_model::ModelError;

/// Error type for all fallible operations in the ksmooth-smoother crate.
///
/// Every variant is fatal for the time index it is reported for. Degenerate
/// forecast error variances are not errors: they are absorbed by the
/// recursion and counted (see
/// [`UnivariateSmoother::degenerate_count()`](crate::UnivariateSmoother::degenerate_count)).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SmootherError {
    /// Returned when a time index is past the last filtered period.
    #[error("time index {t} out of range for {nobs} filtered periods")]
    TimeIndexOutOfRange {
        /// The requested time index.
        t: usize,
        /// Number of filtered periods.
        nobs: usize,
    },

    /// Returned when filter output and model disagree on a dimension.
    #[error("filter output has {what}={got}, model has {expected}")]
    DimensionMismatch {
        /// Name of the dimension.
        what: &'static str,
        /// Value in the model.
        expected: usize,
        /// Value in the filter output.
        got: usize,
    },

    /// Returned when a recursion step is invoked out of the backward order.
    #[error("{operation}({t}) called out of order")]
    StepOrder {
        /// The step that was invoked.
        operation: &'static str,
        /// The time index it was invoked for.
        t: usize,
    },

    /// Returned when a disturbance output is requested but the cache lacks
    /// the partial recursion values it depends on.
    #[error("measurement cache for t={t} has no {part}; built without the matching output mode")]
    MissingCache {
        /// Which cached quantity is missing (`d1` or `d2`).
        part: &'static str,
        /// Time index of the cache.
        t: usize,
    },

    /// Returned when a cache from one time index is used for another.
    #[error("measurement cache is for t={cache_t}, requested t={t}")]
    CacheTimeMismatch {
        /// Time index recorded in the cache.
        cache_t: usize,
        /// Requested time index.
        t: usize,
    },

    /// Returned when an output-mode bitmask has bits outside the known set.
    #[error("unknown output mode bits {bits:#06b}")]
    UnknownOutputBits {
        /// The rejected bits.
        bits: u32,
    },

    /// Returned when the model does not cover the filtered periods.
    #[error(transparent)]
    Model(#[from] ModelError),
}
