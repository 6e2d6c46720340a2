//! Configuration for a smoother pass.

use crate::output_mode::SmootherOutput;

/// Configuration for a [`UnivariateSmoother`](crate::UnivariateSmoother).
///
/// # Example
///
/// ```
/// use ksmooth_smoother::{SmootherConfig, SmootherOutput};
///
/// let config = SmootherConfig::new(SmootherOutput::STATE | SmootherOutput::DISTURBANCE)
///     .with_smoothed_state(false);
///
/// assert!(config.output().contains(SmootherOutput::STATE));
/// assert!(!config.smoothed_state());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmootherConfig {
    /// Requested outputs.
    output: SmootherOutput,
    /// Whether to form smoothed states from the filter's predicted states.
    smoothed_state: bool,
}

impl SmootherConfig {
    /// Creates a configuration requesting `output`.
    ///
    /// Defaults: smoothed states are computed when the filter output
    /// carries predicted states.
    pub fn new(output: SmootherOutput) -> Self {
        Self {
            output,
            smoothed_state: true,
        }
    }

    /// Enables or disables smoothed state (and covariance) computation.
    pub fn with_smoothed_state(mut self, enabled: bool) -> Self {
        self.smoothed_state = enabled;
        self
    }

    /// Returns the requested outputs.
    pub fn output(&self) -> SmootherOutput {
        self.output
    }

    /// Returns whether smoothed states are requested.
    pub fn smoothed_state(&self) -> bool {
        self.smoothed_state
    }
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self::new(SmootherOutput::ALL)
    }
}
