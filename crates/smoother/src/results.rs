//! Smoother outputs addressable by time index.

use ndarray::linalg::{general_mat_mul, general_mat_vec_mul};
use ndarray::{Array2, Array3, Axis};

use ksmooth_filter::FilterOutput;
use ksmooth_model::{Dimensions, Scalar};

use crate::output_mode::SmootherOutput;
use crate::state::RecursionState;

/// Results of a backward smoothing pass.
///
/// Every buffer is `None` unless its output mode was requested; unrequested
/// quantities are never allocated.
///
/// | Buffer | Shape | Mode |
/// |--------|-------|------|
/// | `scaled_smoothed_estimator` (`r[t,0]`) | `(nobs, m)` | `STATE` |
/// | `scaled_smoothed_estimator_cov` (`N[t,0]`) | `(nobs, m, m)` | `STATE_COV` |
/// | `smoothed_state` | `(nobs, m)` | `STATE` with predicted states |
/// | `smoothed_state_cov` | `(nobs, m, m)` | `STATE_COV` with predicted states |
/// | `smoothed_measurement_disturbance` | `(nobs, p)` | `DISTURBANCE` |
/// | `smoothed_state_disturbance` | `(nobs, r)` | `DISTURBANCE` |
/// | `smoothed_measurement_disturbance_cov` | `(nobs, p)` | `DISTURBANCE_COV` |
/// | `smoothed_state_disturbance_cov` | `(nobs, r, r)` | `DISTURBANCE_COV` |
#[derive(Debug, Clone, PartialEq)]
pub struct SmootherResults<A> {
    pub(crate) output: SmootherOutput,
    pub(crate) nobs: usize,
    pub(crate) scaled_smoothed_estimator: Option<Array2<A>>,
    pub(crate) scaled_smoothed_estimator_cov: Option<Array3<A>>,
    pub(crate) smoothed_state: Option<Array2<A>>,
    pub(crate) smoothed_state_cov: Option<Array3<A>>,
    pub(crate) smoothed_measurement_disturbance: Option<Array2<A>>,
    pub(crate) smoothed_state_disturbance: Option<Array2<A>>,
    pub(crate) smoothed_measurement_disturbance_cov: Option<Array2<A>>,
    pub(crate) smoothed_state_disturbance_cov: Option<Array3<A>>,
}

impl<A: Scalar> SmootherResults<A> {
    pub(crate) fn allocate(
        output: SmootherOutput,
        dims: Dimensions,
        nobs: usize,
        with_states: bool,
    ) -> Self {
        let (m, p, r) = (dims.k_states, dims.k_endog, dims.k_posdef);
        let state = output.contains(SmootherOutput::STATE);
        let state_cov = output.contains(SmootherOutput::STATE_COV);
        let dist = output.contains(SmootherOutput::DISTURBANCE);
        let dist_cov = output.contains(SmootherOutput::DISTURBANCE_COV);
        Self {
            output,
            nobs,
            scaled_smoothed_estimator: state.then(|| Array2::zeros((nobs, m))),
            scaled_smoothed_estimator_cov: state_cov.then(|| Array3::zeros((nobs, m, m))),
            smoothed_state: (state && with_states).then(|| Array2::zeros((nobs, m))),
            smoothed_state_cov: (state_cov && with_states).then(|| Array3::zeros((nobs, m, m))),
            smoothed_measurement_disturbance: dist.then(|| Array2::zeros((nobs, p))),
            smoothed_state_disturbance: dist.then(|| Array2::zeros((nobs, r))),
            smoothed_measurement_disturbance_cov: dist_cov.then(|| Array2::zeros((nobs, p))),
            smoothed_state_disturbance_cov: dist_cov.then(|| Array3::zeros((nobs, r, r))),
        }
    }

    /// Stores `r[t,0]`, `N[t,0]` and, where allocated, the smoothed state
    /// `a[t] + P[t] r[t,0]` with covariance `P[t] - P[t] N[t,0] P[t]`.
    pub(crate) fn record_sweep(
        &mut self,
        t: usize,
        filter: &FilterOutput<A>,
        state: &mut RecursionState<A>,
    ) {
        if let Some(r) = self.scaled_smoothed_estimator.as_mut() {
            r.row_mut(t).assign(&state.r);
        }
        if let Some(n) = self.scaled_smoothed_estimator_cov.as_mut() {
            n.index_axis_mut(Axis(0), t).assign(&state.n);
        }

        let (Some(a), Some(p)) = (filter.predicted_state(), filter.predicted_state_cov()) else {
            return;
        };
        let p_t = p.index_axis(Axis(0), t);
        if let Some(alpha) = self.smoothed_state.as_mut() {
            let mut row = alpha.row_mut(t);
            row.assign(&a.row(t));
            general_mat_vec_mul(A::one(), &p_t, &state.r, A::one(), &mut row);
        }
        if let Some(v) = self.smoothed_state_cov.as_mut() {
            general_mat_mul(A::one(), &p_t, &state.n, A::zero(), &mut state.scratch_mm);
            let mut v_t = v.index_axis_mut(Axis(0), t);
            v_t.assign(&p_t);
            general_mat_mul(A::zero() - A::one(), &state.scratch_mm, &p_t, A::one(), &mut v_t);
        }
    }

    /// Output modes the results were produced for.
    pub fn output(&self) -> SmootherOutput {
        self.output
    }

    /// Number of time periods.
    pub fn nobs(&self) -> usize {
        self.nobs
    }

    /// Scaled smoothed estimator `r[t,0]`, shape `(nobs, k_states)`.
    pub fn scaled_smoothed_estimator(&self) -> Option<&Array2<A>> {
        self.scaled_smoothed_estimator.as_ref()
    }

    /// Covariance `N[t,0]`, shape `(nobs, k_states, k_states)`.
    pub fn scaled_smoothed_estimator_cov(&self) -> Option<&Array3<A>> {
        self.scaled_smoothed_estimator_cov.as_ref()
    }

    /// Smoothed states, shape `(nobs, k_states)`.
    pub fn smoothed_state(&self) -> Option<&Array2<A>> {
        self.smoothed_state.as_ref()
    }

    /// Smoothed state covariances, shape `(nobs, k_states, k_states)`.
    pub fn smoothed_state_cov(&self) -> Option<&Array3<A>> {
        self.smoothed_state_cov.as_ref()
    }

    /// Smoothed measurement disturbances, shape `(nobs, k_endog)`.
    pub fn smoothed_measurement_disturbance(&self) -> Option<&Array2<A>> {
        self.smoothed_measurement_disturbance.as_ref()
    }

    /// Smoothed state disturbances, shape `(nobs, k_posdef)`.
    pub fn smoothed_state_disturbance(&self) -> Option<&Array2<A>> {
        self.smoothed_state_disturbance.as_ref()
    }

    /// Variances of the smoothed measurement disturbances, shape `(nobs, k_endog)`.
    pub fn smoothed_measurement_disturbance_cov(&self) -> Option<&Array2<A>> {
        self.smoothed_measurement_disturbance_cov.as_ref()
    }

    /// Covariances of the smoothed state disturbances, shape `(nobs, k_posdef, k_posdef)`.
    pub fn smoothed_state_disturbance_cov(&self) -> Option<&Array3<A>> {
        self.smoothed_state_disturbance_cov.as_ref()
    }
}
