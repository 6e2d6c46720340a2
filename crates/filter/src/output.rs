//! Per-component filter output consumed by the smoother.

use ndarray::{Array1, Array2, Array3, ArrayView1, Zip};
use num_traits::One;

use ksmooth_model::{Dimensions, Scalar};

use crate::error::FilterError;

/// Output of a univariate-treatment Kalman filter pass.
///
/// Indexed by time `t` (rows) and observation component `i`. The Kalman gain
/// for component `i` is `K[t,i] = P[t,i] Z[t,i]' / F[t,i]`.
///
/// Missing components (non-finite observations) are flagged in
/// [`FilterOutput::is_missing()`] and carry zeros everywhere.
#[derive(Clone, Debug)]
pub struct FilterOutput<A> {
    dims: Dimensions,
    nobs: usize,
    forecast_error: Array2<A>,
    forecast_error_cov: Array2<A>,
    kalman_gain: Array3<A>,
    v_over_f: Array2<A>,
    inv_f: Array2<A>,
    h_over_f: Array2<A>,
    missing: Array2<bool>,
    predicted_state: Option<Array2<A>>,
    predicted_state_cov: Option<Array3<A>>,
    filtered_state: Option<Array2<A>>,
    filtered_state_cov: Option<Array3<A>>,
    loglikelihood_obs: Option<Array1<A>>,
}

/// State sequences recorded by [`univariate_filter`](crate::univariate_filter).
pub(crate) struct FilteredStates<A> {
    pub(crate) predicted_state: Array2<A>,
    pub(crate) predicted_state_cov: Array3<A>,
    pub(crate) filtered_state: Array2<A>,
    pub(crate) filtered_state_cov: Array3<A>,
    pub(crate) loglikelihood_obs: Array1<A>,
}

/// Raw per-component quantities produced by an external filter.
///
/// Shapes: `forecast_error`, `forecast_error_cov` and `obs_var` are
/// `(nobs, k_endog)`; `kalman_gain` is `(nobs, k_endog, k_states)`.
#[derive(Clone, Debug)]
pub struct FilterParts<A> {
    /// Forecast errors `v[t,i]`.
    pub forecast_error: Array2<A>,
    /// Forecast error variances `F[t,i]`.
    pub forecast_error_cov: Array2<A>,
    /// Kalman gains `K[t,i]`.
    pub kalman_gain: Array3<A>,
    /// Diagonal observation variances `H[t,ii]`.
    pub obs_var: Array2<A>,
    /// Optional missing mask; `None` means nothing is missing.
    pub missing: Option<Array2<bool>>,
}

impl<A: Scalar> FilterOutput<A> {
    pub(crate) fn allocate(dims: Dimensions, nobs: usize) -> Self {
        let (m, p) = (dims.k_states, dims.k_endog);
        Self {
            dims,
            nobs,
            forecast_error: Array2::zeros((nobs, p)),
            forecast_error_cov: Array2::zeros((nobs, p)),
            kalman_gain: Array3::zeros((nobs, p, m)),
            v_over_f: Array2::zeros((nobs, p)),
            inv_f: Array2::zeros((nobs, p)),
            h_over_f: Array2::zeros((nobs, p)),
            missing: Array2::from_elem((nobs, p), false),
            predicted_state: None,
            predicted_state_cov: None,
            filtered_state: None,
            filtered_state_cov: None,
            loglikelihood_obs: None,
        }
    }

    /// Assembles filter output from quantities computed elsewhere.
    ///
    /// The ratios `v/F`, `1/F` and `H/F` are computed here without any
    /// guarding; the smoother is responsible for skipping degenerate `F`.
    /// Predicted and filtered states are unavailable on the result, so the
    /// smoother cannot produce smoothed states from it.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::EmptyObservations`] for zero periods and
    /// [`FilterError::PartShape`] if the parts disagree on shape.
    pub fn from_parts(k_posdef: usize, parts: FilterParts<A>) -> Result<Self, FilterError> {
        let (nobs, p, m) = parts.kalman_gain.dim();
        if nobs == 0 {
            return Err(FilterError::EmptyObservations);
        }
        for (part, arr) in [
            ("forecast_error", &parts.forecast_error),
            ("forecast_error_cov", &parts.forecast_error_cov),
            ("obs_var", &parts.obs_var),
        ] {
            if arr.dim() != (nobs, p) {
                return Err(FilterError::PartShape {
                    part,
                    expected: vec![nobs, p],
                    got: arr.shape().to_vec(),
                });
            }
        }
        let missing = match parts.missing {
            Some(mask) if mask.dim() != (nobs, p) => {
                return Err(FilterError::PartShape {
                    part: "missing",
                    expected: vec![nobs, p],
                    got: mask.shape().to_vec(),
                });
            }
            Some(mask) => mask,
            None => Array2::from_elem((nobs, p), false),
        };

        let v_over_f = Zip::from(&parts.forecast_error)
            .and(&parts.forecast_error_cov)
            .map_collect(|&v, &f| v / f);
        let inv_f = parts.forecast_error_cov.mapv(|f| A::one() / f);
        let h_over_f = Zip::from(&parts.obs_var)
            .and(&parts.forecast_error_cov)
            .map_collect(|&h, &f| h / f);

        Ok(Self {
            dims: Dimensions {
                k_states: m,
                k_endog: p,
                k_posdef,
            },
            nobs,
            forecast_error: parts.forecast_error,
            forecast_error_cov: parts.forecast_error_cov,
            kalman_gain: parts.kalman_gain,
            v_over_f,
            inv_f,
            h_over_f,
            missing,
            predicted_state: None,
            predicted_state_cov: None,
            filtered_state: None,
            filtered_state_cov: None,
            loglikelihood_obs: None,
        })
    }

    /// Records one component's filter quantities.
    pub(crate) fn record_component(
        &mut self,
        t: usize,
        i: usize,
        v: A,
        f: A,
        h: A,
        gain: ArrayView1<'_, A>,
    ) {
        self.forecast_error[[t, i]] = v;
        self.forecast_error_cov[[t, i]] = f;
        self.kalman_gain
            .slice_mut(ndarray::s![t, i, ..])
            .assign(&gain);
        self.v_over_f[[t, i]] = v / f;
        self.inv_f[[t, i]] = A::one() / f;
        self.h_over_f[[t, i]] = h / f;
    }

    pub(crate) fn mark_missing(&mut self, t: usize, i: usize) {
        self.missing[[t, i]] = true;
    }

    /// Records a component whose forecast error variance is degenerate.
    ///
    /// The raw `v` and `F` are kept for inspection; gain and ratios stay zero.
    pub(crate) fn record_degenerate(&mut self, t: usize, i: usize, v: A, f: A) {
        self.forecast_error[[t, i]] = v;
        self.forecast_error_cov[[t, i]] = f;
    }

    /// Attaches the predicted/filtered state sequences and per-period
    /// log-likelihood produced alongside the component quantities.
    pub(crate) fn attach_states(&mut self, states: FilteredStates<A>) {
        self.predicted_state = Some(states.predicted_state);
        self.predicted_state_cov = Some(states.predicted_state_cov);
        self.filtered_state = Some(states.filtered_state);
        self.filtered_state_cov = Some(states.filtered_state_cov);
        self.loglikelihood_obs = Some(states.loglikelihood_obs);
    }

    /// Model dimensions the output was produced for.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Number of filtered time periods.
    pub fn nobs(&self) -> usize {
        self.nobs
    }

    /// Forecast errors `v[t,i]`, shape `(nobs, k_endog)`.
    pub fn forecast_error(&self) -> &Array2<A> {
        &self.forecast_error
    }

    /// Forecast error variances `F[t,i]`, shape `(nobs, k_endog)`.
    pub fn forecast_error_cov(&self) -> &Array2<A> {
        &self.forecast_error_cov
    }

    /// Kalman gains `K[t,i]`, shape `(nobs, k_endog, k_states)`.
    pub fn kalman_gain(&self) -> &Array3<A> {
        &self.kalman_gain
    }

    /// Cached `v[t,i] / F[t,i]`.
    pub fn v_over_f(&self) -> &Array2<A> {
        &self.v_over_f
    }

    /// Cached `1 / F[t,i]`.
    pub fn inv_f(&self) -> &Array2<A> {
        &self.inv_f
    }

    /// Cached `H[t,ii] / F[t,i]`.
    pub fn h_over_f(&self) -> &Array2<A> {
        &self.h_over_f
    }

    /// Returns `true` if component `i` at time `t` was missing.
    pub fn is_missing(&self, t: usize, i: usize) -> bool {
        self.missing[[t, i]]
    }

    /// Missing mask, shape `(nobs, k_endog)`.
    pub fn missing(&self) -> &Array2<bool> {
        &self.missing
    }

    /// Predicted states `a[t]`, shape `(nobs + 1, k_states)`.
    pub fn predicted_state(&self) -> Option<&Array2<A>> {
        self.predicted_state.as_ref()
    }

    /// Predicted state covariances `P[t]`, shape `(nobs + 1, k_states, k_states)`.
    pub fn predicted_state_cov(&self) -> Option<&Array3<A>> {
        self.predicted_state_cov.as_ref()
    }

    /// Filtered states `a[t|t]`, shape `(nobs, k_states)`.
    pub fn filtered_state(&self) -> Option<&Array2<A>> {
        self.filtered_state.as_ref()
    }

    /// Filtered state covariances `P[t|t]`, shape `(nobs, k_states, k_states)`.
    pub fn filtered_state_cov(&self) -> Option<&Array3<A>> {
        self.filtered_state_cov.as_ref()
    }

    /// Per-period log-likelihood contributions.
    pub fn loglikelihood_obs(&self) -> Option<&Array1<A>> {
        self.loglikelihood_obs.as_ref()
    }

    /// Total log-likelihood, if computed by this crate's filter.
    pub fn loglikelihood(&self) -> Option<A> {
        self.loglikelihood_obs.as_ref().map(|llf| llf.sum())
    }
}
