//! Univariate-treatment Kalman filter.
//!
//! Each observation vector is processed as a sequence of scalar updates
//! (Durbin & Koopman, 2012, section 6.4), which avoids inverting the full
//! forecast error covariance and requires a diagonal `H`.
//!
//! For component `i` at time `t`:
//!
//! ```text
//! v = y[t,i] - Z[t,i] a
//! M = P Z[t,i]'
//! F = Z[t,i] M + H[t,ii]
//! K = M / F
//! a = a + K v
//! P = P - K M'
//! ```
//!
//! then `a[t+1] = T[t] a` and `P[t+1] = T[t] P T[t]' + R[t] Q[t] R[t]'`.

use ndarray::{Array1, Array2, Array3, ArrayView2, Axis, s};
use num_traits::Zero;
use tracing::{debug, trace};

use ksmooth_model::{Scalar, StateSpaceModel};

use crate::error::FilterError;
use crate::output::{FilterOutput, FilteredStates};

/// `ln(2 * pi)`.
const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Runs the univariate-treatment Kalman filter over `observations`.
///
/// `observations` has shape `(nobs, k_endog)`. Non-finite entries are treated
/// as missing: the component is skipped and flagged in the output.
/// Components whose forecast error variance is zero or non-finite are also
/// skipped (they carry no information) and their gain is left at zero.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`FilterError::EmptyObservations`] | `observations` has no rows |
/// | [`FilterError::ObservationShape`] | column count differs from `k_endog` |
/// | [`FilterError::Model`] | time-varying matrices do not cover `nobs` periods |
#[tracing::instrument(skip_all, fields(nobs = observations.nrows(), k_endog = model.k_endog()))]
pub fn univariate_filter<A: Scalar>(
    model: &StateSpaceModel<A>,
    observations: ArrayView2<'_, A>,
) -> Result<FilterOutput<A>, FilterError> {
    let (nobs, n_cols) = observations.dim();
    if nobs == 0 {
        return Err(FilterError::EmptyObservations);
    }
    let dims = model.dims();
    if n_cols != dims.k_endog {
        return Err(FilterError::ObservationShape {
            k_endog: dims.k_endog,
            got: n_cols,
        });
    }
    model.check_nobs(nobs)?;

    let m = dims.k_states;
    let ln_2pi = A::from_f64(LN_2PI);
    let half = A::from_f64(0.5);

    let mut output = FilterOutput::allocate(dims, nobs);
    let mut states = FilteredStates {
        predicted_state: Array2::zeros((nobs + 1, m)),
        predicted_state_cov: Array3::zeros((nobs + 1, m, m)),
        filtered_state: Array2::zeros((nobs, m)),
        filtered_state_cov: Array3::zeros((nobs, m, m)),
        loglikelihood_obs: Array1::zeros(nobs),
    };

    let (mut a, mut p) = model.initial_state();
    let mut n_missing = 0usize;
    let mut n_degenerate = 0usize;

    for t in 0..nobs {
        states.predicted_state.row_mut(t).assign(&a);
        states.predicted_state_cov.index_axis_mut(Axis(0), t).assign(&p);

        let design = model.design(t);
        let obs_cov = model.obs_cov(t);
        let mut llf = A::zero();

        for i in 0..dims.k_endog {
            let y = observations[[t, i]];
            if !y.is_finite() {
                output.mark_missing(t, i);
                n_missing += 1;
                continue;
            }

            let z = design.row(i);
            let h = obs_cov[[i, i]];
            let v = y - z.dot(&a);
            let m_vec = p.dot(&z);
            let f = z.dot(&m_vec) + h;

            if f.is_degenerate() {
                debug!(t, i, f = ?f, "degenerate forecast error variance, skipping component");
                output.record_degenerate(t, i, v, f);
                n_degenerate += 1;
                continue;
            }

            let gain = m_vec.mapv(|x| x / f);
            a.scaled_add(v, &gain);

            // P -= K M'
            let k_col = gain.view().insert_axis(Axis(1)); // (m, 1)
            let m_row = m_vec.view().insert_axis(Axis(0)); // (1, m)
            p = &p - &k_col.dot(&m_row);

            llf = llf - half * (ln_2pi + f.ln() + v * v / f);
            output.record_component(t, i, v, f, h, gain.view());
        }

        trace!(t, "measurement sweep complete");
        states.filtered_state.row_mut(t).assign(&a);
        states.filtered_state_cov.index_axis_mut(Axis(0), t).assign(&p);
        states.loglikelihood_obs[t] = llf;

        let transition = model.transition(t);
        a = transition.dot(&a);
        p = transition.dot(&p).dot(&transition.t()) + model.selected_state_cov(t);
    }

    states.predicted_state.row_mut(nobs).assign(&a);
    states
        .predicted_state_cov
        .slice_mut(s![nobs, .., ..])
        .assign(&p);
    output.attach_states(states);

    debug!(n_missing, n_degenerate, "filter pass complete");
    Ok(output)
}
