//! Smoothed disturbances and their variances for one period.
//!
//! With `d1 = K' r` and `d2 = K' N K` cached by the measurement sweep of
//! period `t`, and `r`/`N` equal to `r[t+1,0]`/`N[t+1,0]` before the time
//! update multiplied them by `T[t]` (zero at the last period):
//!
//! ```text
//! eps[i]      = (H/F) (v - F d1[i])
//! var(eps[i]) = H - (H/F)^2 (F + F^2 d2[i])
//! eta         = (R Q)' r
//! var(eta)    = Q - (R Q)' N (R Q)
//! ```
//!
//! The `F d1` and `F^2 d2` terms account for the normalised gain
//! `K = P Z' / F`. Uninformative components get `eps = 0` and
//! `var(eps) = H`.

use ndarray::linalg::{general_mat_mul, general_mat_vec_mul};
use ndarray::{Array1, Axis};

use ksmooth_filter::FilterOutput;
use ksmooth_model::{Scalar, StateSpaceModel};

use crate::error::SmootherError;
use crate::measurement::{MeasurementCache, is_informative};
use crate::output_mode::SmootherOutput;
use crate::results::SmootherResults;
use crate::state::RecursionState;

fn cached<'c, A>(
    part: &'static str,
    values: Option<&'c Array1<A>>,
    t: usize,
) -> Result<&'c Array1<A>, SmootherError> {
    values.ok_or(SmootherError::MissingCache { part, t })
}

/// Computes the requested disturbance outputs for period `t`.
pub(crate) fn smooth_disturbances<A: Scalar>(
    model: &StateSpaceModel<A>,
    filter: &FilterOutput<A>,
    output: SmootherOutput,
    t: usize,
    cache: &MeasurementCache<A>,
    state: &mut RecursionState<A>,
    results: &mut SmootherResults<A>,
) -> Result<(), SmootherError> {
    let wants_mean = output.contains(SmootherOutput::DISTURBANCE);
    let wants_cov = output.contains(SmootherOutput::DISTURBANCE_COV);
    if !wants_mean && !wants_cov {
        return Ok(());
    }
    let d1 = if wants_mean {
        Some(cached("d1", cache.d1(), t)?)
    } else {
        None
    };
    let d2 = if wants_cov {
        Some(cached("d2", cache.d2(), t)?)
    } else {
        None
    };

    let obs_cov = model.obs_cov(t);
    for i in 0..model.k_endog() {
        let h = obs_cov[[i, i]];
        let informative = is_informative(filter, t, i);
        let f = filter.forecast_error_cov()[[t, i]];
        let h_over_f = filter.h_over_f()[[t, i]];

        if let (Some(d1), Some(eps)) = (d1, results.smoothed_measurement_disturbance.as_mut()) {
            eps[[t, i]] = if informative {
                h_over_f * (filter.forecast_error()[[t, i]] - f * d1[i])
            } else {
                A::zero()
            };
        }
        if let (Some(d2), Some(var)) = (d2, results.smoothed_measurement_disturbance_cov.as_mut()) {
            var[[t, i]] = if informative {
                h - h_over_f * h_over_f * (f + f * f * d2[i])
            } else {
                h
            };
        }
    }

    // temp = R Q
    general_mat_mul(
        A::one(),
        &model.selection(t),
        &model.state_cov(t),
        A::zero(),
        &mut state.scratch_mr,
    );

    if let Some(eta) = results.smoothed_state_disturbance.as_mut() {
        general_mat_vec_mul(
            A::one(),
            &state.scratch_mr.t(),
            &state.input_r,
            A::zero(),
            &mut eta.row_mut(t),
        );
    }
    if let Some(cov) = results.smoothed_state_disturbance_cov.as_mut() {
        general_mat_mul(
            A::one(),
            &state.scratch_mr.t(),
            &state.input_n,
            A::zero(),
            &mut state.scratch_rm,
        );
        let mut cov_t = cov.index_axis_mut(Axis(0), t);
        cov_t.assign(&model.state_cov(t));
        general_mat_mul(
            A::zero() - A::one(),
            &state.scratch_rm,
            &state.scratch_mr,
            A::one(),
            &mut cov_t,
        );
    }
    Ok(())
}
