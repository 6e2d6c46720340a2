//! Measurement-update recursion over the observation components of one period.
//!
//! Components are visited from last to first. For an informative component
//! `i` with gain `K`, design row `Z` and `L = I - K Z`:
//!
//! ```text
//! d1[i] = K' r
//! d2[i] = K' N K
//! r     = L' r + Z' v / F
//! N     = L' N L + Z' Z / F
//! ```
//!
//! Missing components and components with a zero or non-finite `F` act as
//! `L = I` and leave `r` and `N` untouched.

use ndarray::linalg::{general_mat_mul, general_mat_vec_mul};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, LinalgScalar, s};
use tracing::{debug, trace};

use ksmooth_filter::FilterOutput;
use ksmooth_model::{Scalar, StateSpaceModel};

use crate::output_mode::SmootherOutput;
use crate::state::RecursionState;

/// Partial quantities cached by a measurement sweep for the disturbance
/// smoother of the same period.
///
/// `d1[i] = K[t,i]' r[t,i]` and `d2[i] = K[t,i]' N[t,i] K[t,i]`, both taken
/// before component `i` updates `r`/`N`. Each is present only when the
/// output mode that consumes it was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementCache<A> {
    pub(crate) time: usize,
    pub(crate) d1: Option<Array1<A>>,
    pub(crate) d2: Option<Array1<A>>,
}

impl<A> MeasurementCache<A> {
    /// Time index of the sweep that produced the cache.
    pub fn time(&self) -> usize {
        self.time
    }

    /// `K' r` per component, if cached.
    pub fn d1(&self) -> Option<&Array1<A>> {
        self.d1.as_ref()
    }

    /// `K' N K` per component, if cached.
    pub fn d2(&self) -> Option<&Array1<A>> {
        self.d2.as_ref()
    }
}

/// Multiplies `factor` into the running product from the right:
/// `acc = acc * factor`.
///
/// Folding the components of one period in visiting order (last to first)
/// leaves `acc = L[p-1] * ... * L[0]`. `scratch` must have the shape of `acc`.
pub fn accumulate_factor<A: LinalgScalar>(
    acc: &mut Array2<A>,
    factor: ArrayView2<'_, A>,
    scratch: &mut Array2<A>,
) {
    general_mat_mul(A::one(), &*acc, &factor, A::zero(), scratch);
    acc.assign(scratch);
}

/// Whether component `i` at time `t` carries information.
pub(crate) fn is_informative<A: Scalar>(filter: &FilterOutput<A>, t: usize, i: usize) -> bool {
    !filter.is_missing(t, i) && !filter.forecast_error_cov()[[t, i]].is_degenerate()
}

/// Writes `L = I - K Z` into `factor`, using only the first `k_design`
/// columns of `Z`.
fn form_factor<A: Scalar>(
    factor: &mut Array2<A>,
    gain: ArrayView1<'_, A>,
    design_row: ArrayView1<'_, A>,
    k_design: usize,
) {
    factor.fill(A::zero());
    factor.diag_mut().fill(A::one());
    let gain_col = gain.insert_axis(Axis(1));
    let z_row = design_row.slice_move(s![..k_design]).insert_axis(Axis(0));
    general_mat_mul(
        A::zero() - A::one(),
        &gain_col,
        &z_row,
        A::one(),
        &mut factor.slice_mut(s![.., ..k_design]),
    );
}

/// Runs the component sweep for period `t` and fills the propagation matrix.
pub(crate) fn sweep<A: Scalar>(
    model: &StateSpaceModel<A>,
    filter: &FilterOutput<A>,
    output: SmootherOutput,
    t: usize,
    state: &mut RecursionState<A>,
) -> MeasurementCache<A> {
    let dims = model.dims();
    let k_design = if model.subset_design() {
        dims.k_posdef.min(dims.k_states)
    } else {
        dims.k_states
    };

    state.input_r.assign(&state.carried_r);
    state.input_n.assign(&state.carried_n);
    state.input_time = Some(t);

    let mut d1 = output
        .contains(SmootherOutput::DISTURBANCE)
        .then(|| Array1::zeros(dims.k_endog));
    let mut d2 = output
        .contains(SmootherOutput::DISTURBANCE_COV)
        .then(|| Array1::zeros(dims.k_endog));

    let design = model.design(t);
    let mut accumulated = false;

    for i in (0..dims.k_endog).rev() {
        if !is_informative(filter, t, i) {
            if filter.is_missing(t, i) {
                state.missing += 1;
            } else {
                debug!(
                    t,
                    i,
                    f = ?filter.forecast_error_cov()[[t, i]],
                    "degenerate forecast error variance, component skipped"
                );
                state.degenerate += 1;
            }
            continue;
        }

        let gain = filter.kalman_gain().slice(s![t, i, ..]);
        let z = design.row(i);

        if let Some(d1) = d1.as_mut() {
            d1[i] = gain.dot(&state.r);
        }
        if let Some(d2) = d2.as_mut() {
            general_mat_vec_mul(A::one(), &state.n, &gain, A::zero(), &mut state.scratch_m);
            d2[i] = gain.dot(&state.scratch_m);
        }

        form_factor(&mut state.factor, gain.view(), z.view(), k_design);
        if accumulated {
            accumulate_factor(&mut state.l_accum, state.factor.view(), &mut state.scratch_mm);
        } else {
            state.l_accum.assign(&state.factor);
            accumulated = true;
        }

        if output.updates_r() {
            general_mat_vec_mul(
                A::one(),
                &state.factor.t(),
                &state.r,
                A::zero(),
                &mut state.scratch_m,
            );
            state.r.assign(&state.scratch_m);
            state.r.scaled_add(filter.v_over_f()[[t, i]], &z);
        }

        if output.updates_n() {
            general_mat_mul(
                A::one(),
                &state.factor.t(),
                &state.n,
                A::zero(),
                &mut state.scratch_mm,
            );
            general_mat_mul(A::one(), &state.scratch_mm, &state.factor, A::zero(), &mut state.n);
            let z_col = z.view().insert_axis(Axis(1));
            let z_row = z.view().insert_axis(Axis(0));
            general_mat_mul(filter.inv_f()[[t, i]], &z_col, &z_row, A::one(), &mut state.n);
        }
    }

    if !accumulated {
        state.l_accum.fill(A::zero());
        state.l_accum.diag_mut().fill(A::one());
    }
    general_mat_mul(
        A::one(),
        &model.transition(t),
        &state.l_accum,
        A::zero(),
        &mut state.propagation,
    );
    trace!(t, "measurement sweep complete");

    MeasurementCache { time: t, d1, d2 }
}
