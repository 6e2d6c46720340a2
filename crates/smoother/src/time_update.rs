//! Propagation of `r` and `N` across a period boundary.

use ndarray::linalg::{general_mat_mul, general_mat_vec_mul};

use ksmooth_model::{Scalar, StateSpaceModel};

use crate::output_mode::SmootherOutput;
use crate::state::RecursionState;

/// Carries the post-sweep values of period `t` into period `t - 1`:
///
/// ```text
/// r = T[t-1]' r
/// N = T[t-1]' N T[t-1]
/// ```
///
/// where `T[t-1]` maps the state at `t - 1` to the state at `t`. The values
/// before the multiplication are kept in `carried_r`/`carried_n` for the
/// state disturbances of period `t - 1`. Nothing happens at `t = 0`.
pub(crate) fn propagate<A: Scalar>(
    model: &StateSpaceModel<A>,
    output: SmootherOutput,
    t: usize,
    state: &mut RecursionState<A>,
) {
    let Some(prev) = t.checked_sub(1) else {
        return;
    };
    let transition = model.transition(prev);

    if output.updates_r() {
        state.carried_r.assign(&state.r);
        general_mat_vec_mul(
            A::one(),
            &transition.t(),
            &state.r,
            A::zero(),
            &mut state.scratch_m,
        );
        state.r.assign(&state.scratch_m);
    }
    if output.updates_n() {
        state.carried_n.assign(&state.n);
        general_mat_mul(
            A::one(),
            &transition.t(),
            &state.n,
            A::zero(),
            &mut state.scratch_mm,
        );
        general_mat_mul(A::one(), &state.scratch_mm, &transition, A::zero(), &mut state.n);
    }
}
