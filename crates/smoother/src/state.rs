//! Working buffers of the backward recursion.

use ndarray::{Array1, Array2};
use num_traits::Zero;

use ksmooth_model::{Dimensions, Scalar};

/// Mutable recursion state owned by one smoother.
///
/// `r`/`n` hold the running values. `carried_r`/`carried_n` keep `r[t,0]` and
/// `N[t,0]` as they were before the time update out of period `t` multiplied
/// them by the transition. The next sweep (period `t - 1`) moves them into
/// `input_r`/`input_n`, the values its state disturbances are built from.
/// Scratch buffers are always written before they are read.
#[derive(Debug, Clone)]
pub(crate) struct RecursionState<A> {
    pub(crate) r: Array1<A>,
    pub(crate) n: Array2<A>,
    pub(crate) input_r: Array1<A>,
    pub(crate) input_n: Array2<A>,
    pub(crate) carried_r: Array1<A>,
    pub(crate) carried_n: Array2<A>,
    pub(crate) l_accum: Array2<A>,
    pub(crate) propagation: Array2<A>,
    pub(crate) factor: Array2<A>,
    pub(crate) scratch_mm: Array2<A>,
    pub(crate) scratch_m: Array1<A>,
    pub(crate) scratch_mr: Array2<A>,
    pub(crate) scratch_rm: Array2<A>,
    /// Time index whose sweep produced `input_r`/`input_n`.
    pub(crate) input_time: Option<usize>,
    /// Time index whose sweep finished and awaits its time update.
    pub(crate) swept: Option<usize>,
    /// Time index the next sweep must be for, once a pass is underway.
    pub(crate) next_sweep: Option<usize>,
    pub(crate) degenerate: usize,
    pub(crate) missing: usize,
}

impl<A: Scalar> RecursionState<A> {
    pub(crate) fn new(dims: Dimensions) -> Self {
        let (m, r) = (dims.k_states, dims.k_posdef);
        Self {
            r: Array1::zeros(m),
            n: Array2::zeros((m, m)),
            input_r: Array1::zeros(m),
            input_n: Array2::zeros((m, m)),
            carried_r: Array1::zeros(m),
            carried_n: Array2::zeros((m, m)),
            l_accum: Array2::eye(m),
            propagation: Array2::zeros((m, m)),
            factor: Array2::zeros((m, m)),
            scratch_mm: Array2::zeros((m, m)),
            scratch_m: Array1::zeros(m),
            scratch_mr: Array2::zeros((m, r)),
            scratch_rm: Array2::zeros((r, m)),
            input_time: None,
            swept: None,
            next_sweep: None,
            degenerate: 0,
            missing: 0,
        }
    }

    /// Restores the terminal boundary `r = 0`, `N = 0`.
    pub(crate) fn reset(&mut self) {
        self.r.fill(A::zero());
        self.n.fill(A::zero());
        self.input_r.fill(A::zero());
        self.input_n.fill(A::zero());
        self.carried_r.fill(A::zero());
        self.carried_n.fill(A::zero());
        self.input_time = None;
        self.swept = None;
        self.next_sweep = None;
        self.degenerate = 0;
        self.missing = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_running_values() {
        let dims = Dimensions {
            k_states: 2,
            k_endog: 1,
            k_posdef: 1,
        };
        let mut state = RecursionState::<f64>::new(dims);
        state.r.fill(3.0);
        state.n.fill(-1.0);
        state.carried_r.fill(2.0);
        state.carried_n.fill(5.0);
        state.degenerate = 4;
        state.swept = Some(1);
        state.reset();
        assert!(state.r.iter().all(|&x| x == 0.0));
        assert!(state.n.iter().all(|&x| x == 0.0));
        assert!(state.carried_r.iter().all(|&x| x == 0.0));
        assert!(state.carried_n.iter().all(|&x| x == 0.0));
        assert_eq!(state.degenerate, 0);
        assert_eq!(state.swept, None);
        assert_eq!(state.scratch_mr.dim(), (2, 1));
    }
}
