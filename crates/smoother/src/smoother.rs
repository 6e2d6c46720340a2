//! Backward driver tying the three recursion steps together.

use ndarray::ArrayView2;
use tracing::{debug, trace, warn};

use ksmooth_filter::FilterOutput;
use ksmooth_model::{Scalar, StateSpaceModel};

use crate::config::SmootherConfig;
use crate::disturbance::smooth_disturbances;
use crate::error::SmootherError;
use crate::measurement::{MeasurementCache, sweep};
use crate::results::SmootherResults;
use crate::state::RecursionState;
use crate::time_update::propagate;

/// Univariate-treatment Kalman smoother over one filter pass.
///
/// The smoother borrows the model and filter output and owns all working
/// buffers. Either call [`run()`](Self::run), or drive the steps yourself
/// from the last period to the first:
///
/// ```text
/// for t in (0..nobs).rev() {
///     let cache = smoother.measurement_update(t)?;
///     smoother.disturbance_smoother(t, &cache)?;
///     smoother.time_update(t)?;
/// }
/// ```
///
/// Calling [`measurement_update()`](Self::measurement_update) for the last
/// period always restores the terminal boundary `r = 0`, `N = 0`.
#[derive(Debug)]
pub struct UnivariateSmoother<'a, A> {
    model: &'a StateSpaceModel<A>,
    filter: &'a FilterOutput<A>,
    config: SmootherConfig,
    state: RecursionState<A>,
    results: SmootherResults<A>,
}

impl<'a, A: Scalar> UnivariateSmoother<'a, A> {
    /// Creates a smoother for `filter`, which must have been produced for
    /// `model`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SmootherError::DimensionMismatch`] | filter and model dimensions differ |
    /// | [`SmootherError::Model`] | time-varying matrices do not cover the filtered periods |
    pub fn new(
        model: &'a StateSpaceModel<A>,
        filter: &'a FilterOutput<A>,
        config: SmootherConfig,
    ) -> Result<Self, SmootherError> {
        let dims = model.dims();
        let filtered = filter.dims();
        for (what, expected, got) in [
            ("k_states", dims.k_states, filtered.k_states),
            ("k_endog", dims.k_endog, filtered.k_endog),
            ("k_posdef", dims.k_posdef, filtered.k_posdef),
        ] {
            if expected != got {
                return Err(SmootherError::DimensionMismatch {
                    what,
                    expected,
                    got,
                });
            }
        }
        model.check_nobs(filter.nobs())?;

        let with_states = config.smoothed_state()
            && filter.predicted_state().is_some()
            && filter.predicted_state_cov().is_some();
        Ok(Self {
            model,
            filter,
            config,
            state: RecursionState::new(dims),
            results: SmootherResults::allocate(config.output(), dims, filter.nobs(), with_states),
        })
    }

    fn check_time(&self, t: usize) -> Result<(), SmootherError> {
        let nobs = self.filter.nobs();
        if t >= nobs {
            return Err(SmootherError::TimeIndexOutOfRange { t, nobs });
        }
        Ok(())
    }

    /// Restores `r = 0`, `N = 0` and clears the step bookkeeping.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Sweeps the observation components of period `t` in reverse and
    /// records `r[t,0]`/`N[t,0]` (and smoothed states) for `t`.
    ///
    /// # Errors
    ///
    /// Returns [`SmootherError::TimeIndexOutOfRange`] for `t >= nobs` and
    /// [`SmootherError::StepOrder`] unless `t` is the last period or
    /// `time_update(t + 1)` has just run.
    pub fn measurement_update(&mut self, t: usize) -> Result<MeasurementCache<A>, SmootherError> {
        self.check_time(t)?;
        if t + 1 == self.filter.nobs() {
            self.state.reset();
        } else if self.state.next_sweep != Some(t) {
            return Err(SmootherError::StepOrder {
                operation: "measurement_update",
                t,
            });
        }

        let cache = sweep(self.model, self.filter, self.config.output(), t, &mut self.state);
        self.results.record_sweep(t, self.filter, &mut self.state);
        self.state.swept = Some(t);
        self.state.next_sweep = None;
        Ok(cache)
    }

    /// Computes the smoothed disturbances of period `t` from the cache of
    /// `measurement_update(t)`.
    ///
    /// May run before or after `time_update(t)`, but not after the next
    /// measurement sweep.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`SmootherError::TimeIndexOutOfRange`] | `t >= nobs` |
    /// | [`SmootherError::CacheTimeMismatch`] | `cache` was built for another period |
    /// | [`SmootherError::StepOrder`] | the last sweep was not for `t` |
    /// | [`SmootherError::MissingCache`] | `cache` lacks a part the output mode needs |
    pub fn disturbance_smoother(
        &mut self,
        t: usize,
        cache: &MeasurementCache<A>,
    ) -> Result<(), SmootherError> {
        self.check_time(t)?;
        if cache.time() != t {
            return Err(SmootherError::CacheTimeMismatch {
                cache_t: cache.time(),
                t,
            });
        }
        if self.state.input_time != Some(t) {
            return Err(SmootherError::StepOrder {
                operation: "disturbance_smoother",
                t,
            });
        }
        smooth_disturbances(
            self.model,
            self.filter,
            self.config.output(),
            t,
            cache,
            &mut self.state,
            &mut self.results,
        )
    }

    /// Propagates `r` and `N` from period `t` to `t - 1`. No-op at `t = 0`.
    ///
    /// # Errors
    ///
    /// Returns [`SmootherError::TimeIndexOutOfRange`] for `t >= nobs` and
    /// [`SmootherError::StepOrder`] unless `measurement_update(t)` has just
    /// run.
    pub fn time_update(&mut self, t: usize) -> Result<(), SmootherError> {
        self.check_time(t)?;
        if self.state.swept != Some(t) {
            return Err(SmootherError::StepOrder {
                operation: "time_update",
                t,
            });
        }
        propagate(self.model, self.config.output(), t, &mut self.state);
        self.state.swept = None;
        self.state.next_sweep = t.checked_sub(1);
        Ok(())
    }

    /// Runs the full backward pass from the last period to the first.
    ///
    /// Starts from the terminal boundary, so repeated calls give identical
    /// results.
    ///
    /// # Errors
    ///
    /// Propagates any error of the individual steps.
    #[tracing::instrument(
        skip_all,
        fields(
            nobs = self.filter.nobs(),
            k_endog = self.model.k_endog(),
            output = ?self.config.output().labels()
        )
    )]
    pub fn run(&mut self) -> Result<(), SmootherError> {
        self.reset();
        for t in (0..self.filter.nobs()).rev() {
            let cache = self.measurement_update(t)?;
            self.disturbance_smoother(t, &cache)?;
            self.time_update(t)?;
            trace!(t, "period smoothed");
        }

        if self.state.degenerate > 0 {
            warn!(
                n_degenerate = self.state.degenerate,
                "components with zero or non-finite forecast error variance were skipped"
            );
        }
        debug!(n_missing = self.state.missing, "smoother pass complete");
        Ok(())
    }

    /// Results recorded so far.
    pub fn results(&self) -> &SmootherResults<A> {
        &self.results
    }

    /// Consumes the smoother and returns its results.
    pub fn into_results(self) -> SmootherResults<A> {
        self.results
    }

    /// `T[t] L[t,p-1] ... L[t,0]` from the most recent measurement sweep.
    pub fn propagation_matrix(&self) -> ArrayView2<'_, A> {
        self.state.propagation.view()
    }

    /// Number of components skipped so far in the current pass because
    /// their forecast error variance was zero or non-finite.
    pub fn degenerate_count(&self) -> usize {
        self.state.degenerate
    }

    /// Number of missing components skipped so far in the current pass.
    pub fn missing_count(&self) -> usize {
        self.state.missing
    }

    /// The configuration the smoother was built with.
    pub fn config(&self) -> SmootherConfig {
        self.config
    }
}

/// Runs a full backward pass and returns the results.
///
/// # Errors
///
/// See [`UnivariateSmoother::new()`] and [`UnivariateSmoother::run()`].
pub fn smooth<A: Scalar>(
    model: &StateSpaceModel<A>,
    filter: &FilterOutput<A>,
    config: SmootherConfig,
) -> Result<SmootherResults<A>, SmootherError> {
    let mut smoother = UnivariateSmoother::new(model, filter, config)?;
    smoother.run()?;
    Ok(smoother.into_results())
}
