//! Linear Gaussian state-space model.
//!
//! ```text
//! y[t]   = Z[t] * x[t] + eps[t],      eps[t] ~ N(0, H[t])
//! x[t+1] = T[t] * x[t] + R[t] * e[t],   e[t] ~ N(0, Q[t])
//! ```
//!
//! `Z` is the design matrix (p x m), `H` the observation covariance (p x p,
//! diagonal), `T` the transition matrix (m x m), `R` the selection matrix
//! (m x r) and `Q` the state disturbance covariance (r x r).

use ndarray::{Array1, Array2, ArrayView2, Axis};
use num_traits::{One, Zero};

use crate::error::ModelError;
use crate::scalar::Scalar;
use crate::time_varying::TimeVarying;

/// Default variance of the approximate-diffuse initialization.
pub const DEFAULT_DIFFUSE_VARIANCE: f64 = 1e6;

/// Model dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    /// Number of states `m`.
    pub k_states: usize,
    /// Number of observation components `p`.
    pub k_endog: usize,
    /// Number of state disturbances `r`.
    pub k_posdef: usize,
}

/// Initial predicted state `a[0]` and covariance `P[0]`.
#[derive(Clone, Debug, PartialEq)]
pub enum Initialization<A> {
    /// Known mean and covariance.
    Known {
        /// Initial state mean (length m).
        state: Array1<A>,
        /// Initial state covariance (m x m).
        cov: Array2<A>,
    },
    /// Zero mean with covariance `variance * I`.
    ApproximateDiffuse {
        /// Diagonal variance.
        variance: f64,
    },
}

/// A linear Gaussian state-space model.
///
/// System matrices are read-only once the model is built. Each one is
/// independently fixed or time-varying; see [`TimeVarying`].
#[derive(Clone, Debug)]
pub struct StateSpaceModel<A> {
    dims: Dimensions,
    design: TimeVarying<A>,
    obs_cov: TimeVarying<A>,
    transition: TimeVarying<A>,
    selection: TimeVarying<A>,
    state_cov: TimeVarying<A>,
    subset_design: bool,
    initialization: Initialization<A>,
}

impl<A: Scalar> StateSpaceModel<A> {
    /// Builds a model from its system matrices.
    ///
    /// Dimensions are taken from the design (p x m) and selection (m x r)
    /// matrices. The model starts with an approximate-diffuse
    /// initialization and the subset-design flag cleared.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ModelError::EmptySeries`] | a time-varying matrix has no slices |
    /// | [`ModelError::EmptyDimension`] | m, p or r is zero |
    /// | [`ModelError::ShapeMismatch`] | any slice has the wrong shape |
    /// | [`ModelError::PeriodMismatch`] | time-varying matrices disagree on length |
    /// | [`ModelError::NonDiagonalObsCov`] | H has a non-zero off-diagonal entry |
    pub fn new(
        design: impl Into<TimeVarying<A>>,
        obs_cov: impl Into<TimeVarying<A>>,
        transition: impl Into<TimeVarying<A>>,
        selection: impl Into<TimeVarying<A>>,
        state_cov: impl Into<TimeVarying<A>>,
    ) -> Result<Self, ModelError> {
        let design = design.into();
        let obs_cov = obs_cov.into();
        let transition = transition.into();
        let selection = selection.into();
        let state_cov = state_cov.into();

        let (k_endog, k_states) = first_shape(&design, "design")?;
        let (_, k_posdef) = first_shape(&selection, "selection")?;
        let dims = Dimensions {
            k_states,
            k_endog,
            k_posdef,
        };
        for (name, value) in [
            ("k_states", k_states),
            ("k_endog", k_endog),
            ("k_posdef", k_posdef),
        ] {
            if value == 0 {
                return Err(ModelError::EmptyDimension { name });
            }
        }

        check_shape(&design, "design", (k_endog, k_states))?;
        check_shape(&obs_cov, "obs_cov", (k_endog, k_endog))?;
        check_shape(&transition, "transition", (k_states, k_states))?;
        check_shape(&selection, "selection", (k_states, k_posdef))?;
        check_shape(&state_cov, "state_cov", (k_posdef, k_posdef))?;

        let mut n_periods: Option<usize> = None;
        for (name, tv) in [
            ("design", &design),
            ("obs_cov", &obs_cov),
            ("transition", &transition),
            ("selection", &selection),
            ("state_cov", &state_cov),
        ] {
            if let Some(n) = tv.n_periods() {
                match n_periods {
                    None => n_periods = Some(n),
                    Some(expected) if expected != n => {
                        return Err(ModelError::PeriodMismatch {
                            matrix: name,
                            expected,
                            got: n,
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        for (t, h) in obs_cov.slices().enumerate() {
            let off_diagonal = h
                .indexed_iter()
                .any(|((i, j), &v)| i != j && v != A::zero());
            if off_diagonal {
                return Err(ModelError::NonDiagonalObsCov { t });
            }
        }

        Ok(Self {
            dims,
            design,
            obs_cov,
            transition,
            selection,
            state_cov,
            subset_design: false,
            initialization: Initialization::ApproximateDiffuse {
                variance: DEFAULT_DIFFUSE_VARIANCE,
            },
        })
    }

    /// Builds the ARMA(p,q) model in companion form, observed with noise.
    ///
    /// `T` has `ar` in its first column and ones on the super-diagonal,
    /// `R = [1, ma..., 0...]'`, `Z = [1, 0, ..., 0]`, `Q = sigma2` and
    /// `H = obs_var`. The state dimension is `max(p, q + 1)`, minimum 1.
    pub fn arma(ar: &[A], ma: &[A], sigma2: A, obs_var: A) -> Result<Self, ModelError> {
        let p = ar.len();
        let q = ma.len();
        let m = p.max(q + 1).max(1);

        let mut transition = Array2::zeros((m, m));
        for (i, &phi) in ar.iter().enumerate() {
            transition[[i, 0]] = phi;
        }
        for i in 0..m.saturating_sub(1) {
            transition[[i, i + 1]] = A::one();
        }

        let mut r_vec = Array1::zeros(m);
        r_vec[0] = A::one();
        for (j, &theta) in ma.iter().enumerate() {
            r_vec[j + 1] = theta;
        }
        let selection = r_vec.insert_axis(Axis(1)); // (m, 1)

        let mut design = Array2::zeros((1, m));
        design[[0, 0]] = A::one();

        Self::new(
            design,
            Array2::from_elem((1, 1), obs_var),
            transition,
            selection,
            Array2::from_elem((1, 1), sigma2),
        )
    }

    /// Builds the local-level (random walk plus noise) model.
    pub fn local_level(obs_var: A, level_var: A) -> Result<Self, ModelError> {
        let one = Array2::from_elem((1, 1), A::one());
        Self::new(
            one.clone(),
            Array2::from_elem((1, 1), obs_var),
            one.clone(),
            one,
            Array2::from_elem((1, 1), level_var),
        )
    }

    /// Restricts the design to the first `k_posdef` states when forming the
    /// smoother's `L` matrices (VAR-type transitions).
    pub fn with_subset_design(mut self, subset_design: bool) -> Self {
        self.subset_design = subset_design;
        self
    }

    /// Sets the initial predicted state and covariance.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InitializationMismatch`] if the state or covariance
    /// does not match `k_states`, or [`ModelError::InvalidDiffuseVariance`]
    /// for a non-finite or non-positive diffuse variance.
    pub fn with_initialization(mut self, init: Initialization<A>) -> Result<Self, ModelError> {
        let m = self.dims.k_states;
        match &init {
            Initialization::Known { state, cov } => {
                if state.len() != m {
                    return Err(ModelError::InitializationMismatch {
                        what: "state",
                        expected: m,
                        got: state.len(),
                    });
                }
                if cov.dim() != (m, m) {
                    return Err(ModelError::InitializationMismatch {
                        what: "cov",
                        expected: m,
                        got: cov.nrows().max(cov.ncols()),
                    });
                }
            }
            Initialization::ApproximateDiffuse { variance } => {
                if !variance.is_finite() || *variance <= 0.0 {
                    return Err(ModelError::InvalidDiffuseVariance {
                        variance: variance.to_string(),
                    });
                }
            }
        }
        self.initialization = init;
        Ok(self)
    }

    /// Checks that every time-varying matrix covers exactly `nobs` periods.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PeriodMismatch`] naming the first offending matrix.
    pub fn check_nobs(&self, nobs: usize) -> Result<(), ModelError> {
        for (name, tv) in [
            ("design", &self.design),
            ("obs_cov", &self.obs_cov),
            ("transition", &self.transition),
            ("selection", &self.selection),
            ("state_cov", &self.state_cov),
        ] {
            if let Some(n) = tv.n_periods() {
                if n != nobs {
                    return Err(ModelError::PeriodMismatch {
                        matrix: name,
                        expected: nobs,
                        got: n,
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns the initial predicted state `a[0]` and covariance `P[0]`.
    pub fn initial_state(&self) -> (Array1<A>, Array2<A>) {
        let m = self.dims.k_states;
        match &self.initialization {
            Initialization::Known { state, cov } => (state.clone(), cov.clone()),
            Initialization::ApproximateDiffuse { variance } => (
                Array1::zeros(m),
                Array2::eye(m) * A::from_f64(*variance),
            ),
        }
    }

    /// Model dimensions.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// Number of states `m`.
    pub fn k_states(&self) -> usize {
        self.dims.k_states
    }

    /// Number of observation components `p`.
    pub fn k_endog(&self) -> usize {
        self.dims.k_endog
    }

    /// Number of state disturbances `r`.
    pub fn k_posdef(&self) -> usize {
        self.dims.k_posdef
    }

    /// Whether the subset-design restriction is active.
    pub fn subset_design(&self) -> bool {
        self.subset_design
    }

    /// The initialization in effect.
    pub fn initialization(&self) -> &Initialization<A> {
        &self.initialization
    }

    /// Number of periods fixed by time-varying matrices, if any.
    pub fn n_periods(&self) -> Option<usize> {
        [
            &self.design,
            &self.obs_cov,
            &self.transition,
            &self.selection,
            &self.state_cov,
        ]
        .into_iter()
        .find_map(TimeVarying::n_periods)
    }

    /// Design matrix `Z[t]` (p x m).
    pub fn design(&self, t: usize) -> ArrayView2<'_, A> {
        self.design.at(t)
    }

    /// Observation covariance `H[t]` (p x p, diagonal).
    pub fn obs_cov(&self, t: usize) -> ArrayView2<'_, A> {
        self.obs_cov.at(t)
    }

    /// Transition matrix `T[t]` (m x m).
    pub fn transition(&self, t: usize) -> ArrayView2<'_, A> {
        self.transition.at(t)
    }

    /// Selection matrix `R[t]` (m x r).
    pub fn selection(&self, t: usize) -> ArrayView2<'_, A> {
        self.selection.at(t)
    }

    /// State disturbance covariance `Q[t]` (r x r).
    pub fn state_cov(&self, t: usize) -> ArrayView2<'_, A> {
        self.state_cov.at(t)
    }

    /// Computes `R[t] * Q[t] * R[t]'` (m x m).
    pub fn selected_state_cov(&self, t: usize) -> Array2<A> {
        let selection = self.selection(t);
        selection.dot(&self.state_cov(t)).dot(&selection.t())
    }
}

fn first_shape<A>(tv: &TimeVarying<A>, matrix: &'static str) -> Result<(usize, usize), ModelError> {
    tv.slices()
        .next()
        .map(|m| m.dim())
        .ok_or(ModelError::EmptySeries { matrix })
}

fn check_shape<A>(
    tv: &TimeVarying<A>,
    matrix: &'static str,
    expected: (usize, usize),
) -> Result<(), ModelError> {
    if tv.n_periods() == Some(0) {
        return Err(ModelError::EmptySeries { matrix });
    }
    match tv.slices().map(|m| m.dim()).find(|&got| got != expected) {
        Some(got) => Err(ModelError::ShapeMismatch {
            matrix,
            expected,
            got,
        }),
        None => Ok(()),
    }
}
