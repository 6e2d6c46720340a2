//! # ksmooth-model
//!
//! Linear Gaussian state-space model container shared by the filter and
//! smoother crates.
//!
//! ```text
//! y[t]   = Z[t] x[t] + eps[t]        eps[t] ~ N(0, H[t])   (H diagonal)
//! x[t+1] = T[t] x[t] + R[t] e[t]     e[t]   ~ N(0, Q[t])
//! ```
//!
//! Every system matrix is independently fixed or time-varying
//! ([`TimeVarying`]). All element types implement [`Scalar`]: `f32`, `f64`,
//! `Complex<f32>` and `Complex<f64>`.
//!
//! ## Mathematical Glossary
//!
//! | Symbol | Accessor | Shape | Meaning |
//! |--------|----------|-------|---------|
//! | Z | [`StateSpaceModel::design()`] | p x m | Maps states to observation means |
//! | H | [`StateSpaceModel::obs_cov()`] | p x p | Observation noise covariance |
//! | T | [`StateSpaceModel::transition()`] | m x m | State transition |
//! | R | [`StateSpaceModel::selection()`] | m x r | Selects disturbed states |
//! | Q | [`StateSpaceModel::state_cov()`] | r x r | State disturbance covariance |

mod error;
mod scalar;
mod state_space;
mod time_varying;

pub use error::ModelError;
pub use scalar::Scalar;
pub use state_space::{DEFAULT_DIFFUSE_VARIANCE, Dimensions, Initialization, StateSpaceModel};
pub use time_varying::TimeVarying;
