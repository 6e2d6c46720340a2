//! # ksmooth-smoother
//!
//! Backward Kalman smoother for the univariate treatment of multivariate
//! observations (Durbin & Koopman, 2012, section 6.4).
//!
//! Given a [`FilterOutput`] produced one observation component at a time,
//! the smoother iterates time backward. Each period runs three steps:
//!
//! 1. **Measurement update**: sweeps components `p-1..=0`, updating the
//!    scaled smoothing error `r` and its covariance `N`, and accumulating the
//!    ordered product `L[t,p-1] ... L[t,0]`.
//! 2. **Disturbance smoother**: smoothed measurement disturbances from the
//!    cached sweep quantities, and state disturbances from `r[t+1,0]` and
//!    `N[t+1,0]` taken before the time update applied `T[t]`.
//! 3. **Time update**: carries `r` and `N` into the previous period.
//!
//! Which quantities are computed is selected with [`SmootherOutput`] flags.
//!
//! ```
//! use ksmooth_filter::univariate_filter;
//! use ksmooth_model::StateSpaceModel;
//! use ksmooth_smoother::{SmootherConfig, SmootherOutput, smooth};
//! use ndarray::array;
//!
//! let model = StateSpaceModel::local_level(1.0, 0.5).unwrap();
//! let y = array![[1.0], [1.2], [f64::NAN], [0.8]];
//! let filter = univariate_filter(&model, y.view()).unwrap();
//!
//! let config = SmootherConfig::new(SmootherOutput::STATE | SmootherOutput::DISTURBANCE);
//! let results = smooth(&model, &filter, config).unwrap();
//!
//! assert_eq!(results.smoothed_state().unwrap().nrows(), 4);
//! assert!(results.scaled_smoothed_estimator_cov().is_none());
//! ```
//!
//! [`FilterOutput`]: ksmooth_filter::FilterOutput

mod config;
mod disturbance;
mod error;
mod measurement;
mod output_mode;
mod results;
mod smoother;
mod state;
mod time_update;

pub use config::SmootherConfig;
pub use error::SmootherError;
pub use measurement::{MeasurementCache, accumulate_factor};
pub use output_mode::SmootherOutput;
pub use results::SmootherResults;
pub use smoother::{UnivariateSmoother, smooth};
