//! # ksmooth-filter
//!
//! Univariate-treatment Kalman filter for [`StateSpaceModel`]s.
//!
//! The filter processes each observation vector one scalar component at a
//! time and records, for every `(t, i)` pair, the quantities the backward
//! smoother in `ksmooth-smoother` consumes: forecast error `v`, forecast
//! error variance `F`, Kalman gain `K` and the cached ratios `v/F`, `1/F` and
//! `H/F`.
//!
//! ```
//! use ksmooth_filter::univariate_filter;
//! use ksmooth_model::StateSpaceModel;
//! use ndarray::array;
//!
//! let model = StateSpaceModel::local_level(1.0, 0.5).unwrap();
//! let y = array![[1.0], [1.2], [f64::NAN], [0.8]];
//! let out = univariate_filter(&model, y.view()).unwrap();
//! assert_eq!(out.nobs(), 4);
//! assert!(out.is_missing(2, 0));
//! ```
//!
//! Filters written elsewhere can feed the smoother through
//! [`FilterOutput::from_parts()`].
//!
//! [`StateSpaceModel`]: ksmooth_model::StateSpaceModel

mod error;
mod kalman;
mod output;

pub use error::FilterError;
pub use kalman::univariate_filter;
pub use output::{FilterOutput, FilterParts};
