//! JSON report of a filter and smoother run.

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, Axis};
use serde::Serialize;

use ksmooth_filter::FilterOutput;
use ksmooth_model::Scalar;
use ksmooth_smoother::SmootherResults;

/// Top-level report written by `ksmooth smooth`.
///
/// Missing and non-finite values serialize as `null`.
#[derive(Debug, Serialize)]
pub struct SmoothReport {
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaled_smoothed_estimator: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaled_smoothed_estimator_cov: Option<Vec<Vec<Vec<f64>>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed_state: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed_state_cov: Option<Vec<Vec<Vec<f64>>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed_measurement_disturbance: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed_measurement_disturbance_cov: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed_state_disturbance: Option<Vec<Vec<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed_state_disturbance_cov: Option<Vec<Vec<Vec<f64>>>>,
}

/// Dimensions, settings and diagnostics of the run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub nobs: usize,
    pub k_states: usize,
    pub k_endog: usize,
    pub k_posdef: usize,
    pub precision: &'static str,
    pub outputs: Vec<&'static str>,
    pub loglikelihood: Option<f64>,
    pub n_missing: usize,
    pub n_degenerate: usize,
}

fn rows<A: Copy + Into<f64>>(arr: &Array2<A>) -> Vec<Vec<f64>> {
    arr.outer_iter()
        .map(|row| row.iter().map(|&x| x.into()).collect())
        .collect()
}

fn mats<A: Copy + Into<f64>>(arr: &Array3<A>) -> Vec<Vec<Vec<f64>>> {
    arr.axis_iter(Axis(0))
        .map(|m| {
            m.outer_iter()
                .map(|row| row.iter().map(|&x| x.into()).collect())
                .collect()
        })
        .collect()
}

impl SmoothReport {
    /// Assembles the report from filter and smoother output.
    pub fn new<A: Scalar + Into<f64>>(
        precision: &'static str,
        filter: &FilterOutput<A>,
        results: &SmootherResults<A>,
        n_degenerate: usize,
    ) -> Self {
        let dims = filter.dims();
        let summary = Summary {
            nobs: filter.nobs(),
            k_states: dims.k_states,
            k_endog: dims.k_endog,
            k_posdef: dims.k_posdef,
            precision,
            outputs: results.output().labels(),
            loglikelihood: filter.loglikelihood().map(Into::into),
            n_missing: filter.missing().iter().filter(|&&m| m).count(),
            n_degenerate,
        };
        Self {
            summary,
            scaled_smoothed_estimator: results.scaled_smoothed_estimator().map(rows),
            scaled_smoothed_estimator_cov: results.scaled_smoothed_estimator_cov().map(mats),
            smoothed_state: results.smoothed_state().map(rows),
            smoothed_state_cov: results.smoothed_state_cov().map(mats),
            smoothed_measurement_disturbance: results.smoothed_measurement_disturbance().map(rows),
            smoothed_measurement_disturbance_cov: results
                .smoothed_measurement_disturbance_cov()
                .map(rows),
            smoothed_state_disturbance: results.smoothed_state_disturbance().map(rows),
            smoothed_state_disturbance_cov: results.smoothed_state_disturbance_cov().map(mats),
        }
    }
}

/// Serializes the report as pretty-printed JSON.
pub fn to_json(report: &SmoothReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report")
}
