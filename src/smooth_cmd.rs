//! Smooth command: load a model and observations, filter, smooth, report.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use ksmooth_filter::univariate_filter;
use ksmooth_model::Scalar;
use ksmooth_smoother::UnivariateSmoother;

use crate::cli::SmoothArgs;
use crate::config::KsmoothConfig;
use crate::convert::{self, Precision};
use crate::report::{self, SmoothReport};

/// Runs the filter and smoother described by the config file.
pub fn run(args: SmoothArgs) -> Result<()> {
    let _cmd = info_span!("smooth").entered();

    let config = load_config(&args.config)?;
    let precision = match args.precision.as_deref() {
        Some(p) => convert::parse_precision(p)?,
        None => convert::parse_precision(&config.output.precision)?,
    };

    let report = match precision {
        Precision::Single => smooth_with::<f32>(&config, precision)?,
        Precision::Double => smooth_with::<f64>(&config, precision)?,
    };
    let json = report::to_json(&report)?;

    match args.output.as_ref().or(config.output.path.as_ref()) {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Reads and parses a TOML config file.
pub fn load_config(path: &Path) -> Result<KsmoothConfig> {
    let toml_str = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    toml::from_str(&toml_str).context("failed to parse TOML config")
}

/// Runs the pipeline in precision `A`.
pub fn smooth_with<A: Scalar + Into<f64>>(
    config: &KsmoothConfig,
    precision: Precision,
) -> Result<SmoothReport> {
    let model = convert::build_model::<A>(&config.model, &config.initialization)?;
    let smoother_config = convert::build_smoother_config(&config.output)?;
    let rows = convert::load_observations(&config.data)?;
    let observations = convert::matrix::<A>("observations", &rows)?;
    info!(
        nobs = observations.nrows(),
        k_endog = observations.ncols(),
        precision = precision.name(),
        "observations loaded"
    );

    let filter = univariate_filter(&model, observations.view()).context("filter failed")?;
    let mut smoother =
        UnivariateSmoother::new(&model, &filter, smoother_config).context("smoother setup failed")?;
    smoother.run().context("smoother failed")?;
    let n_degenerate = smoother.degenerate_count();
    info!(n_degenerate, "smoothing complete");

    Ok(SmoothReport::new(
        precision.name(),
        &filter,
        smoother.results(),
        n_degenerate,
    ))
}
