//! Pure conversion functions: TOML config structs -> crate API types.

use anyhow::{Context, Result, bail};
use ndarray::{Array1, Array2};

use ksmooth_model::{Initialization, Scalar, StateSpaceModel};
use ksmooth_smoother::{SmootherConfig, SmootherOutput};

use crate::config::*;

/// Floating-point precision the pipeline runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    pub fn name(self) -> &'static str {
        match self {
            Precision::Single => "single",
            Precision::Double => "double",
        }
    }
}

/// Parses a precision name into the corresponding enum variant.
pub fn parse_precision(s: &str) -> Result<Precision> {
    match s.to_lowercase().as_str() {
        "single" | "f32" => Ok(Precision::Single),
        "double" | "f64" => Ok(Precision::Double),
        other => bail!("unknown precision: {other:?}"),
    }
}

/// Combines output mode names into a [`SmootherOutput`] mask.
pub fn parse_modes(names: &[String]) -> Result<SmootherOutput> {
    if names.is_empty() {
        bail!("output.modes must name at least one output");
    }
    let mut mode = SmootherOutput::empty();
    for name in names {
        match SmootherOutput::from_name(&name.to_lowercase()) {
            Some(flag) => mode |= flag,
            None => bail!("unknown output mode: {name:?}"),
        }
    }
    Ok(mode)
}

/// Converts nested rows into a matrix, rejecting ragged input.
pub fn matrix<A: Scalar>(name: &str, rows: &[Vec<f64>]) -> Result<Array2<A>> {
    let n_cols = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_cols) {
        bail!(
            "{name}: row {i} has {} entries, expected {n_cols}",
            row.len()
        );
    }
    let flat: Vec<A> = rows.iter().flatten().map(|&x| A::from_f64(x)).collect();
    Array2::from_shape_vec((rows.len(), n_cols), flat)
        .with_context(|| format!("{name}: invalid shape"))
}

/// Builds a [`StateSpaceModel`] in precision `A`.
pub fn build_model<A: Scalar>(
    model: &ModelToml,
    init: &InitializationToml,
) -> Result<StateSpaceModel<A>> {
    let ssm = StateSpaceModel::new(
        matrix::<A>("design", &model.design)?,
        matrix::<A>("obs_cov", &model.obs_cov)?,
        matrix::<A>("transition", &model.transition)?,
        matrix::<A>("selection", &model.selection)?,
        matrix::<A>("state_cov", &model.state_cov)?,
    )
    .context("invalid model")?
    .with_subset_design(model.subset_design);

    let initialization = match (&init.state, &init.cov, init.diffuse_variance) {
        (Some(state), Some(cov), None) => Initialization::Known {
            state: state.iter().map(|&x| A::from_f64(x)).collect::<Array1<A>>(),
            cov: matrix::<A>("initialization.cov", cov)?,
        },
        (None, None, Some(variance)) => Initialization::ApproximateDiffuse { variance },
        (None, None, None) => return Ok(ssm),
        _ => bail!(
            "initialization must have either both state and cov, or diffuse_variance alone"
        ),
    };
    ssm.with_initialization(initialization)
        .context("invalid initialization")
}

/// Builds a [`SmootherConfig`] from the TOML output configuration.
pub fn build_smoother_config(output: &OutputToml) -> Result<SmootherConfig> {
    let mode = parse_modes(&output.modes)?;
    Ok(SmootherConfig::new(mode).with_smoothed_state(output.smoothed_state))
}

/// Parses whitespace-delimited observations, one period per line.
///
/// `nan` and `NA` mark missing values; blank lines and lines starting with
/// `#` are skipped.
pub fn parse_observations(text: &str) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| match tok {
                "NA" | "nan" | "NaN" => Ok(f64::NAN),
                _ => tok
                    .parse::<f64>()
                    .with_context(|| format!("line {}: invalid value {tok:?}", lineno + 1)),
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Resolves the `[data]` section into observation rows.
pub fn load_observations(data: &DataToml) -> Result<Vec<Vec<f64>>> {
    match (&data.observations, &data.path) {
        (Some(rows), None) => Ok(rows.clone()),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read observations: {}", path.display()))?;
            parse_observations(&text)
        }
        (Some(_), Some(_)) => bail!("data must have exactly one of observations or path, got both"),
        (None, None) => bail!("data must have exactly one of observations or path, got neither"),
    }
}
