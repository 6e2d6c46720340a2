use std::path::PathBuf;

use serde::Deserialize;

/// Top-level ksmooth configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KsmoothConfig {
    /// System matrices.
    pub model: ModelToml,

    /// Initial state distribution.
    #[serde(default)]
    pub initialization: InitializationToml,

    /// Observations.
    pub data: DataToml,

    /// Requested outputs.
    #[serde(default)]
    pub output: OutputToml,
}

/// Time-invariant system matrices, given as rows.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelToml {
    pub design: Vec<Vec<f64>>,
    pub obs_cov: Vec<Vec<f64>>,
    pub transition: Vec<Vec<f64>>,
    pub selection: Vec<Vec<f64>>,
    pub state_cov: Vec<Vec<f64>>,
    #[serde(default)]
    pub subset_design: bool,
}

/// Either a known `state`/`cov` pair or an approximate-diffuse variance.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitializationToml {
    pub state: Option<Vec<f64>>,
    pub cov: Option<Vec<Vec<f64>>>,
    pub diffuse_variance: Option<f64>,
}

/// Exactly one of inline `observations` or a `path` to a text file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataToml {
    pub observations: Option<Vec<Vec<f64>>>,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputToml {
    #[serde(default = "default_modes")]
    pub modes: Vec<String>,
    #[serde(default = "default_precision")]
    pub precision: String,
    #[serde(default = "default_true")]
    pub smoothed_state: bool,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for OutputToml {
    fn default() -> Self {
        Self {
            modes: default_modes(),
            precision: default_precision(),
            smoothed_state: true,
            path: None,
        }
    }
}

fn default_modes() -> Vec<String> {
    vec!["all".to_string()]
}
fn default_precision() -> String {
    "double".to_string()
}
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg: KsmoothConfig = toml::from_str(
            r#"
            [model]
            design = [[1.0]]
            obs_cov = [[2.0]]
            transition = [[1.0]]
            selection = [[1.0]]
            state_cov = [[1.0]]

            [data]
            observations = [[1.0], [nan], [0.5]]
            "#,
        )
        .unwrap();
        assert!(!cfg.model.subset_design);
        assert!(cfg.initialization.diffuse_variance.is_none());
        assert_eq!(cfg.output.modes, vec!["all"]);
        assert_eq!(cfg.output.precision, "double");
        assert!(cfg.output.smoothed_state);
        let obs = cfg.data.observations.unwrap();
        assert!(obs[1][0].is_nan());
    }

    #[test]
    fn rejects_unknown_fields() {
        let res: Result<KsmoothConfig, _> = toml::from_str(
            r#"
            [model]
            design = [[1.0]]
            obs_cov = [[2.0]]
            transition = [[1.0]]
            selection = [[1.0]]
            state_cov = [[1.0]]
            intercept = [0.0]

            [data]
            path = "y.txt"
            "#,
        );
        assert!(res.is_err());
    }
}
