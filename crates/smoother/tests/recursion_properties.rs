//! Structural properties of the backward recursion: boundary handling,
//! product ordering, degenerate components, output gating and the subset
//! design restriction.

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2, Array3, array};

use ksmooth_filter::{FilterOutput, FilterParts, univariate_filter};
use ksmooth_model::{Initialization, StateSpaceModel};
use ksmooth_smoother::{
    SmootherConfig, SmootherOutput, UnivariateSmoother, accumulate_factor, smooth,
};

fn trend_model(design: Array2<f64>, obs_cov: Array2<f64>) -> StateSpaceModel<f64> {
    StateSpaceModel::new(
        design,
        obs_cov,
        array![[1.0, 1.0], [0.0, 1.0]],
        Array2::eye(2),
        array![[0.3, 0.0], [0.0, 0.1]],
    )
    .unwrap()
}

fn factor(gain: &Array1<f64>, z: &Array1<f64>) -> Array2<f64> {
    let outer = Array2::from_shape_fn((2, 2), |(a, b)| gain[a] * z[b]);
    Array2::eye(2) - outer
}

fn assert_close(a: &Array2<f64>, b: &Array2<f64>) {
    assert_eq!(a.dim(), b.dim());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_abs_diff_eq!(x, y, epsilon = 1e-12);
    }
}

// ---------------------------------------------------------------------------
// Boundary condition
// ---------------------------------------------------------------------------

#[test]
fn repeated_runs_are_identical() {
    let model = trend_model(array![[1.0, 0.0], [1.0, 1.0]], array![[0.8, 0.0], [0.0, 1.5]]);
    let y = array![[0.2, 0.5], [0.9, 1.1], [f64::NAN, 2.0], [1.4, 2.4]];
    let filter = univariate_filter(&model, y.view()).unwrap();

    let mut smoother = UnivariateSmoother::new(&model, &filter, SmootherConfig::default()).unwrap();
    smoother.run().unwrap();
    let first = smoother.results().clone();
    smoother.run().unwrap();
    assert_eq!(smoother.results(), &first);
}

#[test]
fn last_period_starts_from_zero() {
    let model = trend_model(array![[1.0, 0.0], [1.0, 1.0]], array![[0.8, 0.0], [0.0, 1.5]]);
    let y = array![[0.2, 0.5], [0.9, 1.1], [1.3, 2.0]];
    let filter = univariate_filter(&model, y.view()).unwrap();
    let mut smoother = UnivariateSmoother::new(&model, &filter, SmootherConfig::default()).unwrap();

    // Leave a half-finished pass behind.
    smoother.measurement_update(2).unwrap();
    smoother.time_update(2).unwrap();
    smoother.measurement_update(1).unwrap();

    // Restarting at the last period ignores the stale r and N.
    let cache = smoother.measurement_update(2).unwrap();
    let d1 = cache.d1().unwrap();
    let d2 = cache.d2().unwrap();
    assert!(d1.iter().chain(d2.iter()).all(|&x| x == 0.0));

    // A pass driven by hand from there matches run().
    smoother.disturbance_smoother(2, &cache).unwrap();
    smoother.time_update(2).unwrap();
    for t in (0..2).rev() {
        let cache = smoother.measurement_update(t).unwrap();
        smoother.disturbance_smoother(t, &cache).unwrap();
        smoother.time_update(t).unwrap();
    }
    let manual = smoother.results().clone();
    let expected = smooth(&model, &filter, SmootherConfig::default()).unwrap();
    assert_eq!(manual, expected);
}

// ---------------------------------------------------------------------------
// Product order
// ---------------------------------------------------------------------------

/// Two periods, two components. The first period has zero forecast errors
/// so that `r[0,0]` is purely the propagated `r[1,0]`.
fn ordered_parts() -> (StateSpaceModel<f64>, FilterOutput<f64>) {
    let model = trend_model(array![[1.0, 0.0], [1.0, 1.0]], Array2::eye(2));
    let gains = vec![
        0.5, -0.2, // t = 0, i = 0
        0.1, 0.6, // t = 0, i = 1
        0.4, 0.1, // t = 1, i = 0
        0.2, 0.3, // t = 1, i = 1
    ];
    let filter = FilterOutput::from_parts(
        2,
        FilterParts {
            forecast_error: array![[0.0, 0.0], [1.0, -0.5]],
            forecast_error_cov: array![[2.5, 1.5], [2.0, 3.0]],
            kalman_gain: Array3::from_shape_vec((2, 2, 2), gains).unwrap(),
            obs_var: Array2::ones((2, 2)),
            missing: None,
        },
    )
    .unwrap();
    (model, filter)
}

#[test]
fn propagation_uses_reverse_component_order() {
    let (model, filter) = ordered_parts();
    let config = SmootherConfig::new(SmootherOutput::STATE);
    let mut smoother = UnivariateSmoother::new(&model, &filter, config).unwrap();

    smoother.measurement_update(1).unwrap();
    smoother.time_update(1).unwrap();
    smoother.measurement_update(0).unwrap();
    let propagation = smoother.propagation_matrix().to_owned();

    let z0 = array![1.0, 0.0];
    let z1 = array![1.0, 1.0];
    let l0 = factor(&array![0.5, -0.2], &z0);
    let l1 = factor(&array![0.1, 0.6], &z1);
    let t_mat = model.transition(0).to_owned();

    // Folding in visiting order (i = 1 then i = 0) yields L1 * L0.
    let mut acc = l1.clone();
    let mut scratch = Array2::zeros((2, 2));
    accumulate_factor(&mut acc, l0.view(), &mut scratch);
    assert_close(&acc, &l1.dot(&l0));

    let expected = t_mat.dot(&l1).dot(&l0);
    let reversed = t_mat.dot(&l0).dot(&l1);
    assert_close(&propagation, &expected);

    let r = smoother.results().scaled_smoothed_estimator().unwrap().to_owned();
    let r1 = r.row(1);
    let r0 = r.row(0);
    let via_expected = expected.t().dot(&r1);
    let via_reversed = reversed.t().dot(&r1);
    for j in 0..2 {
        assert_abs_diff_eq!(r0[j], via_expected[j], epsilon = 1e-12);
    }
    assert_abs_diff_eq!(r0[0], 0.124_166_666_666_666_67, epsilon = 1e-12);
    assert_abs_diff_eq!(r0[1], 0.058_333_333_333_333_33, epsilon = 1e-12);
    assert!((r0[0] - via_reversed[0]).abs() > 1e-2);
}

// ---------------------------------------------------------------------------
// Disturbance correction
// ---------------------------------------------------------------------------

#[test]
fn local_level_disturbance_uses_corrected_formulas() {
    let h: f64 = 2.0;
    let model = StateSpaceModel::local_level(h, 1.0)
        .unwrap()
        .with_initialization(Initialization::Known {
            state: array![0.0],
            cov: array![[3.0]],
        })
        .unwrap();
    let y = array![[1.5], [0.5]];
    let filter = univariate_filter(&model, y.view()).unwrap();
    let res = smooth(&model, &filter, SmootherConfig::default()).unwrap();

    // Period 0: F = 5, K = 0.6, v = 1.5. Period 1: F = 4.2, v = -0.4.
    let (f0, k0, v0): (f64, f64, f64) = (5.0, 0.6, 1.5);
    let (f1, v1) = (4.2, -0.4);
    let r_in = v1 / f1;
    let n_in = 1.0 / f1;
    let d1 = k0 * r_in;
    let d2 = k0 * k0 * n_in;

    let eps = res.smoothed_measurement_disturbance().unwrap()[[0, 0]];
    let var = res.smoothed_measurement_disturbance_cov().unwrap()[[0, 0]];
    let corrected_eps = h / f0 * (v0 - f0 * d1);
    let corrected_var = h - (h / f0).powi(2) * (f0 + f0 * f0 * d2);
    assert_abs_diff_eq!(eps, corrected_eps, epsilon = 1e-12);
    assert_abs_diff_eq!(var, corrected_var, epsilon = 1e-12);

    // The corrected values are the exact conditional moments.
    let alpha = res.smoothed_state().unwrap()[[0, 0]];
    let v_alpha = res.smoothed_state_cov().unwrap()[[0, 0, 0]];
    assert_abs_diff_eq!(eps, 1.5 - alpha, epsilon = 1e-12);
    assert_abs_diff_eq!(var, v_alpha, epsilon = 1e-12);
    assert_abs_diff_eq!(eps, 5.0 / 7.0, epsilon = 1e-12);
    assert_abs_diff_eq!(var, 6.0 / 7.0, epsilon = 1e-12);

    // The uncorrected forms are measurably off.
    let naive_eps = h / f0 * (v0 - d1);
    let naive_var = h - (h / f0).powi(2) * (f0 + d2);
    assert!((eps - naive_eps).abs() > 0.05);
    assert!((var - naive_var).abs() > 0.1);
}

// ---------------------------------------------------------------------------
// Degenerate components
// ---------------------------------------------------------------------------

fn degenerate_case(bad: usize, bad_f: f64) {
    let nobs = 3;
    let good = 1 - bad;
    let design = array![[1.0, 0.0], [1.0, 1.0]];
    let obs_var = array![0.8, 1.5];

    let mut forecast_error = Array2::zeros((nobs, 2));
    let mut forecast_error_cov = Array2::zeros((nobs, 2));
    let mut kalman_gain = Array3::zeros((nobs, 2, 2));
    for t in 0..nobs {
        let tf = t as f64;
        forecast_error[[t, good]] = 0.7 - 0.4 * tf;
        forecast_error_cov[[t, good]] = 2.0 + 0.5 * tf;
        kalman_gain[[t, good, 0]] = 0.4 + 0.1 * tf;
        kalman_gain[[t, good, 1]] = 0.2;
        // Garbage the smoother must never read.
        forecast_error[[t, bad]] = 3.0;
        forecast_error_cov[[t, bad]] = bad_f;
        kalman_gain[[t, bad, 0]] = 5.0;
        kalman_gain[[t, bad, 1]] = -5.0;
    }

    let full_model = trend_model(design.clone(), Array2::from_diag(&obs_var));
    let full = FilterOutput::from_parts(
        2,
        FilterParts {
            forecast_error: forecast_error.clone(),
            forecast_error_cov: forecast_error_cov.clone(),
            kalman_gain: kalman_gain.clone(),
            obs_var: Array2::from_shape_fn((nobs, 2), |(_, i)| obs_var[i]),
            missing: None,
        },
    )
    .unwrap();

    let reduced_model = trend_model(
        design.row(good).to_owned().insert_axis(ndarray::Axis(0)),
        array![[obs_var[good]]],
    );
    let reduced = FilterOutput::from_parts(
        2,
        FilterParts {
            forecast_error: forecast_error.column(good).to_owned().insert_axis(ndarray::Axis(1)),
            forecast_error_cov: forecast_error_cov
                .column(good)
                .to_owned()
                .insert_axis(ndarray::Axis(1)),
            kalman_gain: kalman_gain
                .index_axis(ndarray::Axis(1), good)
                .to_owned()
                .insert_axis(ndarray::Axis(1)),
            obs_var: Array2::from_elem((nobs, 1), obs_var[good]),
            missing: None,
        },
    )
    .unwrap();

    let mut smoother =
        UnivariateSmoother::new(&full_model, &full, SmootherConfig::default()).unwrap();
    smoother.run().unwrap();
    assert_eq!(smoother.degenerate_count(), nobs);
    let with_bad = smoother.into_results();
    let without = smooth(&reduced_model, &reduced, SmootherConfig::default()).unwrap();

    assert_close(
        with_bad.scaled_smoothed_estimator().unwrap(),
        without.scaled_smoothed_estimator().unwrap(),
    );
    let n_bad = with_bad.scaled_smoothed_estimator_cov().unwrap();
    let n_good = without.scaled_smoothed_estimator_cov().unwrap();
    for (x, y) in n_bad.iter().zip(n_good.iter()) {
        assert!(x.is_finite());
        assert_abs_diff_eq!(x, y, epsilon = 1e-12);
    }
    assert_close(
        with_bad.smoothed_state_disturbance().unwrap(),
        without.smoothed_state_disturbance().unwrap(),
    );

    let eps = with_bad.smoothed_measurement_disturbance().unwrap();
    let var = with_bad.smoothed_measurement_disturbance_cov().unwrap();
    let eps_good = without.smoothed_measurement_disturbance().unwrap();
    for t in 0..nobs {
        assert_eq!(eps[[t, bad]], 0.0);
        assert_eq!(var[[t, bad]], obs_var[bad]);
        assert_abs_diff_eq!(eps[[t, good]], eps_good[[t, 0]], epsilon = 1e-12);
    }
}

#[test]
fn zero_variance_component_is_ignored() {
    degenerate_case(1, 0.0);
    degenerate_case(0, 0.0);
}

#[test]
fn nan_variance_component_is_ignored() {
    degenerate_case(1, f64::NAN);
    degenerate_case(0, f64::INFINITY);
}

// ---------------------------------------------------------------------------
// Output gating
// ---------------------------------------------------------------------------

#[test]
fn unrequested_outputs_are_not_allocated() {
    let model = trend_model(array![[1.0, 0.0], [1.0, 1.0]], array![[0.8, 0.0], [0.0, 1.5]]);
    let y = array![[0.2, 0.5], [0.9, 1.1], [1.3, f64::NAN], [1.6, 2.9]];
    let filter = univariate_filter(&model, y.view()).unwrap();

    let all = smooth(&model, &filter, SmootherConfig::default()).unwrap();
    let states = smooth(
        &model,
        &filter,
        SmootherConfig::new(SmootherOutput::STATE | SmootherOutput::STATE_COV),
    )
    .unwrap();
    let disturbances =
        smooth(&model, &filter, SmootherConfig::new(SmootherOutput::DISTURBANCE)).unwrap();
    let no_states =
        smooth(&model, &filter, SmootherConfig::default().with_smoothed_state(false)).unwrap();

    assert!(states.smoothed_measurement_disturbance().is_none());
    assert!(states.smoothed_state_disturbance_cov().is_none());
    assert_eq!(states.scaled_smoothed_estimator(), all.scaled_smoothed_estimator());
    assert_eq!(states.scaled_smoothed_estimator_cov(), all.scaled_smoothed_estimator_cov());
    assert_eq!(states.smoothed_state(), all.smoothed_state());
    assert_eq!(states.smoothed_state_cov(), all.smoothed_state_cov());

    assert!(disturbances.scaled_smoothed_estimator().is_none());
    assert!(disturbances.scaled_smoothed_estimator_cov().is_none());
    assert!(disturbances.smoothed_state().is_none());
    assert!(disturbances.smoothed_measurement_disturbance_cov().is_none());
    assert_eq!(
        disturbances.smoothed_measurement_disturbance(),
        all.smoothed_measurement_disturbance()
    );
    assert_eq!(disturbances.smoothed_state_disturbance(), all.smoothed_state_disturbance());

    assert!(no_states.smoothed_state().is_none());
    assert!(no_states.smoothed_state_cov().is_none());
    assert_eq!(no_states.scaled_smoothed_estimator(), all.scaled_smoothed_estimator());
}

#[test]
fn external_filter_output_has_no_smoothed_states() {
    let (model, filter) = ordered_parts();
    let res = smooth(&model, &filter, SmootherConfig::default()).unwrap();
    assert!(res.smoothed_state().is_none());
    assert!(res.scaled_smoothed_estimator().is_some());
}

// ---------------------------------------------------------------------------
// Subset design
// ---------------------------------------------------------------------------

fn var_model(subset: bool) -> StateSpaceModel<f64> {
    StateSpaceModel::new(
        array![[1.0, 0.5]],
        array![[1.0]],
        array![[0.5, 0.2], [1.0, 0.0]],
        array![[1.0], [0.0]],
        array![[1.0]],
    )
    .unwrap()
    .with_subset_design(subset)
    .with_initialization(Initialization::Known {
        state: array![0.0, 0.0],
        cov: array![[2.0, 0.3], [0.3, 1.0]],
    })
    .unwrap()
}

#[test]
fn subset_design_restricts_only_the_factor() {
    let y = array![[1.2]];
    let subset = var_model(true);
    let full = var_model(false);
    let filter = univariate_filter(&subset, y.view()).unwrap();

    let config = SmootherConfig::new(SmootherOutput::STATE);
    let mut restricted = UnivariateSmoother::new(&subset, &filter, config).unwrap();
    restricted.measurement_update(0).unwrap();
    let mut unrestricted = UnivariateSmoother::new(&full, &filter, config).unwrap();
    unrestricted.measurement_update(0).unwrap();

    let gain = filter.kalman_gain().slice(ndarray::s![0, 0, ..]).to_owned();
    let t_mat = subset.transition(0).to_owned();

    // L uses only the first k_posdef = 1 design column.
    let l_subset = factor(&gain, &array![1.0, 0.0]);
    let l_full = factor(&gain, &array![1.0, 0.5]);
    assert_close(&restricted.propagation_matrix().to_owned(), &t_mat.dot(&l_subset));
    assert_close(&unrestricted.propagation_matrix().to_owned(), &t_mat.dot(&l_full));
    let gap = restricted.propagation_matrix()[[0, 1]] - unrestricted.propagation_matrix()[[0, 1]];
    assert!(gap.abs() > 1e-3);

    // The r update still uses the full design row.
    let v_over_f = filter.v_over_f()[[0, 0]];
    let r = restricted.results().scaled_smoothed_estimator().unwrap();
    assert_abs_diff_eq!(r[[0, 0]], v_over_f, epsilon = 1e-12);
    assert_abs_diff_eq!(r[[0, 1]], 0.5 * v_over_f, epsilon = 1e-12);
    assert!(r[[0, 1]].abs() > 1e-3);
}
