//! Convergence curves: best-so-far objective value as a function of
//! cumulative trial budget, plus alignment of repeat-run curves and the
//! log-efficiency comparison between a baseline and a candidate curve.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::errors::{OptibenchError, Result};
use crate::types::{MetricInformation, Trial};

/// Linear interpolation of `(xs, ys)` at `x`, clamped to the curve ends.
/// `xs` is assumed sorted in increasing order.
fn interp(xs: &ArrayView1<f64>, ys: &ArrayView1<f64>, x: f64) -> f64 {
    let n = xs.len();
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }
    let mut i = 0;
    while xs[i + 1] < x {
        i += 1;
    }
    let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
    ys[i] + t * (ys[i + 1] - ys[i])
}

/// Convergence curves of one or several repeat runs sharing the x-grid.
///
/// `xs` is the cumulative trial budget, `ys` holds one row per repeat in
/// the larger-is-better frame.
#[derive(Clone, Debug)]
pub struct ConvergenceCurve {
    pub xs: Array1<f64>,
    pub ys: Array2<f64>,
}

impl ConvergenceCurve {
    pub fn new(xs: Array1<f64>, ys: Array2<f64>) -> Result<Self> {
        if xs.is_empty() || ys.ncols() != xs.len() || ys.nrows() == 0 {
            return Err(OptibenchError::InvalidValue(format!(
                "inconsistent curve shape: {} xs vs {:?} ys",
                xs.len(),
                ys.shape()
            )));
        }
        Ok(ConvergenceCurve { xs, ys })
    }

    /// Resample several curves onto a shared x-grid covering the
    /// intersection of their supports, with as many grid points as the
    /// shortest input curve. Rows of all inputs are stacked in order.
    pub fn align_xs(curves: &[ConvergenceCurve]) -> Result<ConvergenceCurve> {
        if curves.is_empty() {
            return Err(OptibenchError::InvalidValue(
                "cannot align an empty set of curves".to_string(),
            ));
        }
        let lo = curves
            .iter()
            .map(|c| c.xs[0])
            .fold(f64::NEG_INFINITY, f64::max);
        let hi = curves
            .iter()
            .map(|c| c.xs[c.xs.len() - 1])
            .fold(f64::INFINITY, f64::min);
        if lo > hi {
            return Err(OptibenchError::InvalidValue(
                "curves share no common x support".to_string(),
            ));
        }
        let n = curves.iter().map(|c| c.xs.len()).min().unwrap();
        let grid = Array1::linspace(lo, hi, n);

        let total_rows: usize = curves.iter().map(|c| c.ys.nrows()).sum();
        let mut ys = Array2::zeros((total_rows, n));
        let mut row = 0;
        for curve in curves {
            for src in curve.ys.rows() {
                for (j, x) in grid.iter().enumerate() {
                    ys[[row, j]] = interp(&curve.xs.view(), &src, *x);
                }
                row += 1;
            }
        }
        ConvergenceCurve::new(grid, ys)
    }

    /// Mean curve across repeats
    fn mean_ys(&self) -> Array1<f64> {
        self.ys.mean_axis(Axis(0)).unwrap_or_else(|| {
            // ncols > 0 and nrows > 0 by construction
            Array1::zeros(self.xs.len())
        })
    }
}

/// Extracts a best-so-far convergence curve from a trial history for one
/// declared metric, in the larger-is-better frame
#[derive(Clone, Debug)]
pub struct ConvergenceCurveConverter {
    metric: MetricInformation,
}

impl ConvergenceCurveConverter {
    pub fn new(metric: MetricInformation) -> Self {
        ConvergenceCurveConverter { metric }
    }

    /// Single-row curve of the goal-normalized best value observed so far,
    /// x being the cumulative count of completed trials. The curve is NaN
    /// until the metric is first observed.
    pub fn convert(&self, trials: &[Trial]) -> Result<ConvergenceCurve> {
        let mut best = f64::NAN;
        let mut ys = Vec::new();
        for trial in trials.iter().filter(|t| t.is_completed()) {
            if let Some(value) = trial.metric(&self.metric.name) {
                let value = self.metric.goal.signed(value);
                if !value.is_nan() && !(value <= best) {
                    best = value;
                }
            }
            ys.push(best);
        }
        if ys.is_empty() {
            return Err(OptibenchError::InvalidValue(format!(
                "no completed trial to build a convergence curve for metric '{}'",
                self.metric.name
            )));
        }
        let n = ys.len();
        let xs = Array1::linspace(1., n as f64, n);
        let ys = Array2::from_shape_vec((1, n), ys).map_err(|e| {
            OptibenchError::InvalidValue(format!("curve shape error: {e}"))
        })?;
        ConvergenceCurve::new(xs, ys)
    }
}

/// Quantifies how much more or less budget-efficient a candidate
/// algorithm is versus a baseline, from their aligned convergence curves
#[derive(Clone, Debug)]
pub struct ConvergenceCurveComparator {
    baseline: ConvergenceCurve,
}

impl ConvergenceCurveComparator {
    pub fn new(baseline: ConvergenceCurve) -> Self {
        ConvergenceCurveComparator { baseline }
    }

    /// Signed log-efficiency score of `candidate` versus the baseline.
    ///
    /// Positive means the candidate reaches the baseline's final objective
    /// value using less cumulative budget; a doubling of efficiency is a
    /// constant additive shift, so 0 thresholds "no worse". When the
    /// candidate never attains the baseline's final value the score is the
    /// (non-positive) log ratio of the budget the baseline needs to match
    /// the candidate's final value over the total budget.
    pub fn get_log_efficiency_score(&self, candidate: &ConvergenceCurve) -> Result<f64> {
        let baseline_mean =
            ConvergenceCurve::new(self.baseline.xs.clone(), row_matrix(self.baseline.mean_ys()))?;
        let candidate_mean =
            ConvergenceCurve::new(candidate.xs.clone(), row_matrix(candidate.mean_ys()))?;
        let aligned = ConvergenceCurve::align_xs(&[baseline_mean, candidate_mean])?;

        let xs = &aligned.xs;
        let b = aligned.ys.row(0);
        let c = aligned.ys.row(1);
        let n = xs.len();

        let b_final = b[n - 1];
        let c_final = c[n - 1];
        if b_final.is_nan() || c_final.is_nan() {
            return Err(OptibenchError::InvalidValue(
                "cannot compare curves with NaN final values".to_string(),
            ));
        }

        let x_b = budget_to_attain(xs, &b, b_final);
        match budget_to_attain_opt(xs, &c, b_final) {
            Some(x_c) => Ok((x_b / x_c).ln()),
            None => {
                let x_b_matching = budget_to_attain(xs, &b, c_final);
                Ok((x_b_matching / xs[n - 1]).ln())
            }
        }
    }
}

fn row_matrix(row: Array1<f64>) -> Array2<f64> {
    row.insert_axis(Axis(0))
}

fn attains(value: f64, target: f64) -> bool {
    value >= target - 1e-12 * (1. + target.abs())
}

/// First budget at which `curve` attains `target`; falls back to the last
/// budget when the target is never attained
fn budget_to_attain(xs: &Array1<f64>, curve: &ArrayView1<f64>, target: f64) -> f64 {
    budget_to_attain_opt(xs, curve, target).unwrap_or(xs[xs.len() - 1])
}

fn budget_to_attain_opt(xs: &Array1<f64>, curve: &ArrayView1<f64>, target: f64) -> Option<f64> {
    xs.iter()
        .zip(curve.iter())
        .find(|(_, y)| attains(**y, target))
        .map(|(x, _)| *x)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use approx::assert_abs_diff_eq;
    use ndarray::array;

    use super::*;
    use crate::types::{Measurement, MetricGoal, Trial};

    fn completed_trials(values: &[f64]) -> Vec<Trial> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut trial = Trial::new(i as u64 + 1, vec![0.]);
                trial.complete(Measurement::new(BTreeMap::from([(
                    "obj".to_string(),
                    *v,
                )])));
                trial
            })
            .collect()
    }

    fn curve(xs: Vec<f64>, ys: Vec<f64>) -> ConvergenceCurve {
        let n = xs.len();
        ConvergenceCurve::new(
            Array1::from(xs),
            Array2::from_shape_vec((1, n), ys).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_convert_best_so_far_maximize() {
        let converter =
            ConvergenceCurveConverter::new(MetricInformation::new("obj", MetricGoal::Maximize));
        let curve = converter
            .convert(&completed_trials(&[1., 3., 2., 5., 4.]))
            .unwrap();
        assert_eq!(curve.ys.row(0).to_vec(), vec![1., 3., 3., 5., 5.]);
        assert_eq!(curve.xs.to_vec(), vec![1., 2., 3., 4., 5.]);
    }

    #[test]
    fn test_convert_best_so_far_minimize_flipped() {
        let converter =
            ConvergenceCurveConverter::new(MetricInformation::new("obj", MetricGoal::Minimize));
        let curve = converter
            .convert(&completed_trials(&[3., 1., 2.]))
            .unwrap();
        assert_eq!(curve.ys.row(0).to_vec(), vec![-3., -1., -1.]);
    }

    #[test]
    fn test_convert_missing_metric_stays_nan() {
        let converter =
            ConvergenceCurveConverter::new(MetricInformation::new("other", MetricGoal::Maximize));
        let curve = converter.convert(&completed_trials(&[1., 2.])).unwrap();
        assert!(curve.ys.row(0).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_align_xs_common_support() {
        let c1 = curve(vec![1., 2., 3., 4.], vec![0., 1., 2., 3.]);
        let c2 = curve(vec![1., 2., 3.], vec![0., 2., 4.]);
        let aligned = ConvergenceCurve::align_xs(&[c1, c2]).unwrap();
        assert_eq!(aligned.xs.to_vec(), vec![1., 2., 3.]);
        assert_eq!(aligned.ys.nrows(), 2);
        assert_eq!(aligned.ys.row(0).to_vec(), vec![0., 1., 2.]);
        assert_eq!(aligned.ys.row(1).to_vec(), vec![0., 2., 4.]);
    }

    #[test]
    fn test_align_xs_interpolates() {
        let c1 = curve(vec![1., 3.], vec![0., 2.]);
        let c2 = curve(vec![1., 2., 3.], vec![0., 1., 2.]);
        let aligned = ConvergenceCurve::align_xs(&[c1, c2]).unwrap();
        // grid length follows the shortest curve
        assert_eq!(aligned.xs.to_vec(), vec![1., 3.]);
        assert_eq!(aligned.ys.row(0).to_vec(), vec![0., 2.]);
        assert_eq!(aligned.ys.row(1).to_vec(), vec![0., 2.]);
    }

    #[test]
    fn test_identical_curves_score_zero() {
        let b = curve(vec![1., 2., 3., 4.], vec![0., 1., 2., 3.]);
        let c = curve(vec![1., 2., 3., 4.], vec![0., 1., 2., 3.]);
        let score = ConvergenceCurveComparator::new(b)
            .get_log_efficiency_score(&c)
            .unwrap();
        assert_abs_diff_eq!(score, 0., epsilon = 1e-12);
    }

    #[test]
    fn test_faster_candidate_scores_positive() {
        // candidate reaches the baseline's final value at half the budget
        let b = curve(vec![1., 2., 3., 4.], vec![0., 1., 2., 3.]);
        let c = curve(vec![1., 2., 3., 4.], vec![1.5, 3., 3., 3.]);
        let score = ConvergenceCurveComparator::new(b)
            .get_log_efficiency_score(&c)
            .unwrap();
        assert!(score > 0.5);
    }

    #[test]
    fn test_stalled_candidate_scores_negative() {
        let b = curve(vec![1., 2., 3., 4.], vec![0., 1., 2., 3.]);
        let c = curve(vec![1., 2., 3., 4.], vec![0.5, 0.5, 0.5, 0.5]);
        let score = ConvergenceCurveComparator::new(b)
            .get_log_efficiency_score(&c)
            .unwrap();
        assert!(score < 0.);
    }
}
