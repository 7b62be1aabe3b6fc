//! Statistical significance scoring for simple-regret comparisons.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::errors::{OptibenchError, Result};

/// Sample mean
pub(crate) fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation, for summary reporting
pub(crate) fn std_dev(samples: &[f64]) -> f64 {
    let m = mean(samples);
    (samples.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / samples.len() as f64).sqrt()
}

fn sample_variance(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.;
    }
    let m = mean(samples);
    samples.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (samples.len() - 1) as f64
}

/// P-value of the one-sided Welch t-test for "baseline mean < candidate
/// mean".
///
/// A small p-value is evidence that the candidate's sample mean is
/// significantly larger than the baseline's. When the standard error
/// degenerates to zero (constant samples) the p-value collapses to 0 or 1
/// according to the raw mean ordering.
pub fn t_test_less_mean_score(baseline: &[f64], candidate: &[f64]) -> Result<f64> {
    if baseline.is_empty() || candidate.is_empty() {
        return Err(OptibenchError::InvalidValue(
            "t-test requires non-empty baseline and candidate samples".to_string(),
        ));
    }
    let n1 = baseline.len() as f64;
    let n2 = candidate.len() as f64;
    let mean1 = mean(baseline);
    let mean2 = mean(candidate);
    let var1 = sample_variance(baseline);
    let var2 = sample_variance(candidate);

    let se = (var1 / n1 + var2 / n2).sqrt();
    if se == 0. || !se.is_finite() {
        return Ok(if mean1 < mean2 { 0. } else { 1. });
    }

    let t = (mean1 - mean2) / se;
    // Welch-Satterthwaite degrees of freedom
    let df_num = (var1 / n1 + var2 / n2) * (var1 / n1 + var2 / n2);
    let mut df_denom = 0.;
    if n1 > 1. {
        df_denom += (var1 / n1) * (var1 / n1) / (n1 - 1.);
    }
    if n2 > 1. {
        df_denom += (var2 / n2) * (var2 / n2) / (n2 - 1.);
    }
    if df_denom == 0. {
        return Ok(if mean1 < mean2 { 0. } else { 1. });
    }
    let df = df_num / df_denom;

    let dist = StudentsT::new(0., 1., df)
        .map_err(|e| OptibenchError::InvalidValue(format!("t distribution: {e}")))?;
    Ok(dist.cdf(t))
}
