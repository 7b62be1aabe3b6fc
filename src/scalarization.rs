//! Scalarization functions reducing a vector of objective values to a
//! single score so that single-objective optimizers can be reused on
//! multi-objective problems.
//!
//! All functions operate in the larger-is-better frame: callers are
//! expected to goal-normalize metric values beforehand (see
//! [crate::ScalarizingDesigner]). Scalarizations are pure and stateless;
//! construction only validates the weight vector.

use ndarray::{Array1, ArrayView1};

use crate::errors::{OptibenchError, Result};

fn check_weights(weights: &Array1<f64>) -> Result<()> {
    if weights.is_empty() {
        return Err(OptibenchError::InvalidConfig(
            "weight vector must not be empty".to_string(),
        ));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.) {
        return Err(OptibenchError::InvalidConfig(format!(
            "weights must be finite and non-negative, got {weights}"
        )));
    }
    if weights.iter().all(|w| *w == 0.) {
        return Err(OptibenchError::InvalidConfig(
            "at least one weight must be positive".to_string(),
        ));
    }
    Ok(())
}

fn check_dims(weights: &Array1<f64>, values: &ArrayView1<f64>) -> Result<()> {
    if weights.len() != values.len() {
        return Err(OptibenchError::DimensionMismatch {
            expected: weights.len(),
            actual: values.len(),
        });
    }
    Ok(())
}

/// A stateless transform from a goal-normalized objective vector to a
/// scalar score, parameterized by a fixed non-negative weight vector
pub trait Scalarization: Send + Sync {
    /// The fixed weight vector, one entry per objective metric
    fn weights(&self) -> &Array1<f64>;

    /// Reduce `values` to a scalar score.
    ///
    /// Fails when `values` length differs from the weight vector length.
    /// NaN entries propagate to a NaN score.
    fn scalarize(&self, values: &ArrayView1<f64>) -> Result<f64>;
}

/// Weighted sum of the objective values: `dot(weights, values)`
#[derive(Clone, Debug)]
pub struct LinearScalarization {
    weights: Array1<f64>,
}

impl LinearScalarization {
    pub fn new(weights: Array1<f64>) -> Result<Self> {
        check_weights(&weights)?;
        Ok(LinearScalarization { weights })
    }
}

impl Scalarization for LinearScalarization {
    fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    fn scalarize(&self, values: &ArrayView1<f64>) -> Result<f64> {
        check_dims(&self.weights, values)?;
        Ok(self.weights.dot(values))
    }
}

/// Hypervolume-style reduction `min_i(values_i / weights_i)` rewarding
/// balanced improvement across all objectives rather than a single
/// dominant one.
///
/// Dimensions with a zero weight are excluded from the reduction; the
/// weight validation guarantees at least one positive weight remains.
#[derive(Clone, Debug)]
pub struct HyperVolumeScalarization {
    weights: Array1<f64>,
}

impl HyperVolumeScalarization {
    pub fn new(weights: Array1<f64>) -> Result<Self> {
        check_weights(&weights)?;
        Ok(HyperVolumeScalarization { weights })
    }
}

impl Scalarization for HyperVolumeScalarization {
    fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    fn scalarize(&self, values: &ArrayView1<f64>) -> Result<f64> {
        check_dims(&self.weights, values)?;
        let mut score = f64::INFINITY;
        for (w, v) in self.weights.iter().zip(values.iter()) {
            if *w == 0. {
                continue;
            }
            let ratio = v / w;
            if ratio.is_nan() {
                return Ok(f64::NAN);
            }
            score = score.min(ratio);
        }
        Ok(score)
    }
}
