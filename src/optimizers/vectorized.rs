use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView2};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::errors::{OptibenchError, Result};
use crate::types::{Measurement, SearchSpace, Trial, ACQUISITION_METRIC_NAME};

/// A batched score function: takes a `(p, nx)` feature matrix and
/// returns one score per row
pub trait BatchScoreFn: Fn(&ArrayView2<f64>) -> Array1<f64> {}
impl<T> BatchScoreFn for T where T: Fn(&ArrayView2<f64>) -> Array1<f64> {}

/// Maps between feature rows and trials for vectorized optimizers
#[derive(Clone, Debug)]
pub struct TrialConverter {
    search_space: SearchSpace,
}

impl TrialConverter {
    pub fn new(search_space: SearchSpace) -> Self {
        TrialConverter { search_space }
    }

    pub fn search_space(&self) -> &SearchSpace {
        &self.search_space
    }

    /// Build a completed trial from a feature row and its score, the
    /// score recorded as the `acquisition` metric
    pub fn to_trial(&self, id: u64, features: &[f64], score: f64) -> Trial {
        let mut trial = Trial::new(id, features.to_vec());
        trial.complete(Measurement::new(BTreeMap::from([(
            ACQUISITION_METRIC_NAME.to_string(),
            score,
        )])));
        trial
    }
}

/// An optimizer evaluating the score function on feature batches under a
/// fixed evaluation budget and returning its best trials, each carrying
/// an `acquisition` metric
pub trait VectorizedOptimizer {
    fn optimize(
        &mut self,
        converter: &TrialConverter,
        score_fn: &dyn Fn(&ArrayView2<f64>) -> Array1<f64>,
        count: usize,
        max_evaluations: usize,
    ) -> Result<Vec<Trial>>;
}

/// A vectorized optimizer sampling feature batches uniformly over the
/// search space and keeping the top trials by acquisition value
pub struct RandomVectorizedOptimizer {
    batch_size: usize,
    rng: Xoshiro256Plus,
}

impl RandomVectorizedOptimizer {
    pub fn new(batch_size: usize, seed: u64) -> Result<Self> {
        if batch_size < 1 {
            return Err(OptibenchError::InvalidConfig(
                "batch size must be >= 1".to_string(),
            ));
        }
        Ok(RandomVectorizedOptimizer {
            batch_size,
            rng: Xoshiro256Plus::seed_from_u64(seed),
        })
    }
}

impl VectorizedOptimizer for RandomVectorizedOptimizer {
    fn optimize(
        &mut self,
        converter: &TrialConverter,
        score_fn: &dyn Fn(&ArrayView2<f64>) -> Array1<f64>,
        count: usize,
        max_evaluations: usize,
    ) -> Result<Vec<Trial>> {
        let bounds = &converter.search_space().bounds;
        let nx = bounds.len();
        let mut trials: Vec<Trial> = Vec::new();
        let mut evaluated = 0usize;
        let mut next_id = 1u64;
        while evaluated < max_evaluations {
            let batch = self.batch_size.min(max_evaluations - evaluated);
            let mut features = Array2::zeros((batch, nx));
            for i in 0..batch {
                for (j, (lo, up)) in bounds.iter().enumerate() {
                    features[[i, j]] = self.rng.gen_range(*lo..=*up);
                }
            }
            let scores = score_fn(&features.view());
            if scores.len() != batch {
                return Err(OptibenchError::InvalidValue(format!(
                    "score function returned {} scores for a batch of {batch}",
                    scores.len()
                )));
            }
            for i in 0..batch {
                let row: Vec<f64> = features.row(i).to_vec();
                trials.push(converter.to_trial(next_id, &row, scores[i]));
                next_id += 1;
            }
            evaluated += batch;
        }
        trials.sort_by(|a, b| {
            let va = a.metric(ACQUISITION_METRIC_NAME).unwrap_or(f64::NEG_INFINITY);
            let vb = b.metric(ACQUISITION_METRIC_NAME).unwrap_or(f64::NEG_INFINITY);
            vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
        });
        trials.truncate(count);
        Ok(trials)
    }
}
