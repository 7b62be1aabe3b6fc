//! A designer wrapper making any single-objective designer usable on a
//! multi-objective problem by injecting a derived scalar metric.
//!
//! ```
//! use ndarray::Array1;
//! use optibench::{
//!     Designer, HyperVolumeScalarization, MetricGoal, MetricInformation, ProblemStatement,
//!     RandomDesigner, Result, ScalarizingDesigner, SearchSpace,
//! };
//!
//! fn random_factory(ps: &ProblemStatement, seed: u64) -> Result<Box<dyn Designer>> {
//!     Ok(Box::new(RandomDesigner::new(ps.clone(), seed)))
//! }
//!
//! let problem = ProblemStatement::new(
//!     SearchSpace::new(vec![(0., 1.)]),
//!     vec![
//!         MetricInformation::new("latency", MetricGoal::Minimize),
//!         MetricInformation::new("accuracy", MetricGoal::Maximize),
//!     ],
//! );
//! let n_metrics = problem.metric_information.len();
//! let designer = ScalarizingDesigner::new(
//!     problem,
//!     random_factory,
//!     HyperVolumeScalarization::new(Array1::ones(n_metrics)).unwrap(),
//!     42,
//! )
//! .unwrap();
//! ```

use ndarray::Array1;

use crate::errors::{OptibenchError, Result};
use crate::scalarization::Scalarization;
use crate::types::{
    Designer, DesignerFactory, ProblemStatement, Suggestion, Trial, SCALARIZED_METRIC_NAME,
};

/// Wraps a single-objective designer built against the derived
/// `scalarized` statement; converts multi-objective trials to
/// single-objective ones before delegating updates.
pub struct ScalarizingDesigner<S: Scalarization> {
    problem: ProblemStatement,
    scalarization: S,
    designer: Box<dyn Designer>,
}

impl<S: Scalarization> ScalarizingDesigner<S> {
    /// Build the wrapped designer once via `factory` against the derived
    /// single-objective statement, seeded explicitly.
    ///
    /// Fails when the scalarization weight vector length differs from the
    /// number of declared metrics.
    pub fn new<F: DesignerFactory>(
        problem: ProblemStatement,
        factory: F,
        scalarization: S,
        seed: u64,
    ) -> Result<Self> {
        let n_metrics = problem.metric_information.len();
        if scalarization.weights().len() != n_metrics {
            return Err(OptibenchError::InvalidConfig(format!(
                "scalarization expects {} weights for {} metrics",
                scalarization.weights().len(),
                n_metrics
            )));
        }
        let derived = problem.to_single_objective(SCALARIZED_METRIC_NAME);
        let designer = factory(&derived, seed)?;
        Ok(ScalarizingDesigner {
            problem,
            scalarization,
            designer,
        })
    }

    /// Goal-normalized metric values of a completed trial, NaN for any
    /// declared metric absent from the final measurement
    fn metric_values(&self, trial: &Trial) -> Array1<f64> {
        self.problem
            .metric_information
            .iter()
            .map(|info| match trial.metric(&info.name) {
                Some(value) => info.goal.signed(value),
                None => f64::NAN,
            })
            .collect()
    }
}

impl<S: Scalarization> Designer for ScalarizingDesigner<S> {
    fn suggest(&mut self, count: usize) -> Result<Vec<Suggestion>> {
        self.designer.suggest(count)
    }

    /// Attach the `scalarized` metric to every completed trial in place,
    /// then forward the mutated trial sets to the wrapped designer.
    ///
    /// Missing metrics yield a NaN scalarized value rather than an error;
    /// the wrapped designer is expected to tolerate NaN fitness values.
    fn update(&mut self, completed: &mut [Trial], active: &[Trial]) -> Result<()> {
        for trial in completed.iter_mut() {
            let values = self.metric_values(trial);
            let score = if values.iter().any(|v| v.is_nan()) {
                f64::NAN
            } else {
                self.scalarization.scalarize(&values.view())?
            };
            if let Some(measurement) = trial.final_measurement.as_mut() {
                measurement
                    .metrics
                    .insert(SCALARIZED_METRIC_NAME.to_string(), score);
            }
        }
        self.designer.update(completed, active)
    }
}
