use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::errors::{OptibenchError, Result};

/// Name of the derived metric attached to trials by the scalarizing designer
pub const SCALARIZED_METRIC_NAME: &str = "scalarized";

/// Name of the metric attached to trials returned by vectorized optimizers
pub const ACQUISITION_METRIC_NAME: &str = "acquisition";

/// Direction in which a metric is optimized
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricGoal {
    /// Larger metric values are better
    Maximize,
    /// Smaller metric values are better
    Minimize,
}

impl MetricGoal {
    /// Map a raw metric value into the uniform larger-is-better frame
    pub fn signed(&self, value: f64) -> f64 {
        match self {
            MetricGoal::Maximize => value,
            MetricGoal::Minimize => -value,
        }
    }
}

/// Declaration of an objective metric: its name and optimization goal
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricInformation {
    pub name: String,
    pub goal: MetricGoal,
}

impl MetricInformation {
    pub fn new(name: impl Into<String>, goal: MetricGoal) -> Self {
        MetricInformation {
            name: name.into(),
            goal,
        }
    }
}

/// Continuous box search space given as `[lower, upper]` intervals,
/// one per input dimension
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub bounds: Vec<(f64, f64)>,
}

impl SearchSpace {
    pub fn new(bounds: Vec<(f64, f64)>) -> Self {
        SearchSpace { bounds }
    }

    /// Dimension of the search space
    pub fn dim(&self) -> usize {
        self.bounds.len()
    }

    /// Return the bounds as an `(nx, 2)` matrix where the ith row is the
    /// interval of the ith component of the input x
    pub fn xlimits(&self) -> Array2<f64> {
        let mut xlimits = Array2::zeros((self.bounds.len(), 2));
        for (i, (lo, up)) in self.bounds.iter().enumerate() {
            xlimits[[i, 0]] = *lo;
            xlimits[[i, 1]] = *up;
        }
        xlimits
    }
}

/// An optimization problem: a search space together with an ordered set
/// of objective metric declarations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProblemStatement {
    pub search_space: SearchSpace,
    pub metric_information: Vec<MetricInformation>,
}

impl ProblemStatement {
    pub fn new(search_space: SearchSpace, metric_information: Vec<MetricInformation>) -> Self {
        ProblemStatement {
            search_space,
            metric_information,
        }
    }

    /// Whether the problem declares exactly one objective metric
    pub fn is_single_objective(&self) -> bool {
        self.metric_information.len() == 1
    }

    /// Name of the unique objective metric, or an error when the problem
    /// is multi-objective
    pub fn single_objective_metric_name(&self) -> Result<&str> {
        if let [metric] = self.metric_information.as_slice() {
            Ok(&metric.name)
        } else {
            Err(OptibenchError::InvalidValue(format!(
                "expected a single objective metric, got {}",
                self.metric_information.len()
            )))
        }
    }

    /// Derive a single-objective statement over the same search space,
    /// replacing the declared metrics with one maximized metric `name`
    pub fn to_single_objective(&self, name: impl Into<String>) -> ProblemStatement {
        ProblemStatement {
            search_space: self.search_space.clone(),
            metric_information: vec![MetricInformation::new(name, MetricGoal::Maximize)],
        }
    }
}

/// Final measurement of a trial: a mapping from metric name to value
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub metrics: BTreeMap<String, f64>,
}

impl Measurement {
    pub fn new(metrics: BTreeMap<String, f64>) -> Self {
        Measurement { metrics }
    }

    /// Value of the given metric if present in this measurement
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// A parameter configuration proposed by a designer, not yet evaluated
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub parameters: Vec<f64>,
}

impl Suggestion {
    pub fn new(parameters: Vec<f64>) -> Self {
        Suggestion { parameters }
    }

    /// Promote this suggestion to a pending trial with the given id
    pub fn to_trial(&self, id: u64) -> Trial {
        Trial {
            id,
            parameters: self.parameters.clone(),
            final_measurement: None,
        }
    }
}

/// One evaluated (or pending) configuration plus its measurement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub id: u64,
    pub parameters: Vec<f64>,
    pub final_measurement: Option<Measurement>,
}

impl Trial {
    pub fn new(id: u64, parameters: Vec<f64>) -> Self {
        Trial {
            id,
            parameters,
            final_measurement: None,
        }
    }

    /// Attach the final measurement, completing the trial
    pub fn complete(&mut self, measurement: Measurement) {
        self.final_measurement = Some(measurement);
    }

    pub fn is_completed(&self) -> bool {
        self.final_measurement.is_some()
    }

    /// Value of the given metric in the final measurement if any
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.final_measurement.as_ref().and_then(|m| m.metric(name))
    }
}

/// An algorithm suggesting parameter configurations and updating its
/// internal policy from observed trial outcomes.
///
/// `update` takes completed trials mutably so that layered designers may
/// attach derived metrics in place before delegating.
pub trait Designer {
    /// Propose `count` new parameter configurations
    fn suggest(&mut self, count: usize) -> Result<Vec<Suggestion>>;

    /// Absorb newly completed trials and currently active (pending) trials
    fn update(&mut self, completed: &mut [Trial], active: &[Trial]) -> Result<()>;
}

/// A callable producing a fresh designer per invocation from a problem
/// statement and an explicit seed.
///
/// Factories are stateless; each repeat of a comparison test invokes the
/// factory once so no random-generator state leaks between repeats.
pub trait DesignerFactory: Fn(&ProblemStatement, u64) -> Result<Box<dyn Designer>> {}
impl<T> DesignerFactory for T where T: Fn(&ProblemStatement, u64) -> Result<Box<dyn Designer>> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_values() {
        assert_eq!(MetricGoal::Maximize.signed(3.5), 3.5);
        assert_eq!(MetricGoal::Minimize.signed(3.5), -3.5);
    }

    #[test]
    fn test_single_objective_metric_name() {
        let problem = ProblemStatement::new(
            SearchSpace::new(vec![(0., 1.)]),
            vec![MetricInformation::new("obj", MetricGoal::Maximize)],
        );
        assert!(problem.is_single_objective());
        assert_eq!(problem.single_objective_metric_name().unwrap(), "obj");

        let multi = ProblemStatement::new(
            SearchSpace::new(vec![(0., 1.)]),
            vec![
                MetricInformation::new("m1", MetricGoal::Maximize),
                MetricInformation::new("m2", MetricGoal::Minimize),
            ],
        );
        assert!(multi.single_objective_metric_name().is_err());
    }

    #[test]
    fn test_to_single_objective() {
        let multi = ProblemStatement::new(
            SearchSpace::new(vec![(0., 1.), (-5., 5.)]),
            vec![
                MetricInformation::new("m1", MetricGoal::Maximize),
                MetricInformation::new("m2", MetricGoal::Minimize),
            ],
        );
        let derived = multi.to_single_objective(SCALARIZED_METRIC_NAME);
        assert_eq!(derived.search_space, multi.search_space);
        assert_eq!(
            derived.metric_information,
            vec![MetricInformation::new(
                SCALARIZED_METRIC_NAME,
                MetricGoal::Maximize
            )]
        );
    }

    #[test]
    fn test_suggestion_to_trial_and_complete() {
        let suggestion = Suggestion::new(vec![0.5, 0.25]);
        let mut trial = suggestion.to_trial(7);
        assert_eq!(trial.id, 7);
        assert!(!trial.is_completed());
        assert_eq!(trial.metric("obj"), None);

        trial.complete(Measurement::new(BTreeMap::from([("obj".to_string(), 1.5)])));
        assert!(trial.is_completed());
        assert_eq!(trial.metric("obj"), Some(1.5));
    }

    #[test]
    fn test_xlimits_shape() {
        let space = SearchSpace::new(vec![(0., 1.), (-2., 2.), (10., 20.)]);
        let xlimits = space.xlimits();
        assert_eq!(xlimits.shape(), &[3, 2]);
        assert_eq!(xlimits[[1, 0]], -2.);
        assert_eq!(xlimits[[2, 1]], 20.);
    }
}
