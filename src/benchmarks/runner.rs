use std::collections::BTreeMap;

use log::debug;

use crate::errors::{OptibenchError, Result};
use crate::types::{Designer, Measurement, ProblemStatement, Trial};

/// An evaluator completing trials against a problem statement
pub trait Experimenter {
    /// The problem this experimenter evaluates
    fn problem_statement(&self) -> &ProblemStatement;

    /// Attach a final measurement to each given trial
    fn evaluate(&self, trials: &mut [Trial]);
}

/// An experimenter evaluating a vectorial function of the parameters,
/// one output value per declared metric
pub struct FunctionExperimenter<F: Fn(&[f64]) -> Vec<f64>> {
    problem: ProblemStatement,
    func: F,
}

impl<F: Fn(&[f64]) -> Vec<f64>> FunctionExperimenter<F> {
    pub fn new(problem: ProblemStatement, func: F) -> Self {
        FunctionExperimenter { problem, func }
    }
}

impl<F: Fn(&[f64]) -> Vec<f64>> Experimenter for FunctionExperimenter<F> {
    fn problem_statement(&self) -> &ProblemStatement {
        &self.problem
    }

    fn evaluate(&self, trials: &mut [Trial]) {
        for trial in trials.iter_mut() {
            let values = (self.func)(&trial.parameters);
            let metrics: BTreeMap<String, f64> = self
                .problem
                .metric_information
                .iter()
                .zip(values)
                .map(|(info, value)| (info.name.clone(), value))
                .collect();
            trial.complete(Measurement::new(metrics));
        }
    }
}

/// An algorithm under benchmark: an experimenter, a designer and the
/// populated trial history
pub struct BenchmarkState {
    name: String,
    experimenter: Box<dyn Experimenter>,
    designer: Box<dyn Designer>,
    trials: Vec<Trial>,
}

impl BenchmarkState {
    pub fn new(
        name: impl Into<String>,
        experimenter: Box<dyn Experimenter>,
        designer: Box<dyn Designer>,
    ) -> Self {
        BenchmarkState {
            name: name.into(),
            experimenter,
            designer,
            trials: Vec::new(),
        }
    }

    /// Short description of the benchmarked algorithm, used in failure
    /// diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn problem_statement(&self) -> &ProblemStatement {
        self.experimenter.problem_statement()
    }

    /// Full trial history in evaluation order
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// The `count` best completed trials of a single-objective problem,
    /// goal-aware; trials with a missing or NaN objective value rank last
    pub fn best_trials(&self, count: usize) -> Result<Vec<Trial>> {
        let statement = self.experimenter.problem_statement();
        let metric = statement
            .metric_information
            .first()
            .cloned()
            .ok_or_else(|| {
                OptibenchError::InvalidValue("problem statement declares no metric".to_string())
            })?;
        if !statement.is_single_objective() {
            return Err(OptibenchError::InvalidValue(
                "best_trials supports single-objective problems only".to_string(),
            ));
        }
        let mut completed: Vec<&Trial> = self.trials.iter().filter(|t| t.is_completed()).collect();
        completed.sort_by(|a, b| {
            let va = a
                .metric(&metric.name)
                .map(|v| metric.goal.signed(v))
                .filter(|v| !v.is_nan())
                .unwrap_or(f64::NEG_INFINITY);
            let vb = b
                .metric(&metric.name)
                .map(|v| metric.goal.signed(v))
                .filter(|v| !v.is_nan())
                .unwrap_or(f64::NEG_INFINITY);
            vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(completed.into_iter().take(count).cloned().collect())
    }
}

/// A callable producing an independent, freshly-seeded benchmark state
/// per invocation (one per comparison-test repeat)
pub trait BenchmarkStateFactory: Fn() -> BenchmarkState {}
impl<T> BenchmarkStateFactory for T where T: Fn() -> BenchmarkState {}

/// Drives generate-and-evaluate cycles against a benchmark state,
/// populating its trial history
#[derive(Clone, Copy, Debug)]
pub struct BenchmarkRunner {
    batch_size: usize,
    num_repeats: usize,
}

impl BenchmarkRunner {
    /// `num_repeats` cycles of `batch_size` suggestions each
    pub fn new(batch_size: usize, num_repeats: usize) -> Self {
        BenchmarkRunner {
            batch_size,
            num_repeats,
        }
    }

    /// Run all cycles to completion: suggest, evaluate, update, append
    /// to the state history. Trial ids are sequential starting at 1.
    pub fn run(&self, state: &mut BenchmarkState) -> Result<()> {
        for cycle in 0..self.num_repeats {
            let suggestions = state.designer.suggest(self.batch_size)?;
            let next_id = state.trials.len() as u64 + 1;
            let mut batch: Vec<Trial> = suggestions
                .iter()
                .enumerate()
                .map(|(i, s)| s.to_trial(next_id + i as u64))
                .collect();
            state.experimenter.evaluate(&mut batch);
            state.designer.update(&mut batch, &[])?;
            debug!(
                "benchmark '{}': cycle {} evaluated {} trials",
                state.name,
                cycle + 1,
                batch.len()
            );
            state.trials.extend(batch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designers::RandomDesigner;
    use crate::types::{MetricGoal, MetricInformation, SearchSpace};

    fn single_objective(goal: MetricGoal) -> ProblemStatement {
        ProblemStatement::new(
            SearchSpace::new(vec![(0., 1.)]),
            vec![MetricInformation::new("obj", goal)],
        )
    }

    fn state(goal: MetricGoal, seed: u64) -> BenchmarkState {
        let problem = single_objective(goal);
        BenchmarkState::new(
            "random",
            Box::new(FunctionExperimenter::new(problem.clone(), |x: &[f64]| {
                vec![x[0]]
            })),
            Box::new(RandomDesigner::new(problem, seed)),
        )
    }

    #[test]
    fn test_run_populates_history() {
        let mut state = state(MetricGoal::Maximize, 42);
        BenchmarkRunner::new(5, 3).run(&mut state).unwrap();
        assert_eq!(state.trials().len(), 15);
        assert!(state.trials().iter().all(|t| t.is_completed()));
        let ids: Vec<u64> = state.trials().iter().map(|t| t.id).collect();
        assert_eq!(ids, (1..=15).collect::<Vec<u64>>());
    }

    #[test]
    fn test_best_trials_goal_aware() {
        let mut max_state = state(MetricGoal::Maximize, 42);
        BenchmarkRunner::new(1, 10).run(&mut max_state).unwrap();
        let best = max_state.best_trials(1).unwrap();
        let best_value = best[0].metric("obj").unwrap();
        assert!(max_state
            .trials()
            .iter()
            .all(|t| t.metric("obj").unwrap() <= best_value));

        let mut min_state = state(MetricGoal::Minimize, 42);
        BenchmarkRunner::new(1, 10).run(&mut min_state).unwrap();
        let best = min_state.best_trials(1).unwrap();
        let best_value = best[0].metric("obj").unwrap();
        assert!(min_state
            .trials()
            .iter()
            .all(|t| t.metric("obj").unwrap() >= best_value));
    }
}
