//! Comparison tests between algorithm configurations.
//!
//! The efficiency tester decides, from repeated benchmark runs and
//! convergence-curve analysis, whether a candidate algorithm converges
//! faster than a baseline. The simple-regret tester compares the
//! best-observed values of repeated runs through a one-sided t-test.
//! In both testers statistical significance is the success condition:
//! success returns silently (the regret tester logs a summary) while
//! failure to meet the score threshold or the significance level is a
//! named error.

use log::info;

use crate::benchmarks::convergence::{ConvergenceCurve, ConvergenceCurveComparator, ConvergenceCurveConverter};
use crate::benchmarks::runner::{BenchmarkRunner, BenchmarkState, BenchmarkStateFactory};
use crate::benchmarks::stats::{mean, std_dev, t_test_less_mean_score};
use crate::errors::{OptibenchError, Result};
use crate::optimizers::{BatchScoreFn, TrialConverter, VectorizedOptimizer};
use crate::types::ACQUISITION_METRIC_NAME;

/// Compares two algorithms by convergence efficiency over repeated
/// benchmark runs
#[derive(Clone, Copy, Debug)]
pub struct EfficiencyComparisonTester {
    num_trials: usize,
    num_repeats: usize,
}

impl EfficiencyComparisonTester {
    /// Run each algorithm for `num_trials` trials, `num_repeats` times
    pub fn new(num_trials: usize, num_repeats: usize) -> Result<Self> {
        if num_trials < 1 || num_repeats < 1 {
            return Err(OptibenchError::InvalidConfig(format!(
                "num_trials and num_repeats must be >= 1, got {num_trials} and {num_repeats}"
            )));
        }
        Ok(EfficiencyComparisonTester {
            num_trials,
            num_repeats,
        })
    }

    /// Asserts that the candidate converges at least as efficiently as the
    /// baseline, up to `score_threshold` on the log-efficiency scale.
    ///
    /// Both factories must produce states over identical single-objective
    /// problem statements; anything else fails fast before any run.
    /// Success is silent; a score below the threshold is a
    /// [OptibenchError::FailedComparisonTest].
    pub fn assert_better_efficiency<C, B>(
        &self,
        candidate_state_factory: C,
        baseline_state_factory: B,
        score_threshold: f64,
    ) -> Result<()>
    where
        C: BenchmarkStateFactory,
        B: BenchmarkStateFactory,
    {
        let runner = BenchmarkRunner::new(1, self.num_trials);

        let mut baseline_curves = Vec::with_capacity(self.num_repeats);
        let mut candidate_curves = Vec::with_capacity(self.num_repeats);
        let mut baseline_name = String::new();
        let mut candidate_name = String::new();
        for _ in 0..self.num_repeats {
            let mut baseline_state = baseline_state_factory();
            let mut candidate_state = candidate_state_factory();

            let baseline_statement = baseline_state.problem_statement().clone();
            if !baseline_statement.is_single_objective() {
                return Err(OptibenchError::InvalidConfig(
                    "multi-objective problem statements are not supported".to_string(),
                ));
            }
            let candidate_statement = candidate_state.problem_statement();
            if baseline_statement != *candidate_statement {
                return Err(OptibenchError::InvalidConfig(format!(
                    "comparison tests done for different statements: {baseline_statement:?} vs {candidate_statement:?}"
                )));
            }
            baseline_name = baseline_state.name().to_string();
            candidate_name = candidate_state.name().to_string();

            runner.run(&mut baseline_state)?;
            runner.run(&mut candidate_state)?;

            let converter =
                ConvergenceCurveConverter::new(baseline_statement.metric_information[0].clone());
            baseline_curves.push(converter.convert(baseline_state.trials())?);
            candidate_curves.push(converter.convert(candidate_state.trials())?);
        }

        let baseline_curve = ConvergenceCurve::align_xs(&baseline_curves)?;
        let candidate_curve = ConvergenceCurve::align_xs(&candidate_curves)?;
        let comparator = ConvergenceCurveComparator::new(baseline_curve);

        let log_eff_score = comparator.get_log_efficiency_score(&candidate_curve)?;
        if log_eff_score < score_threshold {
            return Err(OptibenchError::FailedComparisonTest(format!(
                "log efficiency score {log_eff_score} is less than {score_threshold} \
                 when comparing algorithm '{candidate_name}' vs baseline '{baseline_name}' \
                 for {} trials with {} repeats",
                self.num_trials, self.num_repeats
            )));
        }
        Ok(())
    }
}

/// Compares two algorithms by their simple regrets.
///
/// The baseline is run `baseline_num_repeats` times, each run a fresh
/// optimization over `baseline_num_trials` evaluations yielding one
/// best-observed value; similarly for the candidate. A one-sided t-test
/// then computes the p-value of observing the difference in sample means.
///
/// The test assumes a MAXIMIZATION problem; for MINIMIZATION invert the
/// sign of the score function.
#[derive(Clone, Copy, Debug)]
pub struct SimpleRegretComparisonTester {
    baseline_num_trials: usize,
    candidate_num_trials: usize,
    baseline_num_repeats: usize,
    candidate_num_repeats: usize,
    alpha: f64,
}

impl SimpleRegretComparisonTester {
    /// `alpha` is the significance level, constrained to (0, 0.1]
    pub fn new(
        baseline_num_trials: usize,
        candidate_num_trials: usize,
        baseline_num_repeats: usize,
        candidate_num_repeats: usize,
        alpha: f64,
    ) -> Result<Self> {
        if !(alpha > 0. && alpha <= 0.1) {
            return Err(OptibenchError::InvalidConfig(format!(
                "alpha must be in (0, 0.1], got {alpha}"
            )));
        }
        if baseline_num_trials < 1
            || candidate_num_trials < 1
            || baseline_num_repeats < 1
            || candidate_num_repeats < 1
        {
            return Err(OptibenchError::InvalidConfig(
                "trial and repeat counts must be >= 1".to_string(),
            ));
        }
        Ok(SimpleRegretComparisonTester {
            baseline_num_trials,
            candidate_num_trials,
            baseline_num_repeats,
            candidate_num_repeats,
            alpha,
        })
    }

    /// Asserts that the candidate optimizer has significantly better
    /// simple regret than the baseline.
    ///
    /// Each repeat asks the optimizer for its single best trial under the
    /// side's evaluation budget and samples that trial's `acquisition`
    /// metric.
    pub fn assert_optimizer_better_simple_regret<F: BatchScoreFn>(
        &self,
        converter: &TrialConverter,
        score_fn: &F,
        baseline_optimizer: &mut dyn VectorizedOptimizer,
        candidate_optimizer: &mut dyn VectorizedOptimizer,
    ) -> Result<()> {
        let mut baseline_simple_regrets = Vec::with_capacity(self.baseline_num_repeats);
        let mut candidate_simple_regrets = Vec::with_capacity(self.candidate_num_repeats);

        for _ in 0..self.baseline_num_repeats {
            let trials =
                baseline_optimizer.optimize(converter, score_fn, 1, self.baseline_num_trials)?;
            baseline_simple_regrets.push(acquisition_value(&trials)?);
        }
        for _ in 0..self.candidate_num_repeats {
            let trials =
                candidate_optimizer.optimize(converter, score_fn, 1, self.candidate_num_trials)?;
            candidate_simple_regrets.push(acquisition_value(&trials)?);
        }

        self.conclude(&baseline_simple_regrets, &candidate_simple_regrets)
    }

    /// Asserts better simple regret using full benchmark runs, optionally
    /// batching trial generation on each side
    pub fn assert_benchmark_state_better_simple_regret<B, C>(
        &self,
        baseline_state_factory: B,
        candidate_state_factory: C,
        baseline_batch_size: usize,
        candidate_batch_size: usize,
    ) -> Result<()>
    where
        B: BenchmarkStateFactory,
        C: BenchmarkStateFactory,
    {
        let run_one = |state_factory: &dyn Fn() -> BenchmarkState,
                       num_trials: usize,
                       batch_size: usize|
         -> Result<f64> {
            if batch_size < 1 || batch_size > num_trials {
                return Err(OptibenchError::InvalidConfig(format!(
                    "batch size {batch_size} incompatible with {num_trials} trials"
                )));
            }
            let mut state = state_factory();
            let runner = BenchmarkRunner::new(batch_size, num_trials / batch_size);
            runner.run(&mut state)?;
            let best = state.best_trials(1)?;
            let best = best.first().ok_or_else(|| {
                OptibenchError::InvalidValue("benchmark run produced no completed trial".to_string())
            })?;
            let metric_name = state.problem_statement().single_objective_metric_name()?;
            best.metric(metric_name).ok_or_else(|| {
                OptibenchError::InvalidValue(format!(
                    "best trial is missing metric '{metric_name}'"
                ))
            })
        };

        let mut baseline_simple_regrets = Vec::with_capacity(self.baseline_num_repeats);
        let mut candidate_simple_regrets = Vec::with_capacity(self.candidate_num_repeats);
        for _ in 0..self.baseline_num_repeats {
            baseline_simple_regrets.push(run_one(
                &baseline_state_factory,
                self.baseline_num_trials,
                baseline_batch_size,
            )?);
        }
        for _ in 0..self.candidate_num_repeats {
            candidate_simple_regrets.push(run_one(
                &candidate_state_factory,
                self.candidate_num_trials,
                candidate_batch_size,
            )?);
        }

        self.conclude(&baseline_simple_regrets, &candidate_simple_regrets)
    }

    fn conclude(&self, baseline: &[f64], candidate: &[f64]) -> Result<()> {
        let p_value = t_test_less_mean_score(baseline, candidate)?;
        let msg = self.generate_summary(baseline, candidate, p_value);
        if p_value <= self.alpha {
            info!("Convergence test PASSED:\n{msg}");
            Ok(())
        } else {
            Err(OptibenchError::FailedSimpleRegretConvergenceTest(msg))
        }
    }

    fn generate_summary(&self, baseline: &[f64], candidate: &[f64], p_value: f64) -> String {
        format!(
            "P-value={p_value}. Alpha={}.\n\
             Baseline Simple Regret Mean: {}.\n\
             Baseline Simple Regret Std: {}.\n\
             Candidate Simple Regret Mean: {}.\n\
             Candidate Simple Regret Std: {}.\n\
             Baseline Simple Regret Scores: {baseline:?}\n\
             Candidate Simple Regret Scores: {candidate:?}",
            self.alpha,
            mean(baseline),
            std_dev(baseline),
            mean(candidate),
            std_dev(candidate),
        )
    }
}

fn acquisition_value(trials: &[crate::types::Trial]) -> Result<f64> {
    let trial = trials.first().ok_or_else(|| {
        OptibenchError::InvalidValue("optimizer returned no trial".to_string())
    })?;
    trial.metric(ACQUISITION_METRIC_NAME).ok_or_else(|| {
        OptibenchError::InvalidValue(format!(
            "optimizer trial is missing metric '{ACQUISITION_METRIC_NAME}'"
        ))
    })
}
