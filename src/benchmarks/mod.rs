//! Benchmarking harness: runs designers against experimenters and
//! compares algorithm configurations by convergence efficiency or
//! simple regret.

mod comparator;
mod convergence;
mod runner;
mod stats;

pub use comparator::{EfficiencyComparisonTester, SimpleRegretComparisonTester};
pub use convergence::{ConvergenceCurve, ConvergenceCurveComparator, ConvergenceCurveConverter};
pub use runner::{
    BenchmarkRunner, BenchmarkState, BenchmarkStateFactory, Experimenter, FunctionExperimenter,
};
pub use stats::t_test_less_mean_score;
