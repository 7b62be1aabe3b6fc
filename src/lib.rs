//! This library implements a benchmarking toolbox for black-box and
//! hyperparameter optimization algorithms.
//!
//! Pluggable designer algorithms suggest parameter configurations to
//! evaluate; a benchmark harness runs them against experimenters and
//! compares algorithm configurations by convergence efficiency or
//! simple regret; an in-memory datastore persists studies and trials of
//! long-running campaigns.
//!
//! The toolbox provides:
//! * scalarization functions turning multi-objective measurements into
//!   a single score, and a [ScalarizingDesigner] reusing any
//!   single-objective designer on multi-objective problems,
//! * convergence-curve extraction, alignment and log-efficiency scoring,
//! * comparison testers deciding from repeated runs and hypothesis
//!   testing whether one algorithm is significantly better than another.
//!
//! # Example
//!
//! Compare two algorithm configurations by simple regret: the candidate
//! samples a wider region of the maximum of `f(x) = 1 - |x - 0.5|`.
//!
//! ```no_run
//! use optibench::{
//!     BenchmarkState, FunctionExperimenter, MetricGoal, MetricInformation, ProblemStatement,
//!     RandomDesigner, SearchSpace, SimpleRegretComparisonTester,
//! };
//!
//! let problem = ProblemStatement::new(
//!     SearchSpace::new(vec![(0., 1.)]),
//!     vec![MetricInformation::new("obj", MetricGoal::Maximize)],
//! );
//!
//! let narrow = ProblemStatement::new(
//!     SearchSpace::new(vec![(0., 0.1)]),
//!     vec![MetricInformation::new("obj", MetricGoal::Maximize)],
//! );
//!
//! let state_factory = |problem: ProblemStatement, name: &'static str| {
//!     move || {
//!         BenchmarkState::new(
//!             name,
//!             Box::new(FunctionExperimenter::new(problem.clone(), |x: &[f64]| {
//!                 vec![1. - (x[0] - 0.5).abs()]
//!             })),
//!             Box::new(RandomDesigner::new(problem.clone(), 42)),
//!         )
//!     }
//! };
//!
//! let tester = SimpleRegretComparisonTester::new(50, 50, 5, 5, 0.05).unwrap();
//! tester
//!     .assert_benchmark_state_better_simple_regret(
//!         state_factory(narrow, "narrow-random"),
//!         state_factory(problem, "full-random"),
//!         1,
//!         1,
//!     )
//!     .expect("candidate significantly better");
//! ```

mod benchmarks;
mod datastore;
mod designers;
mod errors;
mod optimizers;
mod scalarization;
mod types;

pub use crate::benchmarks::*;
pub use crate::datastore::*;
pub use crate::designers::*;
pub use crate::errors::*;
pub use crate::optimizers::*;
pub use crate::scalarization::*;
pub use crate::types::*;
