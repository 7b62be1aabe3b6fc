//! Vectorized single-objective optimizers operating on batched feature
//! arrays.

mod vectorized;

pub use vectorized::{
    BatchScoreFn, RandomVectorizedOptimizer, TrialConverter, VectorizedOptimizer,
};
