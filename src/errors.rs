use thiserror::Error;

/// A result type for benchmarking errors
pub type Result<T> = std::result::Result<T, OptibenchError>;

/// An error for black-box optimizer benchmarking
#[derive(Error, Debug)]
pub enum OptibenchError {
    /// When an invalid value is encountered
    #[error("Value error: {0}")]
    InvalidValue(String),
    /// When vector lengths disagree
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// When a component is constructed with an invalid configuration
    #[error("Configuration error: {0}")]
    InvalidConfig(String),
    /// When a requested datastore resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// When a datastore resource is created twice
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    /// When the candidate algorithm fails the efficiency comparison
    #[error("Comparison test failed: {0}")]
    FailedComparisonTest(String),
    /// When the candidate algorithm fails the simple-regret convergence test
    #[error("Simple-regret convergence test failed: {0}")]
    FailedSimpleRegretConvergenceTest(String),
    /// When IO fails
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    /// When a datastore snapshot (de)serialization fails
    #[error("JSON error")]
    JsonError(#[from] serde_json::Error),
}
