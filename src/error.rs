use thiserror::Error;

// Unified error type for pcgkit

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KError {
    #[error(
        "non-matching dimensions: operator is {rows}x{cols}, rhs has {rhs} entries, solution has {solution}"
    )]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        rhs: usize,
        solution: usize,
    },
    #[error("invalid block size {0}: must be at least 1")]
    InvalidBlockSize(usize),
    #[error("solve error: {0}")]
    SolveError(String),
    #[error("zero pivot at row {0}")]
    ZeroPivot(usize),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}
