use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("Dimensions do not match in {operation}: expected {expected}, found {found}")]
    DimensionMismatch {
        operation: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Expected a row or column vector, got a {rows}x{cols} matrix")]
    NotAVector { rows: usize, cols: usize },
    #[error("Covariance matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("Covariance matrix is singular")]
    SingularMatrix,
    #[error(
        "No feasible candidate found in {trials} trials ({discarded} discarded, {rejected} rejected)"
    )]
    NoFeasibleCandidate {
        trials: usize,
        discarded: usize,
        rejected: usize,
    },
    #[error("Invalid parameter: `{0}`")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, PortfolioError>;
