use crate::error::{PortfolioError, Result};
use nalgebra::{DMatrix, DVector};

/// Per-asset fractional allocation, always stored as a column.
/// Not necessarily normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector(DVector<f64>);

impl WeightVector {
    pub fn new(weights: Vec<f64>) -> Self {
        WeightVector(DVector::from_vec(weights))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.0.sum()
    }

    /// Divides every weight by the total. Returns `None` when the raw weights
    /// sum to exactly zero, since such a draw has no normalized form.
    pub fn normalized(&self) -> Option<WeightVector> {
        let total = self.sum();
        if total == 0.0 {
            return None;
        }
        Some(WeightVector(&self.0 / total))
    }

    pub fn as_vector(&self) -> &DVector<f64> {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.iter().copied().collect()
    }
}

impl From<DVector<f64>> for WeightVector {
    fn from(vector: DVector<f64>) -> Self {
        WeightVector(vector)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedReturns(DVector<f64>);

impl ExpectedReturns {
    pub fn new(returns: Vec<f64>) -> Self {
        ExpectedReturns(DVector::from_vec(returns))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_vector(&self) -> &DVector<f64> {
        &self.0
    }
}

/// Square matrix of pairwise covariances. Symmetry and positive
/// semi-definiteness are the caller's responsibility.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix(DMatrix<f64>);

impl CovarianceMatrix {
    pub fn new(matrix: DMatrix<f64>) -> Result<Self> {
        let (rows, cols) = matrix.shape();
        if rows != cols {
            return Err(PortfolioError::NotSquare { rows, cols });
        }
        Ok(CovarianceMatrix(matrix))
    }

    /// Builds an `n x n` matrix from `n * n` values given row by row.
    pub fn from_row_slice(dimension: usize, values: &[f64]) -> Result<Self> {
        if values.len() != dimension * dimension {
            return Err(PortfolioError::DimensionMismatch {
                operation: "covariance construction",
                expected: dimension * dimension,
                found: values.len(),
            });
        }
        Self::new(DMatrix::from_row_slice(dimension, dimension, values))
    }

    /// Covariance of uncorrelated assets with the given variances.
    pub fn from_variances(variances: &[f64]) -> Self {
        CovarianceMatrix(DMatrix::from_diagonal(&DVector::from_column_slice(
            variances,
        )))
    }

    pub fn dimension(&self) -> usize {
        self.0.nrows()
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.0
    }
}

/// Expected returns and covariance for the same assets, in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketInputs {
    expected_returns: ExpectedReturns,
    covariance: CovarianceMatrix,
}

impl MarketInputs {
    pub fn new(expected_returns: ExpectedReturns, covariance: CovarianceMatrix) -> Result<Self> {
        if expected_returns.len() != covariance.dimension() {
            return Err(PortfolioError::DimensionMismatch {
                operation: "market inputs",
                expected: covariance.dimension(),
                found: expected_returns.len(),
            });
        }
        Ok(MarketInputs {
            expected_returns,
            covariance,
        })
    }

    pub fn asset_count(&self) -> usize {
        self.covariance.dimension()
    }

    pub fn expected_returns(&self) -> &ExpectedReturns {
        &self.expected_returns
    }

    pub fn covariance(&self) -> &CovarianceMatrix {
        &self.covariance
    }
}
