use crate::error::{PortfolioError, Result};
use nalgebra::{DMatrix, DVector, Dim, Matrix, RawStorage};

pub fn is_row_vector<R: Dim, C: Dim, S: RawStorage<f64, R, C>>(
    vector: &Matrix<f64, R, C, S>,
) -> bool {
    vector.nrows() == 1
}

pub fn is_col_vector<R: Dim, C: Dim, S: RawStorage<f64, R, C>>(
    vector: &Matrix<f64, R, C, S>,
) -> bool {
    vector.ncols() == 1
}

/// True when `first * second` is defined, i.e. the column count of `first`
/// equals the row count of `second`.
pub fn dimensions_match<R1, C1, S1, R2, C2, S2>(
    first: &Matrix<f64, R1, C1, S1>,
    second: &Matrix<f64, R2, C2, S2>,
) -> bool
where
    R1: Dim,
    C1: Dim,
    S1: RawStorage<f64, R1, C1>,
    R2: Dim,
    C2: Dim,
    S2: RawStorage<f64, R2, C2>,
{
    first.ncols() == second.nrows()
}

/// Copies a row or column vector into an owned `1 x n` matrix.
/// The input is left untouched whatever its orientation.
pub fn to_row<R: Dim, C: Dim, S: RawStorage<f64, R, C>>(
    vector: &Matrix<f64, R, C, S>,
) -> Result<DMatrix<f64>> {
    let (rows, cols) = vector.shape();
    if is_row_vector(vector) {
        Ok(DMatrix::from_iterator(1, cols, vector.iter().copied()))
    } else if is_col_vector(vector) {
        Ok(DMatrix::from_iterator(1, rows, vector.iter().copied()))
    } else {
        Err(PortfolioError::NotAVector { rows, cols })
    }
}

/// Copies a row or column vector into an owned `n x 1` matrix.
pub fn to_col<R: Dim, C: Dim, S: RawStorage<f64, R, C>>(
    vector: &Matrix<f64, R, C, S>,
) -> Result<DMatrix<f64>> {
    let (rows, cols) = vector.shape();
    if is_col_vector(vector) {
        Ok(DMatrix::from_iterator(rows, 1, vector.iter().copied()))
    } else if is_row_vector(vector) {
        Ok(DMatrix::from_iterator(cols, 1, vector.iter().copied()))
    } else {
        Err(PortfolioError::NotAVector { rows, cols })
    }
}

pub fn ones(n: usize) -> DVector<f64> {
    DVector::from_element(n, 1.0)
}
