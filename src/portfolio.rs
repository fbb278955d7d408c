use crate::consts::FLOAT_COMPARISON_EPSILON;
use crate::error::{PortfolioError, Result};
use crate::linalg::{dimensions_match, ones, to_col, to_row};
use crate::market::{MarketInputs, WeightVector};
use nalgebra::{DMatrix, DVector, Dim, Matrix, RawStorage};
use serde::{Deserialize, Serialize};

/// Expected return `w · r` of a portfolio.
///
/// Either argument may be a row or a column vector; copies are reoriented
/// internally and the caller's data is never modified.
pub fn portfolio_return<R1, C1, S1, R2, C2, S2>(
    weights: &Matrix<f64, R1, C1, S1>,
    expected_returns: &Matrix<f64, R2, C2, S2>,
) -> Result<f64>
where
    R1: Dim,
    C1: Dim,
    S1: RawStorage<f64, R1, C1>,
    R2: Dim,
    C2: Dim,
    S2: RawStorage<f64, R2, C2>,
{
    let weights = to_row(weights)?;
    let expected_returns = to_col(expected_returns)?;

    if !dimensions_match(&weights, &expected_returns) {
        return Err(PortfolioError::DimensionMismatch {
            operation: "portfolio return",
            expected: expected_returns.nrows(),
            found: weights.ncols(),
        });
    }

    Ok((&weights * &expected_returns)[(0, 0)])
}

/// Portfolio variance, the quadratic form `w · C · wᵗ`.
pub fn portfolio_variance<R, C, S>(
    weights: &Matrix<f64, R, C, S>,
    covariance: &DMatrix<f64>,
) -> Result<f64>
where
    R: Dim,
    C: Dim,
    S: RawStorage<f64, R, C>,
{
    let (rows, cols) = covariance.shape();
    if rows != cols {
        return Err(PortfolioError::NotSquare { rows, cols });
    }
    let weights = to_row(weights)?;

    if !dimensions_match(&weights, covariance) {
        return Err(PortfolioError::DimensionMismatch {
            operation: "portfolio variance",
            expected: rows,
            found: weights.ncols(),
        });
    }

    Ok((&weights * covariance * weights.transpose())[(0, 0)])
}

pub fn portfolio_volatility<R, C, S>(
    weights: &Matrix<f64, R, C, S>,
    covariance: &DMatrix<f64>,
) -> Result<f64>
where
    R: Dim,
    C: Dim,
    S: RawStorage<f64, R, C>,
{
    // rounding can push a zero variance slightly negative
    Ok(portfolio_variance(weights, covariance)?.max(0.).sqrt())
}

/// Global minimum-variance portfolio `(C⁻¹·1) / (1ᵗ·C⁻¹·1)`.
///
/// No return target is imposed, so the weights are only constrained to sum
/// to one and may be negative. Fails with [`PortfolioError::SingularMatrix`]
/// when the covariance cannot be inverted.
pub fn min_var_portfolio(covariance: &DMatrix<f64>) -> Result<DVector<f64>> {
    let (rows, cols) = covariance.shape();
    if rows != cols {
        return Err(PortfolioError::NotSquare { rows, cols });
    }
    if rows == 0 {
        return Err(PortfolioError::InvalidParameter(
            "covariance matrix has no assets".into(),
        ));
    }

    let inverse = covariance
        .clone()
        .try_inverse()
        .ok_or(PortfolioError::SingularMatrix)?;
    let unit = ones(rows);
    let unnormalized = inverse * &unit;
    let total = unit.dot(&unnormalized);

    if !total.is_finite() || total.abs() < FLOAT_COMPARISON_EPSILON {
        return Err(PortfolioError::SingularMatrix);
    }

    Ok(unnormalized / total)
}

/// Return and risk figures of one portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub expected_return: f64,
    pub variance: f64,
    pub volatility: f64,
}

pub fn evaluate(weights: &WeightVector, market: &MarketInputs) -> Result<PortfolioStats> {
    let expected_return =
        portfolio_return(weights.as_vector(), market.expected_returns().as_vector())?;
    let variance = portfolio_variance(weights.as_vector(), market.covariance().as_matrix())?;

    Ok(PortfolioStats {
        expected_return,
        variance,
        volatility: variance.max(0.).sqrt(),
    })
}
