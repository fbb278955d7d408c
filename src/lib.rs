pub mod consts;
pub mod error;
pub mod linalg;
pub mod market;
pub mod portfolio;
pub mod sampling;
pub mod search;

pub use crate::error::{PortfolioError, Result};
pub use crate::market::{CovarianceMatrix, ExpectedReturns, MarketInputs, WeightVector};
pub use crate::portfolio::{
    evaluate, min_var_portfolio, portfolio_return, portfolio_variance, portfolio_volatility,
    PortfolioStats,
};
pub use crate::search::{
    search_max_return_given_variance, search_min_variance_given_fixed_weight,
    search_min_variance_given_return, SearchConfig, SearchResult,
};
