use super::{run_search, Criterion, Scorer, SearchConfig, SearchResult};
use crate::error::{PortfolioError, Result};
use crate::market::{CovarianceMatrix, ExpectedReturns};
use crate::sampling::WeightSampler;
use rand::Rng;

fn check_target(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PortfolioError::InvalidParameter(format!(
            "{name} must be finite, got {value}"
        )))
    }
}

/// Minimum-variance search with asset 0 pinned to `fixed_weight`.
///
/// The remaining `other_asset_count` weights follow the scaled-integer law of
/// [`WeightSampler::FixedWeight`], bounded according to
/// `config.fixed_weight_anchor`. The returned weights have
/// `other_asset_count + 1` entries, the first being exactly `fixed_weight`.
pub fn search_min_variance_given_fixed_weight<R: Rng + ?Sized>(
    fixed_weight: f64,
    other_asset_count: usize,
    covariance: &CovarianceMatrix,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<SearchResult> {
    let sampler =
        WeightSampler::fixed_weight(fixed_weight, other_asset_count, config.fixed_weight_anchor)?;
    let scorer = Scorer {
        covariance: covariance.as_matrix(),
        expected_returns: None,
    };
    run_search(&sampler, &Criterion::MinVariance, &scorer, config, rng)
}

/// Lowest-variance sampled portfolio whose expected return lies strictly
/// within `config.return_tolerance` of `target_return`.
///
/// The asset count is taken from `expected_returns`; a covariance of another
/// dimension makes every trial fail and surfaces as a dimension mismatch.
pub fn search_min_variance_given_return<R: Rng + ?Sized>(
    target_return: f64,
    expected_returns: &ExpectedReturns,
    covariance: &CovarianceMatrix,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<SearchResult> {
    check_target("target return", target_return)?;
    let sampler = WeightSampler::unconstrained(expected_returns.len(), config.allow_short_selling)?;
    let criterion = Criterion::MinVarianceNearReturn {
        target_return,
        tolerance: config.return_tolerance,
    };
    let scorer = Scorer {
        covariance: covariance.as_matrix(),
        expected_returns: Some(expected_returns.as_vector()),
    };
    run_search(&sampler, &criterion, &scorer, config, rng)
}

/// Highest-return sampled portfolio whose variance lies strictly within
/// `config.variance_tolerance` of `target_variance`.
pub fn search_max_return_given_variance<R: Rng + ?Sized>(
    target_variance: f64,
    expected_returns: &ExpectedReturns,
    covariance: &CovarianceMatrix,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<SearchResult> {
    check_target("target variance", target_variance)?;
    let sampler = WeightSampler::unconstrained(expected_returns.len(), config.allow_short_selling)?;
    let criterion = Criterion::MaxReturnNearVariance {
        target_variance,
        tolerance: config.variance_tolerance,
    };
    let scorer = Scorer {
        covariance: covariance.as_matrix(),
        expected_returns: Some(expected_returns.as_vector()),
    };
    run_search(&sampler, &criterion, &scorer, config, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FLOAT_COMPARISON_EPSILON;
    use crate::portfolio::{min_var_portfolio, portfolio_variance};
    use crate::sampling::FixedWeightAnchor;
    use crate::search::Execution;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn covariance() -> CovarianceMatrix {
        CovarianceMatrix::from_variances(&[0.0225, 0.04, 0.09, 0.0625])
    }

    fn expected_returns() -> ExpectedReturns {
        ExpectedReturns::new(vec![0.06, 0.08, 0.12, 0.10])
    }

    fn config(trials: usize) -> SearchConfig {
        SearchConfig {
            trials,
            seed: Some(42),
            ..SearchConfig::default()
        }
    }

    fn global_min_variance() -> f64 {
        let cov = covariance();
        let weights = min_var_portfolio(cov.as_matrix()).unwrap();
        portfolio_variance(&weights, cov.as_matrix()).unwrap()
    }

    #[test]
    fn test_fixed_weight_search_scenario() {
        let config = config(1_000);
        let mut rng = config.rng();
        let result =
            search_min_variance_given_fixed_weight(0.4, 3, &covariance(), &config, &mut rng)
                .unwrap();

        assert_eq!(result.weights.len(), 4);
        assert_eq!(result.weights[0], 0.4);
        let rest: f64 = result.weights[1..].iter().sum();
        assert!((rest - 0.6).abs() < FLOAT_COMPARISON_EPSILON);
        assert!(result.expected_return.is_none());
        assert_eq!(result.report.trials, 1_000);
        // nothing can beat the unconstrained optimum
        assert!(result.variance >= global_min_variance() - FLOAT_COMPARISON_EPSILON);
    }

    #[test]
    fn test_fixed_weight_search_is_reproducible() {
        let config = config(2_000);
        let first = search_min_variance_given_fixed_weight(
            0.4,
            3,
            &covariance(),
            &config,
            &mut config.rng(),
        )
        .unwrap();
        let second = search_min_variance_given_fixed_weight(
            0.4,
            3,
            &covariance(),
            &config,
            &mut config.rng(),
        )
        .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fixed_weight_search_with_parameterized_anchor() {
        let config = SearchConfig {
            fixed_weight_anchor: FixedWeightAnchor::FixedWeight,
            ..config(1_000)
        };
        let result = search_min_variance_given_fixed_weight(
            0.2,
            3,
            &covariance(),
            &config,
            &mut config.rng(),
        )
        .unwrap();
        assert_eq!(result.weights[0], 0.2);
        let total: f64 = result.weights.iter().sum();
        assert!((total - 1.0).abs() < FLOAT_COMPARISON_EPSILON);
    }

    #[test]
    fn test_fixed_weight_search_dimension_mismatch() {
        let config = config(50);
        let small = CovarianceMatrix::from_variances(&[0.04, 0.09, 0.01]);
        let result =
            search_min_variance_given_fixed_weight(0.4, 3, &small, &config, &mut config.rng());
        assert!(matches!(
            result,
            Err(PortfolioError::DimensionMismatch {
                expected: 3,
                found: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_min_variance_given_return_long_only() {
        let config = config(20_000);
        let result = search_min_variance_given_return(
            0.09,
            &expected_returns(),
            &covariance(),
            &config,
            &mut config.rng(),
        )
        .unwrap();

        let total: f64 = result.weights.iter().sum();
        assert!((total - 1.0).abs() < FLOAT_COMPARISON_EPSILON);
        assert!(result.weights.iter().all(|&w| w >= 0.0));
        let achieved = result.expected_return.unwrap();
        assert!((achieved - 0.09).abs() < 0.01);
        assert!(result.variance >= global_min_variance() - FLOAT_COMPARISON_EPSILON);
    }

    #[test]
    fn test_min_variance_given_return_with_short_selling() {
        let config = SearchConfig {
            allow_short_selling: true,
            ..config(20_000)
        };
        let result = search_min_variance_given_return(
            0.09,
            &expected_returns(),
            &covariance(),
            &config,
            &mut config.rng(),
        )
        .unwrap();

        let total: f64 = result.weights.iter().sum();
        assert!((total - 1.0).abs() < FLOAT_COMPARISON_EPSILON);
        assert!((result.expected_return.unwrap() - 0.09).abs() < 0.01);
        assert_eq!(
            result.report.trials,
            20_000,
            "zero-sum draws still consume their trial"
        );
    }

    #[test]
    fn test_unreachable_return_reports_no_feasible_candidate() {
        let config = config(2_000);
        let result = search_min_variance_given_return(
            5.0,
            &expected_returns(),
            &covariance(),
            &config,
            &mut config.rng(),
        );
        match result {
            Err(PortfolioError::NoFeasibleCandidate {
                trials,
                discarded,
                rejected,
            }) => {
                assert_eq!(trials, 2_000);
                assert_eq!(discarded + rejected, 2_000);
            }
            other => panic!("expected NoFeasibleCandidate, got {other:?}"),
        }
    }

    #[test]
    fn test_return_search_dimension_mismatch() {
        let config = config(100);
        let result = search_min_variance_given_return(
            0.09,
            &ExpectedReturns::new(vec![0.06, 0.08, 0.12]),
            &covariance(),
            &config,
            &mut config.rng(),
        );
        assert!(matches!(
            result,
            Err(PortfolioError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_max_return_given_variance() {
        let config = config(20_000);
        let result = search_max_return_given_variance(
            0.03,
            &expected_returns(),
            &covariance(),
            &config,
            &mut config.rng(),
        )
        .unwrap();

        let total: f64 = result.weights.iter().sum();
        assert!((total - 1.0).abs() < FLOAT_COMPARISON_EPSILON);
        assert!((result.variance - 0.03).abs() < 0.1);
        let best_return = result.expected_return.unwrap();
        // long only, so bounded by the best single asset
        assert!(best_return <= 0.12 + FLOAT_COMPARISON_EPSILON);
        assert!(best_return > 0.09);
    }

    #[test]
    fn test_max_return_given_variance_with_short_selling() {
        let config = SearchConfig {
            allow_short_selling: true,
            ..config(20_000)
        };
        let result = search_max_return_given_variance(
            0.03,
            &expected_returns(),
            &covariance(),
            &config,
            &mut config.rng(),
        )
        .unwrap();

        let total: f64 = result.weights.iter().sum();
        assert!((total - 1.0).abs() < FLOAT_COMPARISON_EPSILON);
        assert!((result.variance - 0.03).abs() < 0.1);
        assert!(result.expected_return.is_some());
        assert_eq!(result.report.trials, 20_000);
    }

    #[test]
    fn test_unreachable_variance_reports_no_feasible_candidate() {
        let config = config(2_000);
        let result = search_max_return_given_variance(
            5.0,
            &expected_returns(),
            &covariance(),
            &config,
            &mut config.rng(),
        );
        match result {
            Err(PortfolioError::NoFeasibleCandidate {
                trials,
                discarded,
                rejected,
            }) => {
                assert_eq!(trials, 2_000);
                assert_eq!(discarded + rejected, 2_000);
            }
            other => panic!("expected NoFeasibleCandidate, got {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_targets_rejected() {
        let config = config(10);
        assert!(matches!(
            search_max_return_given_variance(
                f64::NAN,
                &expected_returns(),
                &covariance(),
                &config,
                &mut config.rng(),
            ),
            Err(PortfolioError::InvalidParameter(_))
        ));
        assert!(search_min_variance_given_return(
            f64::INFINITY,
            &expected_returns(),
            &covariance(),
            &config,
            &mut config.rng(),
        )
        .is_err());
    }

    #[test]
    fn test_parallel_search_is_deterministic_for_a_seed() {
        let config = SearchConfig {
            execution: Execution::Parallel,
            max_concurrency: 4,
            ..config(8_000)
        };
        let run = || {
            search_min_variance_given_return(
                0.09,
                &expected_returns(),
                &covariance(),
                &config,
                &mut config.rng(),
            )
            .unwrap()
        };
        let first = run();
        let second = run();

        assert_eq!(first, second);
        assert_eq!(first.report.trials, 8_000);
        assert!((first.expected_return.unwrap() - 0.09).abs() < 0.01);
        let total: f64 = first.weights.iter().sum();
        assert!((total - 1.0).abs() < FLOAT_COMPARISON_EPSILON);
    }

    #[test]
    fn test_generalizes_beyond_four_assets() {
        let covariance = CovarianceMatrix::from_variances(&[0.04, 0.05, 0.06, 0.07, 0.08, 0.09]);
        let returns = ExpectedReturns::new(vec![0.05, 0.06, 0.07, 0.08, 0.09, 0.10]);
        let config = config(5_000);
        let result = search_min_variance_given_return(
            0.075,
            &returns,
            &covariance,
            &config,
            &mut config.rng(),
        )
        .unwrap();
        assert_eq!(result.weights.len(), 6);
    }
}
