use crate::error::{PortfolioError, Result};
use crate::market::WeightVector;
use crate::portfolio::{portfolio_return, portfolio_variance};
use crate::sampling::WeightSampler;
use nalgebra::{DMatrix, DVector};
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

mod config;
mod criterion;
mod procedures;

pub use self::config::{Execution, SearchConfig};
pub use self::criterion::{Candidate, Criterion, OptimizationDirection};
pub use self::procedures::{
    search_max_return_given_variance, search_min_variance_given_fixed_weight,
    search_min_variance_given_return,
};

/// What happened to the trial budget of one search.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialReport {
    pub trials: usize,
    /// Raw draws that summed to zero and could not be normalized.
    pub discarded: usize,
    /// Candidates whose scoring failed.
    pub failed: usize,
    /// Candidates outside the feasibility band.
    pub infeasible: usize,
    /// Times the incumbent was replaced.
    pub improvements: usize,
}

impl TrialReport {
    fn merge(self, other: TrialReport) -> TrialReport {
        TrialReport {
            trials: self.trials + other.trials,
            discarded: self.discarded + other.discarded,
            failed: self.failed + other.failed,
            infeasible: self.infeasible + other.infeasible,
            improvements: self.improvements + other.improvements,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub weights: Vec<f64>,
    /// Absent for searches run without expected returns.
    pub expected_return: Option<f64>,
    pub variance: f64,
    pub report: TrialReport,
}

/// Scores candidates against the market inputs of one search.
struct Scorer<'a> {
    covariance: &'a DMatrix<f64>,
    expected_returns: Option<&'a DVector<f64>>,
}

impl Scorer<'_> {
    fn score(&self, weights: WeightVector) -> Result<Candidate> {
        let variance = portfolio_variance(weights.as_vector(), self.covariance)?;
        let expected_return = self
            .expected_returns
            .map(|returns| portfolio_return(weights.as_vector(), returns))
            .transpose()?;
        Ok(Candidate {
            weights,
            expected_return,
            variance,
        })
    }
}

/// Outcome of a run of consecutive trials on a single random stream.
struct TrialBatch {
    best: Option<Candidate>,
    report: TrialReport,
    last_error: Option<PortfolioError>,
}

fn run_trials<R: Rng + ?Sized>(
    trials: usize,
    sampler: &WeightSampler,
    criterion: &Criterion,
    scorer: &Scorer<'_>,
    rng: &mut R,
) -> TrialBatch {
    let mut best: Option<Candidate> = None;
    let mut report = TrialReport {
        trials,
        ..TrialReport::default()
    };
    let mut last_error = None;

    for trial in 0..trials {
        let Some(weights) = sampler.draw(rng) else {
            report.discarded += 1;
            continue;
        };

        let candidate = match scorer.score(weights) {
            Ok(candidate) => candidate,
            Err(e) => {
                report.failed += 1;
                last_error = Some(e);
                continue;
            }
        };

        if !criterion.is_feasible(&candidate) {
            report.infeasible += 1;
        } else if criterion.improves(&candidate, best.as_ref()) {
            trace!(
                trial,
                variance = candidate.variance,
                expected_return = ?candidate.expected_return,
                "new best candidate"
            );
            report.improvements += 1;
            best = Some(candidate);
        }
    }

    TrialBatch {
        best,
        report,
        last_error,
    }
}

/// Runs the full trial budget, keeping the feasible candidate that strictly
/// beats the incumbent under `criterion`. In parallel mode the chunk winners
/// are reduced in chunk order.
fn run_search<R: Rng + ?Sized>(
    sampler: &WeightSampler,
    criterion: &Criterion,
    scorer: &Scorer<'_>,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<SearchResult> {
    config.validate()?;
    debug!(
        trials = config.trials,
        assets = sampler.asset_count(),
        ?criterion,
        execution = ?config.execution,
        "Starting random search"
    );

    let batch = match config.execution {
        Execution::Sequential => run_trials(config.trials, sampler, criterion, scorer, rng),
        Execution::Parallel => run_parallel(sampler, criterion, scorer, config, rng),
    };

    let TrialBatch {
        best,
        report,
        last_error,
    } = batch;
    debug!(?report, "Random search finished");

    match best {
        Some(candidate) => Ok(SearchResult {
            weights: candidate.weights.to_vec(),
            expected_return: candidate.expected_return,
            variance: candidate.variance,
            report,
        }),
        None => {
            warn!(
                "No feasible candidate in {} trials ({} discarded, {} failed, {} infeasible).",
                report.trials, report.discarded, report.failed, report.infeasible
            );
            // a scoring error on every trial is almost always a shape problem
            Err(last_error.unwrap_or(PortfolioError::NoFeasibleCandidate {
                trials: report.trials,
                discarded: report.discarded,
                rejected: report.failed + report.infeasible,
            }))
        }
    }
}

fn run_parallel<R: Rng + ?Sized>(
    sampler: &WeightSampler,
    criterion: &Criterion,
    scorer: &Scorer<'_>,
    config: &SearchConfig,
    rng: &mut R,
) -> TrialBatch {
    let total_trials = config.trials;
    let max_concurrency = config.max_concurrency.clamp(1, total_trials);

    // e.g. 1000 trials over 3 chunks = 334, 334, 332
    let chunk_size = total_trials.div_ceil(max_concurrency);
    let number_of_chunks = total_trials.div_ceil(chunk_size);

    // seeds are drawn in chunk order so the run only depends on the caller's stream
    let chunks: Vec<(usize, u64)> = (0..number_of_chunks)
        .map(|i| {
            let trials = if i + 1 == number_of_chunks {
                total_trials - chunk_size * i
            } else {
                chunk_size
            };
            (trials, rng.next_u64())
        })
        .collect();

    chunks
        .into_par_iter()
        .map(|(trials, seed)| {
            let mut chunk_rng = ChaCha20Rng::seed_from_u64(seed);
            run_trials(trials, sampler, criterion, scorer, &mut chunk_rng)
        })
        .collect::<Vec<TrialBatch>>()
        .into_iter()
        .fold(
            TrialBatch {
                best: None,
                report: TrialReport::default(),
                last_error: None,
            },
            |acc, batch| {
                let best = match (acc.best, batch.best) {
                    (Some(current), Some(challenger)) => {
                        if criterion.improves(&challenger, Some(&current)) {
                            Some(challenger)
                        } else {
                            Some(current)
                        }
                    }
                    (current, challenger) => current.or(challenger),
                };
                TrialBatch {
                    best,
                    report: acc.report.merge(batch.report),
                    last_error: batch.last_error.or(acc.last_error),
                }
            },
        )
}
