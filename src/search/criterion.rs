use crate::market::WeightVector;
use serde::{Deserialize, Serialize};

/// A scored candidate from a single trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub weights: WeightVector,
    pub expected_return: Option<f64>,
    pub variance: f64,
}

#[derive(Copy, Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum OptimizationDirection {
    Maximize,
    Minimize,
}

/// Decides which candidates are admissible and when one replaces the
/// incumbent. Replacement is always strict, so on ties the candidate seen
/// first is kept.
#[derive(Copy, Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Criterion {
    MinVariance,
    MinVarianceNearReturn { target_return: f64, tolerance: f64 },
    MaxReturnNearVariance { target_variance: f64, tolerance: f64 },
}

impl Criterion {
    pub fn direction(&self) -> OptimizationDirection {
        match self {
            Criterion::MinVariance | Criterion::MinVarianceNearReturn { .. } => {
                OptimizationDirection::Minimize
            }
            Criterion::MaxReturnNearVariance { .. } => OptimizationDirection::Maximize,
        }
    }

    pub fn is_feasible(&self, candidate: &Candidate) -> bool {
        match *self {
            Criterion::MinVariance => true,
            Criterion::MinVarianceNearReturn {
                target_return,
                tolerance,
            } => candidate
                .expected_return
                .is_some_and(|r| (target_return - r).abs() < tolerance),
            Criterion::MaxReturnNearVariance {
                target_variance,
                tolerance,
            } => (target_variance - candidate.variance).abs() < tolerance,
        }
    }

    /// Whether `candidate` strictly beats `incumbent` on the objective.
    /// Feasibility is checked separately.
    pub fn improves(&self, candidate: &Candidate, incumbent: Option<&Candidate>) -> bool {
        match self.direction() {
            OptimizationDirection::Minimize => {
                candidate.variance < incumbent.map_or(f64::INFINITY, |c| c.variance)
            }
            OptimizationDirection::Maximize => {
                let best_return = incumbent
                    .and_then(|c| c.expected_return)
                    .unwrap_or(f64::NEG_INFINITY);
                candidate.expected_return.is_some_and(|r| r > best_return)
            }
        }
    }
}
