use crate::consts::{
    FIXED_WEIGHT_DRAW_BOUND, LEGACY_FIXED_ANCHOR, SHORT_SELLING_DRAW_BOUND, WEIGHT_SCALE,
};
use crate::error::{PortfolioError, Result};
use crate::market::WeightVector;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which scaled value bounds the rejection loop of the fixed-weight sampler.
///
/// `Legacy` keeps the historical literal 400 (a fixed weight of 0.4) no
/// matter what fixed weight is requested, so the drawn weights always share
/// a total of 0.6. `FixedWeight` derives the bound from the requested weight,
/// which makes every candidate sum to one. Legacy stays the default until the
/// intended behavior is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FixedWeightAnchor {
    #[default]
    Legacy,
    FixedWeight,
}

impl FixedWeightAnchor {
    pub fn scaled(&self, fixed_weight: f64) -> i64 {
        match self {
            FixedWeightAnchor::Legacy => LEGACY_FIXED_ANCHOR,
            FixedWeightAnchor::FixedWeight => (fixed_weight * WEIGHT_SCALE as f64).round() as i64,
        }
    }
}

/// The laws used to draw one candidate weight vector per trial.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightSampler {
    /// Asset 0 is pinned to `fixed_weight`; the other assets get integer
    /// draws from `[-600, 600)` scaled by 1/1000, the last one taking
    /// whatever is left of `1000 - anchor`.
    FixedWeight {
        fixed_weight: f64,
        other_asset_count: usize,
        anchor: i64,
    },
    /// Uniform `[0, 1)` draws, normalized by their sum.
    LongOnly { assets: usize },
    /// Uniform integer draws from `[-1000, 1000)`, normalized by their sum.
    ShortSelling { assets: usize },
}

impl WeightSampler {
    pub fn fixed_weight(
        fixed_weight: f64,
        other_asset_count: usize,
        anchor: FixedWeightAnchor,
    ) -> Result<Self> {
        // outside [-1, 1] the scaled anchor arithmetic is meaningless or overflows
        if !(-1.0..=1.0).contains(&fixed_weight) {
            return Err(PortfolioError::InvalidParameter(format!(
                "fixed weight must lie in [-1, 1], got {fixed_weight}"
            )));
        }
        if other_asset_count < 2 {
            return Err(PortfolioError::InvalidParameter(format!(
                "at least two other assets are needed next to the fixed one, got {other_asset_count}"
            )));
        }

        let anchor_scaled = anchor.scaled(fixed_weight);
        let fixed_scaled = FixedWeightAnchor::FixedWeight.scaled(fixed_weight);
        if anchor_scaled != fixed_scaled {
            warn!(
                "Legacy anchor bounds the draws with {} while the fixed weight scales to {}; \
                 candidate weights will sum to {} instead of 1.",
                anchor_scaled,
                fixed_scaled,
                fixed_weight + (WEIGHT_SCALE - anchor_scaled) as f64 / WEIGHT_SCALE as f64
            );
        }

        Ok(WeightSampler::FixedWeight {
            fixed_weight,
            other_asset_count,
            anchor: anchor_scaled,
        })
    }

    pub fn unconstrained(assets: usize, allow_short_selling: bool) -> Result<Self> {
        if assets == 0 {
            return Err(PortfolioError::InvalidParameter(
                "cannot sample weights for zero assets".into(),
            ));
        }
        Ok(if allow_short_selling {
            WeightSampler::ShortSelling { assets }
        } else {
            WeightSampler::LongOnly { assets }
        })
    }

    pub fn asset_count(&self) -> usize {
        match self {
            WeightSampler::FixedWeight {
                other_asset_count, ..
            } => other_asset_count + 1,
            WeightSampler::LongOnly { assets } | WeightSampler::ShortSelling { assets } => *assets,
        }
    }

    /// Draws one candidate. `None` means the raw draw summed to exactly zero
    /// and cannot be normalized; the trial is spent without a candidate.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<WeightVector> {
        match self {
            WeightSampler::FixedWeight {
                fixed_weight,
                other_asset_count,
                anchor,
            } => Some(draw_around_fixed_weight(
                *fixed_weight,
                *other_asset_count,
                *anchor,
                rng,
            )),
            WeightSampler::LongOnly { assets } => {
                WeightVector::new((0..*assets).map(|_| rng.gen::<f64>()).collect()).normalized()
            }
            WeightSampler::ShortSelling { assets } => WeightVector::new(
                (0..*assets)
                    .map(|_| rng.gen_range(-SHORT_SELLING_DRAW_BOUND..SHORT_SELLING_DRAW_BOUND) as f64)
                    .collect(),
            )
            .normalized(),
        }
    }
}

fn draw_around_fixed_weight<R: Rng + ?Sized>(
    fixed_weight: f64,
    other_asset_count: usize,
    anchor: i64,
    rng: &mut R,
) -> WeightVector {
    let mut scaled = Vec::with_capacity(other_asset_count);

    let first = rng.gen_range(-FIXED_WEIGHT_DRAW_BOUND..FIXED_WEIGHT_DRAW_BOUND);
    let mut running_total = first;
    scaled.push(first);

    // every further draw is redrawn until the scaled total fits under 1000
    for _ in 1..other_asset_count - 1 {
        let draw = loop {
            let candidate = rng.gen_range(-FIXED_WEIGHT_DRAW_BOUND..FIXED_WEIGHT_DRAW_BOUND);
            if anchor + running_total + candidate <= WEIGHT_SCALE {
                break candidate;
            }
        };
        running_total += draw;
        scaled.push(draw);
    }
    scaled.push(WEIGHT_SCALE - anchor - running_total);

    let mut weights = Vec::with_capacity(other_asset_count + 1);
    weights.push(fixed_weight);
    weights.extend(scaled.iter().map(|&s| s as f64 / WEIGHT_SCALE as f64));
    WeightVector::new(weights)
}
