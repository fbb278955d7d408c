use crate::consts::{DEFAULT_RETURN_TOLERANCE, DEFAULT_TRIALS, DEFAULT_VARIANCE_TOLERANCE};
use crate::error::{PortfolioError, Result};
use crate::sampling::FixedWeightAnchor;
use rand::{rngs::OsRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

fn default_trials() -> usize {
    DEFAULT_TRIALS
}

fn default_return_tolerance() -> f64 {
    DEFAULT_RETURN_TOLERANCE
}

fn default_variance_tolerance() -> f64 {
    DEFAULT_VARIANCE_TOLERANCE
}

fn default_max_concurrency() -> usize {
    num_cpus::get()
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// One random stream, trials in order.
    #[default]
    Sequential,
    /// Trials split into `max_concurrency` chunks run on the rayon pool,
    /// each chunk with its own generator seeded from the caller's.
    Parallel,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_trials")]
    pub trials: usize,
    #[serde(default)]
    pub allow_short_selling: bool,
    #[serde(default = "default_return_tolerance")]
    pub return_tolerance: f64,
    #[serde(default = "default_variance_tolerance")]
    pub variance_tolerance: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub execution: Execution,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub fixed_weight_anchor: FixedWeightAnchor,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            trials: default_trials(),
            allow_short_selling: false,
            return_tolerance: default_return_tolerance(),
            variance_tolerance: default_variance_tolerance(),
            seed: None,
            execution: Execution::default(),
            max_concurrency: default_max_concurrency(),
            fixed_weight_anchor: FixedWeightAnchor::default(),
        }
    }
}

impl SearchConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)
            .map_err(|e| PortfolioError::InvalidParameter(format!("bad search config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(PortfolioError::InvalidParameter(
                "trials must be positive".into(),
            ));
        }
        for (name, tolerance) in [
            ("return_tolerance", self.return_tolerance),
            ("variance_tolerance", self.variance_tolerance),
        ] {
            if !tolerance.is_finite() || tolerance <= 0.0 {
                return Err(PortfolioError::InvalidParameter(format!(
                    "{name} must be a positive finite number, got {tolerance}"
                )));
            }
        }
        if self.execution == Execution::Parallel && self.max_concurrency == 0 {
            return Err(PortfolioError::InvalidParameter(
                "max_concurrency must be positive for parallel execution".into(),
            ));
        }
        Ok(())
    }

    /// Generator for a search run. Without a seed one is drawn from the OS.
    pub fn rng(&self) -> ChaCha20Rng {
        let seed = self.seed.unwrap_or_else(|| OsRng.next_u64());
        ChaCha20Rng::seed_from_u64(seed)
    }
}
