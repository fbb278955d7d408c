// Numeric constants shared by the sampling laws and the search criteria.

pub const FLOAT_COMPARISON_EPSILON: f64 = 1e-9;

pub const DEFAULT_TRIALS: usize = 100_000;

/// Weights are drawn as integers and divided by this to become fractions.
pub const WEIGHT_SCALE: i64 = 1000;
/// Scaled draws for the fixed-weight search come from `[-BOUND, BOUND)`.
pub const FIXED_WEIGHT_DRAW_BOUND: i64 = 600;
/// The scaled fixed weight hard-wired into the historical rejection rule (0.4).
pub const LEGACY_FIXED_ANCHOR: i64 = 400;
/// Scaled draws when short selling is allowed come from `[-BOUND, BOUND)`.
pub const SHORT_SELLING_DRAW_BOUND: i64 = 1000;

pub const DEFAULT_RETURN_TOLERANCE: f64 = 0.01;
pub const DEFAULT_VARIANCE_TOLERANCE: f64 = 0.1;
