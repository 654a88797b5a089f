//! Shared primitive types used across the engine.

/// A customer identifier, unique within one batch.
pub type CustomerId = String;

/// Version tag carried by an `EngineConfig` and echoed in reports.
pub type ConfigVersion = String;

/// Upper bound on any single factor's contribution to the composite score.
pub const MAX_FACTOR_WEIGHT: f64 = 0.4;

/// Composite scores are rounded to 1/SCORE_SCALE before thresholding.
pub const SCORE_SCALE: f64 = 1_000_000.0;
