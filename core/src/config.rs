//! Engine configuration: every boundary, weight and threshold the engine
//! uses, in one injectable value.
//!
//! RULE: no scoring constant lives anywhere else. Scorer, selector and
//! batch processor each take an `EngineConfig` and validate it on
//! construction, so a bad table fails at startup, never mid-batch.

use crate::{
    error::{EngineError, EngineResult},
    record::Segment,
    types::{ConfigVersion, MAX_FACTOR_WEIGHT},
};
use serde::{Deserialize, Serialize};

// ── Band tables ──────────────────────────────────────────────────────────────

/// How a band's bound is compared against the input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandDirection {
    /// Band matches when `value < bound`; bounds ascend.
    Below,
    /// Band matches when `value >= bound`; bounds descend.
    AtLeast,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub bound:  f64,
    pub weight: f64,
}

/// Ordered buckets for one numeric factor. First matching band wins;
/// `otherwise` applies when none match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTable {
    pub direction: BandDirection,
    pub bands:     Vec<Band>,
    pub otherwise: f64,
}

impl BandTable {
    pub fn below(bands: &[(f64, f64)], otherwise: f64) -> Self {
        Self::build(BandDirection::Below, bands, otherwise)
    }

    pub fn at_least(bands: &[(f64, f64)], otherwise: f64) -> Self {
        Self::build(BandDirection::AtLeast, bands, otherwise)
    }

    fn build(direction: BandDirection, bands: &[(f64, f64)], otherwise: f64) -> Self {
        Self {
            direction,
            bands: bands
                .iter()
                .map(|&(bound, weight)| Band { bound, weight })
                .collect(),
            otherwise,
        }
    }

    pub fn weight_for(&self, value: f64) -> f64 {
        self.bands
            .iter()
            .find(|band| match self.direction {
                BandDirection::Below   => value < band.bound,
                BandDirection::AtLeast => value >= band.bound,
            })
            .map(|band| band.weight)
            .unwrap_or(self.otherwise)
    }

    /// Bounds strictly ordered for the direction, weights within
    /// `[0, MAX_FACTOR_WEIGHT]` and non-increasing down the table (so
    /// moving a value toward the risky end never lowers its weight).
    fn validate(&self, table: &str) -> EngineResult<()> {
        if self.bands.is_empty() {
            return Err(EngineError::config(format!("{table}: no bands defined")));
        }

        check_weight(table, "otherwise", self.otherwise)?;

        for (i, band) in self.bands.iter().enumerate() {
            if !band.bound.is_finite() {
                return Err(EngineError::config(format!(
                    "{table}: band {i} has non-finite bound"
                )));
            }
            check_weight(table, &format!("band {i}"), band.weight)?;
        }

        for (i, pair) in self.bands.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let ordered = match self.direction {
                BandDirection::Below   => a.bound < b.bound,
                BandDirection::AtLeast => a.bound > b.bound,
            };
            if !ordered {
                return Err(EngineError::config(format!(
                    "{table}: bounds of bands {i} and {} overlap or are out of order ({} then {})",
                    i + 1,
                    a.bound,
                    b.bound
                )));
            }
            if b.weight > a.weight {
                return Err(EngineError::config(format!(
                    "{table}: weight rises from band {i} to band {} ({} < {})",
                    i + 1,
                    a.weight,
                    b.weight
                )));
            }
        }

        let last = self.bands[self.bands.len() - 1];
        if self.otherwise > last.weight {
            return Err(EngineError::config(format!(
                "{table}: fallback weight {} exceeds last band weight {}",
                self.otherwise, last.weight
            )));
        }

        Ok(())
    }
}

fn check_weight(table: &str, what: &str, weight: f64) -> EngineResult<()> {
    if !(0.0..=MAX_FACTOR_WEIGHT).contains(&weight) {
        return Err(EngineError::config(format!(
            "{table}: {what} weight {weight} outside [0, {MAX_FACTOR_WEIGHT}]"
        )));
    }
    Ok(())
}

/// Checks `0 < lo < hi <= 1`.
fn check_ascending(name: &str, lo: f64, hi: f64) -> EngineResult<()> {
    if !(lo > 0.0 && lo < hi && hi <= 1.0) {
        return Err(EngineError::config(format!(
            "{name}: expected 0 < {lo} < {hi} <= 1"
        )));
    }
    Ok(())
}

// ── Categorical weights and thresholds ───────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChurnLabelWeights {
    pub low:    f64,
    pub medium: f64,
    pub high:   f64,
}

/// Composite score → risk level. Each value is the inclusive lower bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub medium:   f64,
    pub high:     f64,
    pub critical: f64,
}

/// Total factor weight → confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub medium: f64,
    pub high:   f64,
}

/// Classifier probability → churn label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChurnCutoffs {
    pub medium: f64,
    pub high:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRules {
    /// Lifetime revenue strictly above this escalates priority one level.
    pub high_value_revenue:  f64,
    /// Segments that escalate priority one level.
    pub escalating_segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsightRules {
    /// Mean score above this reads as "concerning".
    pub concerning_average: f64,
    /// Mean score below this reads as "generally good".
    pub healthy_average:    f64,
}

// ── Engine config ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub version:       ConfigVersion,
    pub health:        BandTable,
    pub engagement:    BandTable,
    pub inactivity:    BandTable,
    pub churn_label:   ChurnLabelWeights,
    pub risk_levels:   RiskLevelThresholds,
    pub confidence:    ConfidenceThresholds,
    pub churn_cutoffs: ChurnCutoffs,
    pub priority:      PriorityRules,
    pub insights:      InsightRules,
}

impl Default for EngineConfig {
    /// The standard table: 0.3/0.2/0.1 health weights, levels at 0.7/0.5/0.3.
    fn default() -> Self {
        Self {
            version:    "standard-1.0".into(),
            health:     BandTable::below(&[(30.0, 0.3), (50.0, 0.2), (70.0, 0.1)], 0.0),
            engagement: BandTable::below(&[(0.3, 0.2), (0.7, 0.1)], 0.0),
            inactivity: BandTable::at_least(&[(60.0, 0.1), (30.0, 0.05)], 0.0),
            churn_label: ChurnLabelWeights {
                low:    0.0,
                medium: 0.2,
                high:   0.4,
            },
            risk_levels: RiskLevelThresholds {
                medium:   0.3,
                high:     0.5,
                critical: 0.7,
            },
            confidence: ConfidenceThresholds {
                medium: 0.5,
                high:   0.8,
            },
            churn_cutoffs: ChurnCutoffs {
                medium: 0.3,
                high:   0.7,
            },
            priority: PriorityRules {
                high_value_revenue:  100_000.0,
                escalating_segments: vec![Segment::HighValue, Segment::Enterprise],
            },
            insights: InsightRules {
                concerning_average: 0.5,
                healthy_average:    0.3,
            },
        }
    }
}

impl EngineConfig {
    /// The stricter table: heavier low-health and low-engagement weights,
    /// levels at 0.8/0.6/0.4.
    pub fn strict() -> Self {
        Self {
            version:    "strict-1.0".into(),
            health:     BandTable::below(&[(30.0, 0.4), (50.0, 0.3), (70.0, 0.2)], 0.0),
            engagement: BandTable::below(&[(0.3, 0.3), (0.7, 0.1)], 0.0),
            risk_levels: RiskLevelThresholds {
                medium:   0.4,
                high:     0.6,
                critical: 0.8,
            },
            insights: InsightRules {
                concerning_average: 0.6,
                healthy_average:    0.3,
            },
            ..Self::default()
        }
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &str) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("loaded engine config '{}' from {path}", config.version);
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.health.validate("health")?;
        self.engagement.validate("engagement")?;
        self.inactivity.validate("inactivity")?;

        let cl = &self.churn_label;
        for (label, w) in [("low", cl.low), ("medium", cl.medium), ("high", cl.high)] {
            check_weight("churn_label", label, w)?;
        }
        if !(cl.low <= cl.medium && cl.medium <= cl.high) {
            return Err(EngineError::config(
                "churn_label: weights must not decrease from low to high",
            ));
        }

        let rl = &self.risk_levels;
        check_ascending("risk_levels", rl.medium, rl.high)?;
        check_ascending("risk_levels", rl.high, rl.critical)?;

        check_ascending("confidence", self.confidence.medium, self.confidence.high)?;
        check_ascending("churn_cutoffs", self.churn_cutoffs.medium, self.churn_cutoffs.high)?;

        let revenue = self.priority.high_value_revenue;
        if !revenue.is_finite() || revenue < 0.0 {
            return Err(EngineError::config(format!(
                "priority: high_value_revenue {revenue} must be a non-negative number"
            )));
        }

        let ins = &self.insights;
        if !(0.0..=1.0).contains(&ins.healthy_average)
            || !(0.0..=1.0).contains(&ins.concerning_average)
            || ins.healthy_average > ins.concerning_average
        {
            return Err(EngineError::config(format!(
                "insights: expected 0 <= healthy_average ({}) <= concerning_average ({}) <= 1",
                ins.healthy_average, ins.concerning_average
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_table_picks_first_matching_band() {
        let t = BandTable::below(&[(30.0, 0.3), (50.0, 0.2), (70.0, 0.1)], 0.0);
        assert_eq!(t.weight_for(0.0), 0.3);
        assert_eq!(t.weight_for(29.999), 0.3);
        assert_eq!(t.weight_for(30.0), 0.2);
        assert_eq!(t.weight_for(69.9), 0.1);
        assert_eq!(t.weight_for(70.0), 0.0);
    }

    #[test]
    fn at_least_table_picks_first_matching_band() {
        let t = BandTable::at_least(&[(60.0, 0.1), (30.0, 0.05)], 0.0);
        assert_eq!(t.weight_for(90.0), 0.1);
        assert_eq!(t.weight_for(60.0), 0.1);
        assert_eq!(t.weight_for(30.0), 0.05);
        assert_eq!(t.weight_for(29.0), 0.0);
    }

    #[test]
    fn default_and_strict_validate() {
        EngineConfig::default().validate().unwrap();
        EngineConfig::strict().validate().unwrap();
    }
}
