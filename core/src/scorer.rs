//! Risk scoring: one customer record in, one `RiskResult` out.
//!
//! Factors are evaluated in a fixed order, each contributing at most once:
//!   1. health score bucket
//!   2. engagement bucket
//!   3. churn label weight
//!   4. days-since-engagement bucket
//!
//! The composite is the sum of factor weights, capped at 1.0. Every
//! boundary and weight comes from `EngineConfig`.

use crate::{
    config::{ConfidenceThresholds, EngineConfig, RiskLevelThresholds},
    error::EngineResult,
    record::{ChurnLabel, CustomerRecord, DEFAULT_ENGAGEMENT_SCORE, DEFAULT_HEALTH_SCORE},
    types::SCORE_SCALE,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low      => "Low",
            Self::Medium   => "Medium",
            Self::High     => "High",
            Self::Critical => "Critical",
        }
    }

    pub fn from_score(score: f64, t: &RiskLevelThresholds) -> Self {
        if score >= t.critical {
            Self::Critical
        } else if score >= t.high {
            Self::High
        } else if score >= t.medium {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much evidence stands behind a score. Reported only; it never
/// feeds back into the risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_total_weight(total: f64, t: &ConfidenceThresholds) -> Self {
        if total >= t.high {
            Self::High
        } else if total >= t.medium {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorName {
    HealthScore,
    Engagement,
    ChurnLabel,
    DaysSinceEngagement,
}

impl FactorName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HealthScore         => "health_score",
            Self::Engagement          => "engagement",
            Self::ChurnLabel          => "churn_label",
            Self::DaysSinceEngagement => "days_since_engagement",
        }
    }
}

impl fmt::Display for FactorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskFactor {
    pub name:   FactorName,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskResult {
    pub composite_score: f64,
    pub risk_level:      RiskLevel,
    /// In evaluation order.
    pub factors:         Vec<RiskFactor>,
    pub confidence:      Confidence,
}

impl RiskResult {
    /// Highest-weight non-zero factor; ties go to the earliest evaluated.
    pub fn dominant_factor(&self) -> Option<&RiskFactor> {
        self.factors
            .iter()
            .filter(|f| f.weight > 0.0)
            .fold(None, |best: Option<&RiskFactor>, f| match best {
                Some(b) if b.weight >= f.weight => Some(b),
                _ => Some(f),
            })
    }

    /// True when no factor contributed anything.
    pub fn is_weightless(&self) -> bool {
        self.factors.iter().all(|f| f.weight <= 0.0)
    }

    pub fn factor(&self, name: FactorName) -> Option<f64> {
        self.factors.iter().find(|f| f.name == name).map(|f| f.weight)
    }
}

// ── Scorer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RiskScorer {
    config: EngineConfig,
}

impl RiskScorer {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn score(&self, record: &CustomerRecord) -> RiskResult {
        let cfg = &self.config;

        let health = in_domain(record.health_score, DEFAULT_HEALTH_SCORE, 0.0, 100.0);
        let engagement = in_domain(record.engagement_score, DEFAULT_ENGAGEMENT_SCORE, 0.0, 1.0);
        let days = f64::from(record.days_since_last_engagement);

        let churn_weight = match record.churn_risk_label {
            ChurnLabel::High   => cfg.churn_label.high,
            ChurnLabel::Medium => cfg.churn_label.medium,
            ChurnLabel::Low    => cfg.churn_label.low,
        };

        let factors = vec![
            RiskFactor { name: FactorName::HealthScore,         weight: cfg.health.weight_for(health) },
            RiskFactor { name: FactorName::Engagement,          weight: cfg.engagement.weight_for(engagement) },
            RiskFactor { name: FactorName::ChurnLabel,          weight: churn_weight },
            RiskFactor { name: FactorName::DaysSinceEngagement, weight: cfg.inactivity.weight_for(days) },
        ];

        let total = round_score(factors.iter().map(|f| f.weight).sum());
        let composite_score = total.clamp(0.0, 1.0);

        let result = RiskResult {
            composite_score,
            risk_level: RiskLevel::from_score(composite_score, &cfg.risk_levels),
            confidence: Confidence::from_total_weight(total, &cfg.confidence),
            factors,
        };

        log::trace!(
            "score: {} composite={:.3} level={} confidence={:?}",
            record.customer_id,
            result.composite_score,
            result.risk_level,
            result.confidence,
        );

        result
    }
}

/// Clamp into the field's documented range; NaN takes the default.
fn in_domain(value: f64, default: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        default
    } else {
        value.clamp(lo, hi)
    }
}

fn round_score(raw: f64) -> f64 {
    (raw * SCORE_SCALE).round() / SCORE_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_removes_sum_drift() {
        assert_eq!(round_score(0.1 + 0.2), 0.3);
        assert_eq!(round_score(0.1 + 0.1 + 0.2 + 0.05), 0.45);
    }

    #[test]
    fn nan_health_scores_like_the_default() {
        let scorer = RiskScorer::new(&EngineConfig::default()).unwrap();
        let nan = scorer.score(&CustomerRecord::new("a").with_health_score(f64::NAN));
        let dflt = scorer.score(&CustomerRecord::new("a"));
        assert_eq!(nan, dflt);
    }

    #[test]
    fn dominant_factor_prefers_earlier_on_tie() {
        let result = RiskResult {
            composite_score: 0.4,
            risk_level: RiskLevel::Medium,
            confidence: Confidence::Low,
            factors: vec![
                RiskFactor { name: FactorName::HealthScore, weight: 0.2 },
                RiskFactor { name: FactorName::Engagement, weight: 0.0 },
                RiskFactor { name: FactorName::ChurnLabel, weight: 0.2 },
            ],
        };
        assert_eq!(result.dominant_factor().unwrap().name, FactorName::HealthScore);
    }
}
