//! Retention recommendations. Maps a scored customer to a strategy.
//!
//! Selection, in order:
//!   1. Base strategy from the risk level (weightless results always get
//!      General Monitoring).
//!   2. One action aimed at the dominant factor, unless the strategy is
//!      General Monitoring.
//!   3. Segment actions.
//!   4. Priority from the level, escalated one step for high-value customers.

use crate::{
    config::{EngineConfig, PriorityRules},
    error::EngineResult,
    record::{CustomerRecord, Segment},
    scorer::{FactorName, RiskLevel, RiskResult},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const GENERAL_MONITORING: &str = "General Monitoring";

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn from_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low      => Self::Low,
            RiskLevel::Medium   => Self::Medium,
            RiskLevel::High     => Self::High,
            RiskLevel::Critical => Self::Critical,
        }
    }

    /// One step up; Critical saturates.
    pub fn escalate(self) -> Self {
        match self {
            Self::Low      => Self::Medium,
            Self::Medium   => Self::High,
            Self::High     => Self::Critical,
            Self::Critical => Self::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low      => "Low",
            Self::Medium   => "Medium",
            Self::High     => "High",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub strategy_name:      String,
    pub actions:            Vec<String>,
    pub priority:           Priority,
    pub timeline:           String,
    pub expected_outcome:   String,
    pub resources_required: BTreeSet<String>,
    pub success_metrics:    Vec<String>,
    /// Factor the factor-specific action was chosen for.
    pub trigger_factor:     Option<FactorName>,
}

// ── Strategy catalog ─────────────────────────────────────────────────────────

struct Strategy {
    name:      &'static str,
    actions:   &'static [&'static str],
    timeline:  &'static str,
    outcome:   &'static str,
    resources: &'static [&'static str],
    metrics:   &'static [&'static str],
}

fn strategy_for(level: RiskLevel) -> Strategy {
    match level {
        RiskLevel::Critical => Strategy {
            name: "Immediate Intervention",
            actions: &[
                "Immediate executive escalation",
                "Personal retention call within 24 hours",
                "Custom retention offer with significant discount",
                "Assign dedicated customer success manager",
            ],
            timeline: "Immediate (24-48 hours)",
            outcome: "Prevent immediate churn (very low retention probability if untreated)",
            resources: &[
                "Senior Customer Success Manager",
                "Executive sponsor",
                "Retention specialist",
            ],
            metrics: &[
                "Retention rate improvement",
                "Customer satisfaction score",
                "Revenue recovery",
            ],
        },
        RiskLevel::High => Strategy {
            name: "Proactive Outreach",
            actions: &[
                "Schedule retention call within 48 hours",
                "Provide personalized retention offer",
                "Assign dedicated account manager",
                "Monitor engagement metrics daily",
            ],
            timeline: "Urgent (1-2 weeks)",
            outcome: "Low retention probability",
            resources: &["Customer Success Manager", "Retention specialist", "Account manager"],
            metrics: &[
                "Engagement score improvement",
                "Health score increase",
                "Retention probability",
            ],
        },
        RiskLevel::Medium => Strategy {
            name: "Engagement Boost",
            actions: &[
                "Regular check-in calls",
                "Proactive support outreach",
                "Value demonstration sessions",
            ],
            timeline: "Standard (2-4 weeks)",
            outcome: "Moderate retention probability",
            resources: &["Customer Success Manager"],
            metrics: &["Customer satisfaction", "Engagement metrics"],
        },
        RiskLevel::Low => Strategy {
            name: GENERAL_MONITORING,
            actions: &["Regular health check calls", "Monitor usage patterns"],
            timeline: "Ongoing",
            outcome: "High retention probability",
            resources: &["Customer Success Manager"],
            metrics: &["Customer satisfaction"],
        },
    }
}

/// (action, resource) aimed at the factor driving the score.
fn factor_action(factor: FactorName) -> (&'static str, &'static str) {
    match factor {
        FactorName::HealthScore         => ("Schedule health check call", "Customer Success Manager"),
        FactorName::Engagement          => ("Send personalized feature recommendations", "Product team"),
        FactorName::ChurnLabel          => ("Review churn drivers with the account team", "Retention specialist"),
        FactorName::DaysSinceEngagement => ("Launch re-engagement campaign", "Marketing team"),
    }
}

fn segment_actions(segment: Segment) -> (&'static [&'static str], Option<&'static str>) {
    match segment {
        Segment::HighValue | Segment::Enterprise => (
            &["Executive relationship building", "Premium support access"],
            Some("Executive sponsor"),
        ),
        Segment::MediumValue => (
            &["Regular business reviews", "Feature adoption training"],
            Some("Account manager"),
        ),
        Segment::Smb => (&["Self-service resources", "Community engagement"], None),
    }
}

// ── Selector ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecommendationSelector {
    rules: PriorityRules,
}

impl RecommendationSelector {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            rules: config.priority.clone(),
        })
    }

    pub fn select(&self, result: &RiskResult, record: &CustomerRecord) -> Recommendation {
        let level = if result.is_weightless() {
            RiskLevel::Low
        } else {
            result.risk_level
        };
        let strategy = strategy_for(level);

        let mut actions: Vec<String> = strategy.actions.iter().map(|a| a.to_string()).collect();
        let mut resources: BTreeSet<String> =
            strategy.resources.iter().map(|r| r.to_string()).collect();

        let trigger_factor = if level == RiskLevel::Low {
            None
        } else {
            result.dominant_factor().map(|f| f.name)
        };
        if let Some(factor) = trigger_factor {
            let (action, resource) = factor_action(factor);
            actions.push(action.to_string());
            resources.insert(resource.to_string());
        }

        let segment = record.effective_segment();
        let (seg_actions, seg_resource) = segment_actions(segment);
        actions.extend(seg_actions.iter().map(|a| a.to_string()));
        if let Some(r) = seg_resource {
            resources.insert(r.to_string());
        }

        let base = Priority::from_level(level);
        let priority = if self.is_high_value(record) {
            base.escalate()
        } else {
            base
        };

        log::trace!(
            "select: {} strategy='{}' priority={} trigger={:?}",
            record.customer_id,
            strategy.name,
            priority,
            trigger_factor,
        );

        Recommendation {
            strategy_name: strategy.name.to_string(),
            actions,
            priority,
            timeline: strategy.timeline.to_string(),
            expected_outcome: strategy.outcome.to_string(),
            resources_required: resources,
            success_metrics: strategy.metrics.iter().map(|m| m.to_string()).collect(),
            trigger_factor,
        }
    }

    fn is_high_value(&self, record: &CustomerRecord) -> bool {
        record.lifetime_revenue > self.rules.high_value_revenue
            || self.rules.escalating_segments.contains(&record.effective_segment())
    }
}
