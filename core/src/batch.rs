//! Batch processing: score and recommend across a collection, then
//! summarize.
//!
//! RULES:
//!   - Records are processed independently, in input order.
//!   - A row that cannot be coerced, or whose `customer_id` is empty or
//!     already seen in this batch, is skipped and logged; it never aborts
//!     the batch.
//!   - Output depends only on input and config: ordered maps, no clock,
//!     no randomness.

use crate::{
    config::{ChurnCutoffs, EngineConfig, InsightRules},
    error::{EngineResult, RecordError},
    model::{label_from_model, ChurnModel},
    record::{CustomerRecord, RawCustomerRecord, Segment},
    recommendation::{Priority, Recommendation, RecommendationSelector},
    scorer::{RiskLevel, RiskResult, RiskScorer},
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const NO_DATA_INSIGHT: &str = "No data to summarize.";

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCustomer {
    pub record:         CustomerRecord,
    pub risk:           RiskResult,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    /// Position in the input sequence.
    pub index:       usize,
    pub customer_id: Option<String>,
    pub reason:      String,
    #[serde(skip)]
    pub error:       RecordError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SegmentStats {
    pub count:       usize,
    pub total_score: f64,
}

impl SegmentStats {
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_score / self.count as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Every input record, skipped ones included.
    pub total_count:             usize,
    pub scored_count:            usize,
    pub skipped_count:           usize,
    pub risk_level_counts:       BTreeMap<RiskLevel, usize>,
    pub priority_counts:         BTreeMap<Priority, usize>,
    /// Mean over scored records; 0.0 when none were scored.
    pub average_composite_score: f64,
    /// Only records that carried a segment.
    pub segment_risk:            BTreeMap<Segment, SegmentStats>,
    pub insights:                Vec<String>,
}

impl BatchSummary {
    pub fn level_count(&self, level: RiskLevel) -> usize {
        self.risk_level_counts.get(&level).copied().unwrap_or(0)
    }

    pub fn priority_count(&self, priority: Priority) -> usize {
        self.priority_counts.get(&priority).copied().unwrap_or(0)
    }

    /// Customers at High or Critical risk.
    pub fn urgent_count(&self) -> usize {
        self.level_count(RiskLevel::High) + self.level_count(RiskLevel::Critical)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    /// Scored records, in input order.
    pub results: Vec<ScoredCustomer>,
    pub skipped: Vec<SkippedRecord>,
    pub summary: BatchSummary,
}

// ── Processor ────────────────────────────────────────────────────────────────

pub struct BatchProcessor {
    scorer:   RiskScorer,
    selector: RecommendationSelector,
    insights: InsightRules,
    cutoffs:  ChurnCutoffs,
    model:    Option<Box<dyn ChurnModel>>,
}

impl BatchProcessor {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        Ok(Self {
            scorer:   RiskScorer::new(config)?,
            selector: RecommendationSelector::new(config)?,
            insights: config.insights,
            cutoffs:  config.churn_cutoffs,
            model:    None,
        })
    }

    /// Label rows that arrive without a churn label from `model`.
    pub fn with_churn_model(mut self, model: Box<dyn ChurnModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    pub fn selector(&self) -> &RecommendationSelector {
        &self.selector
    }

    /// Score and recommend for a single record.
    pub fn evaluate(&self, record: CustomerRecord) -> ScoredCustomer {
        let risk = self.scorer.score(&record);
        let recommendation = self.selector.select(&risk, &record);
        ScoredCustomer {
            record,
            risk,
            recommendation,
        }
    }

    /// Coerce one raw row, labelling it from the model when it has no
    /// churn label of its own.
    pub fn ingest(&self, raw: &RawCustomerRecord) -> Result<CustomerRecord, RecordError> {
        let record = CustomerRecord::from_raw(raw)?;
        match &self.model {
            Some(model) if !raw.contains("churn_risk_label") => {
                Ok(label_from_model(record, model.as_ref(), &self.cutoffs))
            }
            _ => Ok(record),
        }
    }

    /// Score typed records. Records with an empty or repeated
    /// `customer_id` are skipped.
    pub fn process(&self, records: &[CustomerRecord]) -> BatchOutcome {
        log::debug!("batch: processing {} typed records", records.len());
        let mut seen = BTreeSet::new();
        let mut results = Vec::new();
        let mut skipped = Vec::new();

        for (index, record) in records.iter().enumerate() {
            match admit(&mut seen, record.clone()) {
                Ok(record) => results.push(self.evaluate(record)),
                Err(error) => {
                    let customer_id = Some(record.customer_id.clone()).filter(|id| !id.is_empty());
                    skipped.push(skip(index, customer_id, error));
                }
            }
        }

        self.finish(results, skipped)
    }

    pub fn process_raw<I>(&self, rows: I) -> BatchOutcome
    where
        I: IntoIterator<Item = RawCustomerRecord>,
    {
        let mut seen = BTreeSet::new();
        let mut results = Vec::new();
        let mut skipped = Vec::new();

        for (index, raw) in rows.into_iter().enumerate() {
            match self.ingest(&raw).and_then(|record| admit(&mut seen, record)) {
                Ok(record) => results.push(self.evaluate(record)),
                Err(error) => {
                    let customer_id = raw.get("customer_id").map(str::to_string);
                    skipped.push(skip(index, customer_id, error));
                }
            }
        }

        self.finish(results, skipped)
    }

    /// Combine summaries of two disjoint batches. Counts add, the mean is
    /// recombined by weight, insights are regenerated.
    pub fn merge(&self, a: &BatchSummary, b: &BatchSummary) -> BatchSummary {
        let scored_count = a.scored_count + b.scored_count;
        let average_composite_score = if scored_count == 0 {
            0.0
        } else {
            (a.average_composite_score * a.scored_count as f64
                + b.average_composite_score * b.scored_count as f64)
                / scored_count as f64
        };

        let mut risk_level_counts = a.risk_level_counts.clone();
        for (level, n) in &b.risk_level_counts {
            *risk_level_counts.entry(*level).or_insert(0) += n;
        }

        let mut priority_counts = a.priority_counts.clone();
        for (priority, n) in &b.priority_counts {
            *priority_counts.entry(*priority).or_insert(0) += n;
        }

        let mut segment_risk = a.segment_risk.clone();
        for (segment, stats) in &b.segment_risk {
            let entry = segment_risk.entry(*segment).or_default();
            entry.count += stats.count;
            entry.total_score += stats.total_score;
        }

        let mut summary = BatchSummary {
            total_count: a.total_count + b.total_count,
            scored_count,
            skipped_count: a.skipped_count + b.skipped_count,
            risk_level_counts,
            priority_counts,
            average_composite_score,
            segment_risk,
            insights: Vec::new(),
        };
        summary.insights = self.generate_insights(&summary);
        summary
    }

    fn finish(&self, results: Vec<ScoredCustomer>, skipped: Vec<SkippedRecord>) -> BatchOutcome {
        let summary = self.summarize(&results, skipped.len());

        log::info!(
            "batch: total={} scored={} skipped={} urgent={} avg_score={:.3}",
            summary.total_count,
            summary.scored_count,
            summary.skipped_count,
            summary.urgent_count(),
            summary.average_composite_score,
        );

        BatchOutcome {
            results,
            skipped,
            summary,
        }
    }

    fn summarize(&self, results: &[ScoredCustomer], skipped_count: usize) -> BatchSummary {
        let mut risk_level_counts = BTreeMap::new();
        let mut priority_counts = BTreeMap::new();
        let mut segment_risk: BTreeMap<Segment, SegmentStats> = BTreeMap::new();
        let mut score_total = 0.0;

        for scored in results {
            let score = scored.risk.composite_score;
            score_total += score;
            *risk_level_counts.entry(scored.risk.risk_level).or_insert(0) += 1;
            *priority_counts.entry(scored.recommendation.priority).or_insert(0) += 1;
            if let Some(segment) = scored.record.segment {
                let stats = segment_risk.entry(segment).or_default();
                stats.count += 1;
                stats.total_score += score;
            }
        }

        let scored_count = results.len();
        let mut summary = BatchSummary {
            total_count: scored_count + skipped_count,
            scored_count,
            skipped_count,
            risk_level_counts,
            priority_counts,
            average_composite_score: if scored_count == 0 {
                0.0
            } else {
                score_total / scored_count as f64
            },
            segment_risk,
            insights: Vec::new(),
        };
        summary.insights = self.generate_insights(&summary);
        summary
    }

    fn generate_insights(&self, summary: &BatchSummary) -> Vec<String> {
        let mut insights = Vec::new();

        if summary.scored_count == 0 {
            insights.push(NO_DATA_INSIGHT.to_string());
        } else {
            let urgent = summary.urgent_count();
            if urgent > 0 {
                insights.push(format!("{urgent} customers require immediate attention"));
            }

            let avg = summary.average_composite_score;
            if avg > self.insights.concerning_average {
                insights.push(
                    "Overall customer health is concerning - consider proactive retention strategies"
                        .to_string(),
                );
            } else if avg < self.insights.healthy_average {
                insights.push(
                    "Customer health is generally good - focus on growth and expansion".to_string(),
                );
            }

            let critical = summary.priority_count(Priority::Critical);
            if critical > 0 {
                insights.push(format!("{critical} customers need critical priority intervention"));
            }

            // Strictly greater keeps the earliest segment on ties.
            let riskiest = summary
                .segment_risk
                .iter()
                .filter(|(_, s)| s.count > 0)
                .fold(None, |best: Option<(Segment, f64)>, (seg, s)| match best {
                    Some((_, m)) if m >= s.mean() => best,
                    _ => Some((*seg, s.mean())),
                });
            if let Some((segment, mean)) = riskiest {
                insights.push(format!("Highest risk segment: {segment} (avg risk: {mean:.2})"));
            }
        }

        if summary.skipped_count > 0 {
            insights.push(format!("{} records skipped", summary.skipped_count));
        }

        insights
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// A `customer_id` must be non-empty and unique within one batch.
fn admit(seen: &mut BTreeSet<String>, record: CustomerRecord) -> Result<CustomerRecord, RecordError> {
    if record.customer_id.trim().is_empty() {
        return Err(RecordError::MissingCustomerId);
    }
    if !seen.insert(record.customer_id.clone()) {
        return Err(RecordError::DuplicateCustomerId {
            id: record.customer_id,
        });
    }
    Ok(record)
}

fn skip(index: usize, customer_id: Option<String>, error: RecordError) -> SkippedRecord {
    log::warn!(
        "batch: skipping row {index} ({}): {error}",
        customer_id.as_deref().unwrap_or("<no id>"),
    );
    SkippedRecord {
        index,
        customer_id,
        reason: error.to_string(),
        error,
    }
}
