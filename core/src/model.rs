//! Churn classifier seam.
//!
//! The trained classifier lives outside this crate. The engine only needs a
//! probability per record, which it turns into a `ChurnLabel` for rows
//! that arrived without one. Labelling happens at ingestion, before
//! scoring; the scorer never calls a model.

use crate::{
    config::ChurnCutoffs,
    record::{ChurnLabel, CustomerRecord},
};

/// Anything that can estimate the probability a customer churns.
pub trait ChurnModel: Send + Sync {
    /// Stable name for logs.
    fn name(&self) -> &str {
        "churn-model"
    }

    /// Churn probability in [0, 1]. Values outside are clamped by the caller.
    fn predict(&self, record: &CustomerRecord) -> f64;
}

impl<F> ChurnModel for F
where
    F: Fn(&CustomerRecord) -> f64 + Send + Sync,
{
    fn predict(&self, record: &CustomerRecord) -> f64 {
        self(record)
    }
}

impl ChurnCutoffs {
    /// `< medium` → Low, `< high` → Medium, otherwise High.
    pub fn label_for(&self, probability: f64) -> ChurnLabel {
        let p = probability.clamp(0.0, 1.0);
        if p < self.medium {
            ChurnLabel::Low
        } else if p < self.high {
            ChurnLabel::Medium
        } else {
            ChurnLabel::High
        }
    }
}

/// Returns the record relabelled from the model's prediction. A NaN
/// prediction leaves the record unchanged.
pub fn label_from_model(
    record: CustomerRecord,
    model: &dyn ChurnModel,
    cutoffs: &ChurnCutoffs,
) -> CustomerRecord {
    let p = model.predict(&record);
    if p.is_nan() {
        log::warn!(
            "model '{}' returned NaN for {}; keeping label {}",
            model.name(),
            record.customer_id,
            record.churn_risk_label,
        );
        return record;
    }
    let label = cutoffs.label_for(p);
    log::debug!(
        "model '{}': {} p={p:.3} → {label}",
        model.name(),
        record.customer_id,
    );
    record.with_churn_label(label)
}
