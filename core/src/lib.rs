//! aura-core: rule-based churn risk scoring and retention recommendations.
//!
//! `RiskScorer` turns one `CustomerRecord` into a `RiskResult`,
//! `RecommendationSelector` turns that into a `Recommendation`, and
//! `BatchProcessor` runs both over a collection and summarizes. All three
//! are built from one `EngineConfig`; there is no global state.

pub mod batch;
pub mod config;
pub mod error;
pub mod model;
pub mod recommendation;
pub mod record;
pub mod rng;
pub mod sample;
pub mod scorer;
pub mod types;

pub use batch::{BatchOutcome, BatchProcessor, BatchSummary, ScoredCustomer, SkippedRecord};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, RecordError};
pub use model::ChurnModel;
pub use record::{ChurnLabel, CustomerRecord, RawCustomerRecord, Segment};
pub use recommendation::{Priority, Recommendation, RecommendationSelector};
pub use scorer::{Confidence, FactorName, RiskFactor, RiskLevel, RiskResult, RiskScorer};
