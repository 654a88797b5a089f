//! Customer records, the engine's only input.
//!
//! `CustomerRecord` is the typed value every component consumes.
//! `RawCustomerRecord` is the loosely-shaped row an ingestion layer hands
//! over (one CSV line, one JSON object). Coercion from raw to typed happens
//! exactly once, in `CustomerRecord::from_raw`; after that a record is never
//! mutated.

use crate::{error::RecordError, types::CustomerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_HEALTH_SCORE: f64 = 50.0;
pub const DEFAULT_ENGAGEMENT_SCORE: f64 = 0.5;
pub const DEFAULT_DAYS_SINCE_ENGAGEMENT: u32 = 30;
pub const DEFAULT_LIFETIME_REVENUE: f64 = 0.0;

// ── Enumerations ─────────────────────────────────────────────────────────────

/// Churn label produced upstream (by the ML classifier or by hand).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum ChurnLabel {
    Low,
    #[default]
    Medium,
    High,
}

impl ChurnLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl FromStr for ChurnLabel {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(RecordError::InvalidValue {
                field: "churn_risk_label",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ChurnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commercial segment. Ordering is the tie-break order for segment insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Segment {
    #[default]
    #[serde(rename = "SMB")]
    Smb,
    #[serde(rename = "Medium-Value")]
    MediumValue,
    #[serde(rename = "High-Value")]
    HighValue,
    #[serde(rename = "Enterprise")]
    Enterprise,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smb => "SMB",
            Self::MediumValue => "Medium-Value",
            Self::HighValue => "High-Value",
            Self::Enterprise => "Enterprise",
        }
    }
}

impl FromStr for Segment {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        match key.as_str() {
            "smb" => Ok(Self::Smb),
            "medium-value" => Ok(Self::MediumValue),
            "high-value" => Ok(Self::HighValue),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(RecordError::InvalidValue {
                field: "segment",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Typed record ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub customer_id:                CustomerId,
    pub name:                       Option<String>,
    pub health_score:               f64,
    pub engagement_score:           f64,
    pub churn_risk_label:           ChurnLabel,
    pub days_since_last_engagement: u32,
    pub lifetime_revenue:           f64,
    /// `None` when the input row carried no segment.
    pub segment:                    Option<Segment>,
}

impl CustomerRecord {
    /// A record with every optional field at its documented default.
    pub fn new(customer_id: impl Into<CustomerId>) -> Self {
        Self {
            customer_id:                customer_id.into(),
            name:                       None,
            health_score:               DEFAULT_HEALTH_SCORE,
            engagement_score:           DEFAULT_ENGAGEMENT_SCORE,
            churn_risk_label:           ChurnLabel::default(),
            days_since_last_engagement: DEFAULT_DAYS_SINCE_ENGAGEMENT,
            lifetime_revenue:           DEFAULT_LIFETIME_REVENUE,
            segment:                    None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_health_score(mut self, v: f64) -> Self {
        self.health_score = v;
        self
    }

    pub fn with_engagement_score(mut self, v: f64) -> Self {
        self.engagement_score = v;
        self
    }

    pub fn with_churn_label(mut self, label: ChurnLabel) -> Self {
        self.churn_risk_label = label;
        self
    }

    pub fn with_days_since_engagement(mut self, days: u32) -> Self {
        self.days_since_last_engagement = days;
        self
    }

    pub fn with_lifetime_revenue(mut self, v: f64) -> Self {
        self.lifetime_revenue = v;
        self
    }

    pub fn with_segment(mut self, segment: Segment) -> Self {
        self.segment = Some(segment);
        self
    }

    /// Segment used for recommendations; absent means SMB.
    pub fn effective_segment(&self) -> Segment {
        self.segment.unwrap_or_default()
    }

    /// Coerce a raw row. Missing or empty fields take their defaults;
    /// present-but-unparseable fields are an error.
    pub fn from_raw(raw: &RawCustomerRecord) -> Result<Self, RecordError> {
        let customer_id = raw
            .get("customer_id")
            .ok_or(RecordError::MissingCustomerId)?
            .to_string();

        let days = match parse_number(raw, "days_since_last_engagement")? {
            Some(d) => d.clamp(0.0, u32::MAX as f64).floor() as u32,
            None => DEFAULT_DAYS_SINCE_ENGAGEMENT,
        };

        Ok(Self {
            customer_id,
            name: raw.get("name").map(str::to_string),
            health_score: parse_number(raw, "health_score")?.unwrap_or(DEFAULT_HEALTH_SCORE),
            engagement_score: parse_number(raw, "engagement_score")?
                .unwrap_or(DEFAULT_ENGAGEMENT_SCORE),
            churn_risk_label: raw
                .get("churn_risk_label")
                .map(str::parse::<ChurnLabel>)
                .transpose()?
                .unwrap_or_default(),
            days_since_last_engagement: days,
            lifetime_revenue: parse_number(raw, "lifetime_revenue")?
                .unwrap_or(DEFAULT_LIFETIME_REVENUE),
            segment: raw.get("segment").map(str::parse::<Segment>).transpose()?,
        })
    }
}

fn parse_number(raw: &RawCustomerRecord, field: &'static str) -> Result<Option<f64>, RecordError> {
    let Some(text) = raw.get(field) else {
        return Ok(None);
    };
    match text.parse::<f64>() {
        Ok(v) if !v.is_nan() => Ok(Some(v)),
        _ => Err(RecordError::InvalidNumber {
            field,
            value: text.to_string(),
        }),
    }
}

// ── Raw record ───────────────────────────────────────────────────────────────

/// A string-keyed row as it arrives from CSV or JSON.
///
/// Column names are normalized on insert (case, separators, known aliases),
/// so lookups always use canonical names. Empty cells are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawCustomerRecord {
    fields: BTreeMap<String, String>,
}

impl RawCustomerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one cell. A canonical column always wins over an alias of it,
    /// whichever arrives first.
    pub fn insert(&mut self, column: &str, value: impl Into<String>) {
        let value: String = value.into();
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let normalized = normalize_column(column);
        let (canonical, is_alias) = match canonical_column(&normalized) {
            Some(c) => (c.to_string(), true),
            None => (normalized, false),
        };
        if is_alias && self.fields.contains_key(&canonical) {
            return;
        }
        self.fields.insert(canonical, value.to_string());
    }

    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    /// Value of a canonical column, if present and non-empty.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build from a JSON object. Scalars are stringified; `null` is absent.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut raw = Self::new();
        for (column, value) in object {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => raw.insert(column, s.as_str()),
                other => raw.insert(column, other.to_string()),
            }
        }
        raw
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RawCustomerRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = Self::new();
        for (k, v) in iter {
            raw.insert(k.as_ref(), v);
        }
        raw
    }
}

fn normalize_column(column: &str) -> String {
    column
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Canonical name for a known alias; `None` if the column is not an alias.
fn canonical_column(normalized: &str) -> Option<&'static str> {
    Some(match normalized {
        "id" | "customerid"                                  => "customer_id",
        "customer_name"                                      => "name",
        "health" | "current_health_score"                    => "health_score",
        "engagement"                                         => "engagement_score",
        "churn_risk" | "churn_risk_level" | "churn_label"    => "churn_risk_label",
        "days_since_engagement"                              => "days_since_last_engagement",
        "revenue" | "total_lifetime_revenue"                 => "lifetime_revenue",
        "client_segment"                                     => "segment",
        _ => return None,
    })
}
