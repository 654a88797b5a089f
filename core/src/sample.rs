//! Synthetic customer batches for demos and tests.
//!
//! Same seed, same batch: every draw goes through one `SampleRng`.

use crate::{
    record::{ChurnLabel, CustomerRecord, Segment},
    rng::SampleRng,
};

const SEGMENTS: [Segment; 4] = [
    Segment::Smb,
    Segment::MediumValue,
    Segment::HighValue,
    Segment::Enterprise,
];
const SEGMENT_WEIGHTS: [f64; 4] = [0.45, 0.30, 0.17, 0.08];

const LABELS: [ChurnLabel; 3] = [ChurnLabel::Low, ChurnLabel::Medium, ChurnLabel::High];
const LABEL_WEIGHTS: [f64; 3] = [0.6, 0.3, 0.1];

const PREFIXES: &[&str] = &[
    "Premier", "Summit", "Bright", "Northwind", "Blue", "Atlas", "Harbor",
    "Vertex", "Cedar", "Silver", "Metro", "Pioneer", "Coastal", "Evergreen",
];

const INDUSTRIES: &[&str] = &[
    "Analytics", "Logistics", "Health", "Retail", "Software", "Media",
    "Energy", "Finance", "Foods", "Robotics", "Learning", "Design",
];

const SUFFIXES: &[&str] = &["Inc", "LLC", "Group", "Labs", "Partners", "Co", "Systems"];

pub struct SampleGenerator {
    rng: SampleRng,
}

impl SampleGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SampleRng::new(seed),
        }
    }

    /// `n` records with ids `CUST_0001 ..= CUST_{n}`.
    pub fn generate(&mut self, n: usize) -> Vec<CustomerRecord> {
        (1..=n).map(|i| self.customer(i)).collect()
    }

    fn customer(&mut self, i: usize) -> CustomerRecord {
        let segment = SEGMENTS[self.rng.weighted_index(&SEGMENT_WEIGHTS)];
        let label = LABELS[self.rng.weighted_index(&LABEL_WEIGHTS)];
        let name = self.company_name();

        let health = round_to(self.rng.normal(60.0, 20.0).clamp(0.0, 100.0), 1);
        let engagement = round_to(self.rng.next_f64(), 2);
        let days = self.rng.range_u32(1, 90);

        // Larger segments sit higher on the revenue curve.
        let mu = match segment {
            Segment::Smb         => 8.0,
            Segment::MediumValue => 9.5,
            Segment::HighValue   => 10.5,
            Segment::Enterprise  => 11.5,
        };
        let revenue = round_to(self.rng.log_normal(mu, 1.0), 2);

        CustomerRecord::new(format!("CUST_{i:04}"))
            .with_name(name)
            .with_segment(segment)
            .with_churn_label(label)
            .with_health_score(health)
            .with_engagement_score(engagement)
            .with_days_since_engagement(days)
            .with_lifetime_revenue(revenue)
    }

    fn company_name(&mut self) -> String {
        let p = PREFIXES[self.rng.next_u64_below(PREFIXES.len() as u64) as usize];
        let i = INDUSTRIES[self.rng.next_u64_below(INDUSTRIES.len() as u64) as usize];
        let s = SUFFIXES[self.rng.next_u64_below(SUFFIXES.len() as u64) as usize];
        format!("{p} {i} {s}")
    }
}

fn round_to(v: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (v * scale).round() / scale
}
