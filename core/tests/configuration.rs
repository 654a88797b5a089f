use aura_core::{
    config::{Band, BandTable},
    BatchProcessor, CustomerRecord, EngineConfig, EngineError, RecommendationSelector,
    RiskLevel, RiskScorer, Segment,
};

const STANDARD_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/engine_config.json");
const STRICT_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/strict_engine_config.json");

// ── Helpers ──────────────────────────────────────────────────────────────────

fn assert_config_error(config: &EngineConfig, needle: &str) {
    match RiskScorer::new(config) {
        Err(EngineError::Configuration { reason }) => assert!(
            reason.contains(needle),
            "expected '{needle}' in '{reason}'"
        ),
        Err(other) => panic!("expected a configuration error, got {other}"),
        Ok(_) => panic!("expected '{needle}' to be rejected"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn shipped_config_files_match_builtin_tables() {
    assert_eq!(EngineConfig::load(STANDARD_CONFIG).unwrap(), EngineConfig::default());
    assert_eq!(EngineConfig::load(STRICT_CONFIG).unwrap(), EngineConfig::strict());
}

#[test]
fn missing_config_file_is_an_error() {
    let err = EngineConfig::load("/definitely/not/here.json").unwrap_err();
    assert!(
        matches!(&err, EngineError::Io { path, .. } if path == "/definitely/not/here.json"),
        "expected an I/O error, got {err:?}"
    );
    assert!(err.to_string().starts_with("Cannot read /definitely/not/here.json"), "{err}");
}

#[test]
fn overlapping_bands_are_rejected() {
    let mut config = EngineConfig::default();
    config.health = BandTable::below(&[(50.0, 0.3), (30.0, 0.2)], 0.0);
    assert_config_error(&config, "out of order");
}

#[test]
fn rising_weights_are_rejected() {
    let mut config = EngineConfig::default();
    config.engagement = BandTable::below(&[(0.3, 0.1), (0.7, 0.2)], 0.0);
    assert_config_error(&config, "weight rises");
}

#[test]
fn oversized_weight_is_rejected() {
    let mut config = EngineConfig::default();
    config.churn_label.high = 0.9;
    assert_config_error(&config, "churn_label");
}

#[test]
fn empty_band_table_is_rejected() {
    let mut config = EngineConfig::default();
    config.inactivity.bands.clear();
    assert_config_error(&config, "no bands");
}

#[test]
fn non_finite_bound_is_rejected() {
    let mut config = EngineConfig::default();
    config.health.bands[0] = Band { bound: f64::NAN, weight: 0.3 };
    assert_config_error(&config, "non-finite");
}

#[test]
fn unordered_risk_levels_are_rejected() {
    let mut config = EngineConfig::default();
    config.risk_levels.high = 0.8;
    assert_config_error(&config, "risk_levels");
}

/// Every component refuses a bad table, not only the scorer.
#[test]
fn selector_and_processor_validate_too() {
    let mut config = EngineConfig::default();
    config.priority.high_value_revenue = -1.0;

    assert!(RecommendationSelector::new(&config).is_err());
    assert!(BatchProcessor::new(&config).is_err());
}

#[test]
fn custom_priority_rules_apply() {
    let mut config = EngineConfig::default();
    config.priority.high_value_revenue = 1_000.0;
    config.priority.escalating_segments = vec![Segment::MediumValue];

    let scorer = RiskScorer::new(&config).unwrap();
    let selector = RecommendationSelector::new(&config).unwrap();

    let mv = CustomerRecord::new("mv").with_segment(Segment::MediumValue);
    let rec = selector.select(&scorer.score(&mv), &mv);
    assert_eq!(rec.priority.as_str(), "High");

    let ent = CustomerRecord::new("ent").with_segment(Segment::Enterprise);
    let rec = selector.select(&scorer.score(&ent), &ent);
    assert_eq!(rec.priority.as_str(), "Medium");
}

#[test]
fn strict_thresholds_shift_levels() {
    let record = CustomerRecord::new("s");
    let standard = RiskScorer::new(&EngineConfig::default()).unwrap().score(&record);
    let strict = RiskScorer::new(&EngineConfig::strict()).unwrap().score(&record);

    // Health 50 weighs 0.2 under the strict table, so the default record moves up.
    assert_eq!(standard.risk_level, RiskLevel::Medium);
    assert_eq!(strict.composite_score, 0.55);
    assert_eq!(strict.risk_level, RiskLevel::Medium);
}

#[test]
fn config_round_trips_through_json() {
    let json = serde_json::to_string(&EngineConfig::strict()).unwrap();
    let back: EngineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, EngineConfig::strict());
}
