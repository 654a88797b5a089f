use aura_core::{
    ChurnLabel, Confidence, CustomerRecord, EngineConfig, FactorName, RiskLevel, RiskScorer,
};
use proptest::prelude::*;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn scorer() -> RiskScorer {
    RiskScorer::new(&EngineConfig::default()).unwrap()
}

fn critical_customer() -> CustomerRecord {
    CustomerRecord::new("C1")
        .with_health_score(20.0)
        .with_engagement_score(0.1)
        .with_churn_label(ChurnLabel::High)
        .with_days_since_engagement(90)
}

fn healthy_customer() -> CustomerRecord {
    CustomerRecord::new("C2")
        .with_health_score(90.0)
        .with_engagement_score(0.95)
        .with_churn_label(ChurnLabel::Low)
        .with_days_since_engagement(5)
}

fn label_strategy() -> impl Strategy<Value = ChurnLabel> {
    prop_oneof![
        Just(ChurnLabel::Low),
        Just(ChurnLabel::Medium),
        Just(ChurnLabel::High),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Every factor at its riskiest band: the composite caps at 1.0.
#[test]
fn worst_case_customer_is_critical() {
    let result = scorer().score(&critical_customer());

    assert!(result.composite_score >= 0.7, "score={}", result.composite_score);
    assert_eq!(result.composite_score, 1.0);
    assert_eq!(result.risk_level, RiskLevel::Critical);
    assert_eq!(result.confidence, Confidence::High);
    assert_eq!(result.factor(FactorName::HealthScore), Some(0.3));
    assert_eq!(result.factor(FactorName::Engagement), Some(0.2));
    assert_eq!(result.factor(FactorName::ChurnLabel), Some(0.4));
    assert_eq!(result.factor(FactorName::DaysSinceEngagement), Some(0.1));
    assert_eq!(
        result.dominant_factor().map(|f| f.name),
        Some(FactorName::ChurnLabel)
    );
}

#[test]
fn healthy_customer_scores_zero() {
    let result = scorer().score(&healthy_customer());

    assert_eq!(result.composite_score, 0.0);
    assert_eq!(result.risk_level, RiskLevel::Low);
    assert_eq!(result.confidence, Confidence::Low);
    assert!(result.is_weightless());
    assert!(result.dominant_factor().is_none());
}

/// All defaults: health 50 (+0.1), engagement 0.5 (+0.1), Medium (+0.2),
/// and 30 days lands in the `>= 30` inactivity band (+0.05).
#[test]
fn default_record_scores_medium() {
    let result = scorer().score(&CustomerRecord::new("C3"));

    assert_eq!(result.composite_score, 0.45);
    assert_eq!(result.risk_level, RiskLevel::Medium);
    assert_eq!(result.factor(FactorName::DaysSinceEngagement), Some(0.05));
}

#[test]
fn factors_are_reported_in_evaluation_order() {
    let result = scorer().score(&CustomerRecord::new("x"));
    let names: Vec<FactorName> = result.factors.iter().map(|f| f.name).collect();
    assert_eq!(
        names,
        vec![
            FactorName::HealthScore,
            FactorName::Engagement,
            FactorName::ChurnLabel,
            FactorName::DaysSinceEngagement,
        ]
    );
}

/// Band edges: each boundary belongs to the safer band.
#[test]
fn band_boundaries_are_exclusive_on_the_risky_side() {
    let s = scorer();
    let health = |h: f64| {
        s.score(&CustomerRecord::new("b").with_health_score(h))
            .factor(FactorName::HealthScore)
    };
    assert_eq!(health(29.9), Some(0.3));
    assert_eq!(health(30.0), Some(0.2));
    assert_eq!(health(50.0), Some(0.1));
    assert_eq!(health(70.0), Some(0.0));

    let days = |d: u32| {
        s.score(&CustomerRecord::new("b").with_days_since_engagement(d))
            .factor(FactorName::DaysSinceEngagement)
    };
    assert_eq!(days(29), Some(0.0));
    assert_eq!(days(30), Some(0.05));
    assert_eq!(days(59), Some(0.05));
    assert_eq!(days(60), Some(0.1));
}

/// Risk level thresholds are inclusive lower bounds.
#[test]
fn risk_level_thresholds_are_inclusive() {
    let t = EngineConfig::default().risk_levels;
    assert_eq!(RiskLevel::from_score(0.299999, &t), RiskLevel::Low);
    assert_eq!(RiskLevel::from_score(0.3, &t), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_score(0.5, &t), RiskLevel::High);
    assert_eq!(RiskLevel::from_score(0.7, &t), RiskLevel::Critical);
}

/// Out-of-range numbers are clamped into their domain before scoring.
#[test]
fn extreme_inputs_stay_in_bounds() {
    let s = scorer();
    let low = s.score(
        &CustomerRecord::new("lo")
            .with_health_score(-1000.0)
            .with_engagement_score(-1e9),
    );
    let high = s.score(
        &CustomerRecord::new("hi")
            .with_health_score(1e9)
            .with_engagement_score(1e9),
    );

    assert_eq!(low.factor(FactorName::HealthScore), Some(0.3));
    assert_eq!(low.factor(FactorName::Engagement), Some(0.2));
    assert_eq!(high.factor(FactorName::HealthScore), Some(0.0));
    assert_eq!(high.factor(FactorName::Engagement), Some(0.0));
    for r in [&low, &high] {
        assert!((0.0..=1.0).contains(&r.composite_score));
    }
}

#[test]
fn strict_table_scores_harder() {
    let strict = RiskScorer::new(&EngineConfig::strict()).unwrap();
    let record = CustomerRecord::new("s").with_health_score(20.0);

    let standard = scorer().score(&record);
    let harsh = strict.score(&record);

    assert_eq!(harsh.factor(FactorName::HealthScore), Some(0.4));
    assert!(harsh.composite_score > standard.composite_score);
}

#[test]
fn scoring_is_repeatable() {
    let s = scorer();
    let record = critical_customer().with_health_score(41.3);
    assert_eq!(s.score(&record), s.score(&record));
}

proptest! {
    /// Composite score always lies in [0, 1] and the level always matches it.
    #[test]
    fn composite_in_unit_interval(
        health in -1e6f64..1e6,
        engagement in -10f64..10.0,
        days in 0u32..10_000,
        label in label_strategy(),
    ) {
        let config = EngineConfig::default();
        let result = RiskScorer::new(&config).unwrap().score(
            &CustomerRecord::new("p")
                .with_health_score(health)
                .with_engagement_score(engagement)
                .with_days_since_engagement(days)
                .with_churn_label(label),
        );
        prop_assert!((0.0..=1.0).contains(&result.composite_score));
        prop_assert_eq!(
            result.risk_level,
            RiskLevel::from_score(result.composite_score, &config.risk_levels)
        );
    }

    /// Worsening health alone never lowers the score.
    #[test]
    fn lower_health_never_scores_lower(
        a in 0f64..=100.0,
        b in 0f64..=100.0,
        engagement in 0f64..=1.0,
        days in 0u32..200,
    ) {
        let s = scorer();
        let base = CustomerRecord::new("m")
            .with_engagement_score(engagement)
            .with_days_since_engagement(days);
        let (worse, better) = if a <= b { (a, b) } else { (b, a) };
        let worse_score = s.score(&base.clone().with_health_score(worse)).composite_score;
        let better_score = s.score(&base.with_health_score(better)).composite_score;
        prop_assert!(worse_score >= better_score, "{worse} -> {worse_score}, {better} -> {better_score}");
    }

    /// Lower engagement alone never lowers the score.
    #[test]
    fn lower_engagement_never_scores_lower(
        a in 0f64..=1.0,
        b in 0f64..=1.0,
        health in 0f64..=100.0,
        days in 0u32..200,
    ) {
        let s = scorer();
        let base = CustomerRecord::new("e")
            .with_health_score(health)
            .with_days_since_engagement(days);
        let (worse, better) = if a <= b { (a, b) } else { (b, a) };
        let worse_score = s.score(&base.clone().with_engagement_score(worse)).composite_score;
        let better_score = s.score(&base.with_engagement_score(better)).composite_score;
        prop_assert!(worse_score >= better_score, "{worse} -> {worse_score}, {better} -> {better_score}");
    }

    /// More days since last engagement never lowers the score.
    #[test]
    fn longer_inactivity_never_scores_lower(a in 0u32..500, b in 0u32..500) {
        let s = scorer();
        let (fewer, more) = if a <= b { (a, b) } else { (b, a) };
        let fewer_score = s.score(&CustomerRecord::new("d").with_days_since_engagement(fewer)).composite_score;
        let more_score = s.score(&CustomerRecord::new("d").with_days_since_engagement(more)).composite_score;
        prop_assert!(more_score >= fewer_score);
    }
}
