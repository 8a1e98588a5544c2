// 🎯 Risk, Confidence & Deal Scoring
// Risk is the unweighted average of four capped sub-scores (age, hours,
// region, market/capacity). Confidence starts at a baseline and takes a
// fixed penalty for every missing or unusual input signal; it also sets
// the width of the reported value range. The deal grade maps the
// confidence-vs-risk composite onto a letter scale.

use crate::base_value::BaseValue;
use crate::config::{ConfidenceConfig, DealConfig, RiskConfig};
use crate::spec::{EquipmentClass, EquipmentSpecification};
use serde::Serialize;

// ============================================================================
// RISK
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Medium => "medium",
            RiskBand::High => "high",
        }
    }
}

/// Composite risk score (0-100, higher = riskier) with its sub-scores
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub overall: f64,
    pub band: RiskBand,
    pub age_risk: f64,
    pub hours_risk: f64,
    pub regional_risk: f64,
    pub market_risk: f64,
}

pub fn assess_risk(
    spec: &EquipmentSpecification,
    base: &BaseValue,
    config: &RiskConfig,
    current_year: i32,
) -> RiskAssessment {
    let age = spec.age_years(current_year) as f64;
    let age_risk = (age * config.age_points_per_year).min(config.age_cap);

    let hours_risk =
        (spec.hours as f64 / 10_000.0 * config.hours_points_per_10k).min(config.hours_cap);

    let regional_risk = config
        .regional_risk
        .get(&spec.region)
        .copied()
        .unwrap_or(config.baseline_score);

    // Extreme capacities trade in a thin market; niche classes and unknown
    // manufacturers sit between that and the broad-market baseline
    let market_risk = if spec.capacity_tons > config.specialized_capacity_tons {
        config.specialized_score
    } else if is_niche_class(spec.class) || !base.known_manufacturer {
        config.niche_score
    } else {
        config.baseline_score
    };

    let overall = (age_risk + hours_risk + regional_risk + market_risk) / 4.0;

    let band = if overall < config.medium_band {
        RiskBand::Low
    } else if overall <= config.high_band {
        RiskBand::Medium
    } else {
        RiskBand::High
    };

    RiskAssessment {
        overall,
        band,
        age_risk,
        hours_risk,
        regional_risk,
        market_risk,
    }
}

fn is_niche_class(class: EquipmentClass) -> bool {
    matches!(
        class,
        EquipmentClass::Tower | EquipmentClass::TelescopicCrawler | EquipmentClass::Other
    )
}

// ============================================================================
// CONFIDENCE
// ============================================================================

/// Input signals the confidence estimator reacts to
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceSignals {
    pub known_manufacturer: bool,
    pub known_model: bool,
    pub condition_supplied: bool,
    pub typical_capacity: bool,
    pub calibrated_rental: bool,
    pub has_comparables: bool,
}

/// Confidence score plus the penalties that shaped it
#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceEstimate {
    /// 0-1, clamped to [floor, ceiling]
    pub score: f64,
    pub reasons: Vec<String>,
}

pub fn estimate_confidence(
    signals: ConfidenceSignals,
    config: &ConfidenceConfig,
) -> ConfidenceEstimate {
    let mut score = config.baseline;
    let mut reasons = Vec::new();

    fn penalize(score: &mut f64, reasons: &mut Vec<String>, amount: f64, reason: &str) {
        *score -= amount;
        reasons.push(format!("{} (-{:.0}%)", reason, amount * 100.0));
    }

    if !signals.known_manufacturer {
        penalize(
            &mut score,
            &mut reasons,
            config.unknown_manufacturer_penalty,
            "manufacturer not in premium table",
        );
    }
    if !signals.known_model {
        penalize(
            &mut score,
            &mut reasons,
            config.unknown_model_penalty,
            "model not in premium table",
        );
    }
    if !signals.condition_supplied {
        penalize(
            &mut score,
            &mut reasons,
            config.missing_condition_penalty,
            "no condition descriptor supplied",
        );
    }
    if !signals.typical_capacity {
        penalize(
            &mut score,
            &mut reasons,
            config.atypical_capacity_penalty,
            "capacity atypical for class",
        );
    }
    if !signals.calibrated_rental {
        penalize(
            &mut score,
            &mut reasons,
            config.uncalibrated_rental_penalty,
            "no calibrated rental data",
        );
    }
    if !signals.has_comparables {
        penalize(
            &mut score,
            &mut reasons,
            config.no_comparables_penalty,
            "no comparable sales found",
        );
    }

    ConfidenceEstimate {
        score: score.clamp(config.floor, config.ceiling),
        reasons,
    }
}

/// Whether the capacity sits inside the typical range for the class
pub fn is_typical_capacity(
    class: EquipmentClass,
    capacity_tons: f64,
    config: &ConfidenceConfig,
) -> bool {
    match config.typical_capacity.get(&class) {
        Some(range) => capacity_tons >= range.low && capacity_tons <= range.high,
        None => true,
    }
}

/// range = point_estimate * (1 ± (1 - confidence) * k)
pub fn value_range(point_estimate: f64, confidence: f64, config: &ConfidenceConfig) -> (f64, f64) {
    let half_width = point_estimate * (1.0 - confidence) * config.range_width_factor;
    ((point_estimate - half_width).max(0.0), point_estimate + half_width)
}

// ============================================================================
// DEAL GRADE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DealGrade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
}

impl DealGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealGrade::APlus => "A+",
            DealGrade::A => "A",
            DealGrade::BPlus => "B+",
            DealGrade::B => "B",
            DealGrade::C => "C",
        }
    }
}

/// High confidence + low risk grades toward A+; low confidence + high risk
/// toward C. The composite is confidence (as 0-100) minus risk.
pub fn deal_grade(confidence: f64, risk: f64, config: &DealConfig) -> DealGrade {
    let composite = confidence * 100.0 - risk;

    if composite >= config.a_plus {
        DealGrade::APlus
    } else if composite >= config.a {
        DealGrade::A
    } else if composite >= config.b_plus {
        DealGrade::BPlus
    } else if composite >= config.b {
        DealGrade::B
    } else {
        DealGrade::C
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{Condition, JibConfiguration, Region, RentalMode};

    const YEAR: i32 = 2026;

    fn create_test_spec() -> EquipmentSpecification {
        EquipmentSpecification {
            manufacturer: "Liebherr".to_string(),
            model: "LR 1100".to_string(),
            class: EquipmentClass::Crawler,
            capacity_tons: 100.0,
            boom_length: 40.0,
            jib: JibConfiguration::None,
            jib_length: None,
            year: 2018,
            hours: 5000,
            condition: Some(Condition::Good),
            region: Region::NorthAmerica,
            rental_mode: RentalMode::Bare,
        }
    }

    fn known_base() -> BaseValue {
        BaseValue {
            value: 850_000.0,
            per_ton_rate: 8_500.0,
            manufacturer_premium: 1.15,
            model_premium: 1.0,
            known_manufacturer: true,
            known_model: true,
        }
    }

    fn all_good_signals() -> ConfidenceSignals {
        ConfidenceSignals {
            known_manufacturer: true,
            known_model: true,
            condition_supplied: true,
            typical_capacity: true,
            calibrated_rental: true,
            has_comparables: true,
        }
    }

    #[test]
    fn test_risk_sub_scores_capped() {
        let config = RiskConfig::default();
        let mut spec = create_test_spec();
        spec.year = 1955; // 71 years old
        spec.hours = 90_000;

        let risk = assess_risk(&spec, &known_base(), &config, YEAR);

        assert_eq!(risk.age_risk, config.age_cap);
        assert_eq!(risk.hours_risk, config.hours_cap);
        assert!(risk.overall <= 100.0);
    }

    #[test]
    fn test_risk_age_and_hours_formulas() {
        let config = RiskConfig::default();
        let spec = create_test_spec(); // 8 years, 5000 hours

        let risk = assess_risk(&spec, &known_base(), &config, YEAR);

        assert!((risk.age_risk - 24.0).abs() < 1e-9); // 8 * 3
        assert!((risk.hours_risk - 15.0).abs() < 1e-9); // 0.5 * 30
        assert_eq!(risk.regional_risk, 15.0);
        assert_eq!(risk.market_risk, config.baseline_score);

        let expected = (24.0 + 15.0 + 15.0 + config.baseline_score) / 4.0;
        assert!((risk.overall - expected).abs() < 1e-9);
    }

    #[test]
    fn test_market_risk_specialized_capacity() {
        let config = RiskConfig::default();
        let mut spec = create_test_spec();
        spec.capacity_tons = 750.0;

        let risk = assess_risk(&spec, &known_base(), &config, YEAR);
        assert_eq!(risk.market_risk, config.specialized_score);
    }

    #[test]
    fn test_market_risk_niche_class_and_unknown_manufacturer() {
        let config = RiskConfig::default();

        let mut spec = create_test_spec();
        spec.class = EquipmentClass::Tower;
        let risk = assess_risk(&spec, &known_base(), &config, YEAR);
        assert_eq!(risk.market_risk, config.niche_score);

        let spec = create_test_spec();
        let mut base = known_base();
        base.known_manufacturer = false;
        let risk = assess_risk(&spec, &base, &config, YEAR);
        assert_eq!(risk.market_risk, config.niche_score);
    }

    #[test]
    fn test_risk_bands() {
        let config = RiskConfig::default();

        // Young, low-hours machine in a low-risk region
        let mut spec = create_test_spec();
        spec.year = YEAR;
        spec.hours = 100;
        let low = assess_risk(&spec, &known_base(), &config, YEAR);
        assert_eq!(low.band, RiskBand::Low);

        // Old, worn machine in the highest-risk region
        let mut spec = create_test_spec();
        spec.year = 1990;
        spec.hours = 40_000;
        spec.region = Region::Africa;
        spec.capacity_tons = 900.0;
        let high = assess_risk(&spec, &known_base(), &config, YEAR);
        assert_eq!(high.band, RiskBand::High);
    }

    #[test]
    fn test_confidence_no_penalties_hits_baseline() {
        let config = ConfidenceConfig::default();
        let estimate = estimate_confidence(all_good_signals(), &config);

        assert_eq!(estimate.score, config.baseline);
        assert!(estimate.reasons.is_empty());
    }

    #[test]
    fn test_confidence_takes_every_penalty() {
        let config = ConfidenceConfig::default();
        let signals = ConfidenceSignals {
            known_manufacturer: false,
            known_model: false,
            condition_supplied: false,
            typical_capacity: false,
            calibrated_rental: false,
            has_comparables: false,
        };

        let estimate = estimate_confidence(signals, &config);

        // 0.90 minus all 0.28 of penalties
        assert!((estimate.score - 0.62).abs() < 1e-9);
        assert_eq!(estimate.reasons.len(), 6);

        // Same signals against a higher floor get clamped to it
        let strict = ConfidenceConfig {
            floor: 0.70,
            ..ConfidenceConfig::default()
        };
        let clamped = estimate_confidence(signals, &strict);
        assert_eq!(clamped.score, 0.70);
    }

    #[test]
    fn test_confidence_always_within_bounds() {
        let config = ConfidenceConfig::default();

        for known in [true, false] {
            for calibrated in [true, false] {
                let mut signals = all_good_signals();
                signals.known_manufacturer = known;
                signals.calibrated_rental = calibrated;

                let estimate = estimate_confidence(signals, &config);
                assert!(estimate.score >= config.floor);
                assert!(estimate.score <= config.ceiling);
            }
        }
    }

    #[test]
    fn test_value_range_width_scales_with_confidence() {
        let config = ConfidenceConfig::default();

        let (low_hi, high_hi) = value_range(1_000_000.0, 0.95, &config);
        let (low_lo, high_lo) = value_range(1_000_000.0, 0.70, &config);

        // 0.95 => ±4%, 0.70 => ±24%
        assert!((high_hi - 1_040_000.0).abs() < 1e-6);
        assert!((low_hi - 960_000.0).abs() < 1e-6);
        assert!(high_lo - low_lo > high_hi - low_hi);
        assert!(low_lo >= 0.0);
    }

    #[test]
    fn test_typical_capacity_ranges() {
        let config = ConfidenceConfig::default();

        assert!(is_typical_capacity(EquipmentClass::Crawler, 110.0, &config));
        assert!(!is_typical_capacity(EquipmentClass::Crawler, 3_000.0, &config));
        assert!(!is_typical_capacity(EquipmentClass::Tower, 300.0, &config));
    }

    #[test]
    fn test_deal_grades_across_composites() {
        let config = DealConfig::default();

        // High confidence, low risk
        assert_eq!(deal_grade(0.95, 20.0, &config), DealGrade::APlus);
        // Solid but not stellar
        assert_eq!(deal_grade(0.88, 40.0, &config), DealGrade::A);
        assert_eq!(deal_grade(0.80, 45.0, &config), DealGrade::BPlus);
        assert_eq!(deal_grade(0.72, 55.0, &config), DealGrade::B);
        // Low confidence, high risk
        assert_eq!(deal_grade(0.62, 70.0, &config), DealGrade::C);
    }
}
