// ⚙️ Engine Configuration - Tunables as Data
// Every heuristic constant (depreciation rates, regional percentages, jib
// premiums, risk caps...) lives here, not in the functions that apply it.
// The engine takes one EngineConfig at construction time so each knob is
// independently testable and tunable without code changes.

use crate::spec::{Condition, EquipmentClass, Region};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// SUB-SECTIONS
// ============================================================================

/// Age depreciation of the equipment value (§ adjustment pipeline, step 1)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepreciationConfig {
    /// Fraction of base value lost per year of age
    pub rate_per_year: f64,

    /// Total age depreciation never exceeds this fraction of base value
    pub max_total: f64,
}

impl Default for DepreciationConfig {
    fn default() -> Self {
        DepreciationConfig {
            rate_per_year: 0.05,
            max_total: 0.60,
        }
    }
}

/// Utilization curve: actual hours vs expected hours for the machine's age
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilizationConfig {
    /// Expected operating hours per year of age
    pub reference_hours_per_year: f64,

    /// Below this fraction of expected hours: lightly used (bonus tier)
    pub light_threshold: f64,

    /// Up to this fraction: neutral tier
    pub neutral_threshold: f64,

    /// Up to this fraction: mild penalty tier; above it: heavy penalty tier
    pub heavy_threshold: f64,

    /// Hours ratios above this are clamped (annotated in the breakdown)
    pub max_ratio: f64,

    pub light_bonus: f64,
    pub mild_penalty: f64,
    pub heavy_penalty: f64,
}

impl Default for UtilizationConfig {
    fn default() -> Self {
        UtilizationConfig {
            reference_hours_per_year: 1000.0,
            light_threshold: 0.70,
            neutral_threshold: 1.00,
            heavy_threshold: 1.30,
            max_ratio: 3.0,
            light_bonus: 0.03,
            mild_penalty: -0.02,
            heavy_penalty: -0.06,
        }
    }
}

/// Explicit condition descriptor adjustments (override the utilization tier)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionConfig {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
    pub poor: f64,
}

impl Default for ConditionConfig {
    fn default() -> Self {
        ConditionConfig {
            excellent: 0.05,
            good: 0.02,
            fair: 0.0,
            poor: -0.03,
        }
    }
}

impl ConditionConfig {
    pub fn adjustment_for(&self, condition: Condition) -> f64 {
        match condition {
            Condition::Excellent => self.excellent,
            Condition::Good => self.good,
            Condition::Fair => self.fair,
            Condition::Poor => self.poor,
        }
    }
}

/// Boom length premium/penalty around a per-class baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoomConfig {
    /// Baseline boom length per equipment class (length units)
    pub baselines: HashMap<EquipmentClass, f64>,

    /// Value premium per 10 length units above baseline
    pub premium_per_10_over: f64,

    /// Value penalty per 10 length units below baseline
    pub penalty_per_10_under: f64,
}

impl Default for BoomConfig {
    fn default() -> Self {
        let mut baselines = HashMap::new();
        baselines.insert(EquipmentClass::Crawler, 40.0);
        baselines.insert(EquipmentClass::AllTerrain, 50.0);
        baselines.insert(EquipmentClass::RoughTerrain, 35.0);
        baselines.insert(EquipmentClass::TruckMounted, 30.0);
        baselines.insert(EquipmentClass::TelescopicCrawler, 36.0);
        baselines.insert(EquipmentClass::Tower, 60.0);
        baselines.insert(EquipmentClass::Other, 40.0);

        BoomConfig {
            baselines,
            premium_per_10_over: 0.02,
            penalty_per_10_under: 0.015,
        }
    }
}

impl BoomConfig {
    /// Baseline boom length for a class (Other's baseline as last resort)
    pub fn baseline_for(&self, class: EquipmentClass) -> f64 {
        self.baselines
            .get(&class)
            .or_else(|| self.baselines.get(&EquipmentClass::Other))
            .copied()
            .unwrap_or(40.0)
    }
}

/// Jib premiums are additive currency amounts, not percentages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JibConfig {
    pub standard_base: f64,
    pub standard_per_unit: f64,
    pub luffing_base: f64,
    pub luffing_per_unit: f64,

    /// Extra flat premium for manufacturer/models on the
    /// premium-luffing-eligible list (see ValueModel)
    pub premium_luffing_bonus: f64,
}

impl Default for JibConfig {
    fn default() -> Self {
        JibConfig {
            standard_base: 15_000.0,
            standard_per_unit: 250.0,
            luffing_base: 45_000.0,
            luffing_per_unit: 400.0,
            premium_luffing_bonus: 25_000.0,
        }
    }
}

/// Rental rate calibration knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalConfig {
    /// Fallback monthly rate when no rate-table entry matches:
    /// base + per_ton * capacity
    pub fallback_base_monthly: f64,
    pub fallback_per_ton: f64,

    /// Operated/bare ratio used when uncalibrated
    pub fallback_operated_ratio: f64,

    /// Rate decay per year of age (own knob, separate from value depreciation)
    pub age_decay_per_year: f64,
    pub max_age_decay: f64,

    /// weekly = monthly / weeks_per_month, daily = weekly / days_per_week
    pub weeks_per_month: f64,
    pub days_per_week: f64,
}

impl Default for RentalConfig {
    fn default() -> Self {
        RentalConfig {
            fallback_base_monthly: 8_000.0,
            fallback_per_ton: 95.0,
            fallback_operated_ratio: 1.45,
            age_decay_per_year: 0.03,
            max_age_decay: 0.50,
            weeks_per_month: 3.8,
            days_per_week: 4.5,
        }
    }
}

/// Purchase-vs-rent projection knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    pub horizon_years: u32,
    pub maintenance_pct_per_year: f64,
    pub insurance_pct_per_year: f64,
    pub storage_cost_per_year: f64,

    /// Utilization fractions evaluated for every request
    pub utilization_scenarios: Vec<f64>,

    /// Fraction of rental revenue consumed by operating expenses (for NOI)
    pub operating_expense_ratio: f64,
}

impl Default for RoiConfig {
    fn default() -> Self {
        RoiConfig {
            horizon_years: 5,
            maintenance_pct_per_year: 0.03,
            insurance_pct_per_year: 0.015,
            storage_cost_per_year: 12_000.0,
            utilization_scenarios: vec![0.50, 0.70, 0.85, 0.95],
            operating_expense_ratio: 0.35,
        }
    }
}

/// Risk sub-score caps and lookups; band edges for presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub age_points_per_year: f64,
    pub age_cap: f64,

    pub hours_points_per_10k: f64,
    pub hours_cap: f64,

    /// Fixed risk per region (15-40)
    pub regional_risk: HashMap<Region, f64>,

    /// Capacities above this are specialized/thin-market
    pub specialized_capacity_tons: f64,
    pub specialized_score: f64,

    /// Niche class (tower, telescopic-crawler, other) or unknown manufacturer
    pub niche_score: f64,
    pub baseline_score: f64,

    /// Band edges: risk < medium_band => Low, <= high_band => Medium, else High
    pub medium_band: f64,
    pub high_band: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        let mut regional_risk = HashMap::new();
        regional_risk.insert(Region::NorthAmerica, 15.0);
        regional_risk.insert(Region::Europe, 18.0);
        regional_risk.insert(Region::Oceania, 20.0);
        regional_risk.insert(Region::Asia, 25.0);
        regional_risk.insert(Region::MiddleEast, 30.0);
        regional_risk.insert(Region::SouthAmerica, 32.0);
        regional_risk.insert(Region::Africa, 40.0);

        RiskConfig {
            age_points_per_year: 3.0,
            age_cap: 50.0,
            hours_points_per_10k: 30.0,
            hours_cap: 40.0,
            regional_risk,
            specialized_capacity_tons: 500.0,
            specialized_score: 55.0,
            niche_score: 35.0,
            baseline_score: 28.0,
            medium_band: 25.0,
            high_band: 45.0,
        }
    }
}

/// Typical capacity range per class, used by the confidence estimator
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CapacityRange {
    pub low: f64,
    pub high: f64,
}

/// Confidence baseline, per-signal penalties and range-width scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub baseline: f64,

    pub unknown_manufacturer_penalty: f64,
    pub unknown_model_penalty: f64,
    pub missing_condition_penalty: f64,
    pub atypical_capacity_penalty: f64,
    pub uncalibrated_rental_penalty: f64,
    pub no_comparables_penalty: f64,

    pub floor: f64,
    pub ceiling: f64,

    /// Value range half-width = point_estimate * (1 - confidence) * k
    pub range_width_factor: f64,

    /// Capacities outside these ranges count as atypical for the class
    pub typical_capacity: HashMap<EquipmentClass, CapacityRange>,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        let mut typical_capacity = HashMap::new();
        typical_capacity.insert(EquipmentClass::Crawler, CapacityRange { low: 40.0, high: 1_400.0 });
        typical_capacity.insert(EquipmentClass::AllTerrain, CapacityRange { low: 30.0, high: 1_200.0 });
        typical_capacity.insert(EquipmentClass::RoughTerrain, CapacityRange { low: 20.0, high: 160.0 });
        typical_capacity.insert(EquipmentClass::TruckMounted, CapacityRange { low: 10.0, high: 120.0 });
        typical_capacity.insert(EquipmentClass::TelescopicCrawler, CapacityRange { low: 30.0, high: 250.0 });
        typical_capacity.insert(EquipmentClass::Tower, CapacityRange { low: 4.0, high: 80.0 });
        typical_capacity.insert(EquipmentClass::Other, CapacityRange { low: 5.0, high: 2_000.0 });

        ConfidenceConfig {
            baseline: 0.90,
            unknown_manufacturer_penalty: 0.05,
            unknown_model_penalty: 0.03,
            missing_condition_penalty: 0.04,
            atypical_capacity_penalty: 0.05,
            uncalibrated_rental_penalty: 0.06,
            no_comparables_penalty: 0.05,
            floor: 0.60,
            ceiling: 0.98,
            range_width_factor: 0.8,
            typical_capacity,
        }
    }
}

/// Deal grade thresholds on the composite = confidence*100 - risk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DealConfig {
    pub a_plus: f64,
    pub a: f64,
    pub b_plus: f64,
    pub b: f64,
}

impl Default for DealConfig {
    fn default() -> Self {
        DealConfig {
            a_plus: 55.0,
            a: 40.0,
            b_plus: 25.0,
            b: 10.0,
        }
    }
}

/// Comparable matcher limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparablesConfig {
    pub max_results: usize,

    /// Capacity must be within +/- this fraction of the subject's
    pub capacity_tolerance: f64,
}

impl Default for ComparablesConfig {
    fn default() -> Self {
        ComparablesConfig {
            max_results: 4,
            capacity_tolerance: 0.30,
        }
    }
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub depreciation: DepreciationConfig,
    pub utilization: UtilizationConfig,
    pub condition: ConditionConfig,

    /// Signed demand percentage per region (+4% North America, -5% Africa...)
    pub regional_factors: HashMap<Region, f64>,

    pub boom: BoomConfig,
    pub jib: JibConfig,

    /// Supply/demand multiplier applied as the last pipeline step.
    /// Overridable per request for scenario testing.
    pub market_factor: f64,

    pub rental: RentalConfig,
    pub roi: RoiConfig,
    pub risk: RiskConfig,
    pub confidence: ConfidenceConfig,
    pub deal: DealConfig,
    pub comparables: ComparablesConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut regional_factors = HashMap::new();
        regional_factors.insert(Region::NorthAmerica, 0.04);
        regional_factors.insert(Region::Europe, 0.02);
        regional_factors.insert(Region::MiddleEast, 0.0);
        regional_factors.insert(Region::Asia, -0.01);
        regional_factors.insert(Region::SouthAmerica, -0.03);
        regional_factors.insert(Region::Africa, -0.05);
        regional_factors.insert(Region::Oceania, 0.01);

        EngineConfig {
            depreciation: DepreciationConfig::default(),
            utilization: UtilizationConfig::default(),
            condition: ConditionConfig::default(),
            regional_factors,
            boom: BoomConfig::default(),
            jib: JibConfig::default(),
            market_factor: 1.0,
            rental: RentalConfig::default(),
            roi: RoiConfig::default(),
            risk: RiskConfig::default(),
            confidence: ConfidenceConfig::default(),
            deal: DealConfig::default(),
            comparables: ComparablesConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load config overrides from a JSON file.
    /// Missing sections/fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: EngineConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// Regional demand factor (0.0 for regions without an entry)
    pub fn regional_factor(&self, region: Region) -> f64 {
        self.regional_factors.get(&region).copied().unwrap_or(0.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_all_regions() {
        let config = EngineConfig::default();

        for region in Region::ALL {
            assert!(
                config.regional_factors.contains_key(&region),
                "missing regional factor for {:?}",
                region
            );
            assert!(
                config.risk.regional_risk.contains_key(&region),
                "missing regional risk for {:?}",
                region
            );
        }
    }

    #[test]
    fn test_defaults_cover_all_classes() {
        let config = EngineConfig::default();

        for class in EquipmentClass::ALL {
            assert!(config.boom.baseline_for(class) > 0.0);
            assert!(config.confidence.typical_capacity.contains_key(&class));
        }
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"market_factor": 1.1, "depreciation": {"max_total": 0.5}}"#)
                .unwrap();

        assert_eq!(config.market_factor, 1.1);
        assert_eq!(config.depreciation.max_total, 0.5);
        // Untouched fields keep their defaults
        assert_eq!(config.depreciation.rate_per_year, 0.05);
        assert_eq!(config.roi.horizon_years, 5);
    }

    #[test]
    fn test_config_round_trip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.confidence.baseline, config.confidence.baseline);
        assert_eq!(parsed.deal.a_plus, config.deal.a_plus);
    }

    #[test]
    fn test_regional_factor_lookup() {
        let config = EngineConfig::default();

        assert!(config.regional_factor(Region::NorthAmerica) > 0.0);
        assert!(config.regional_factor(Region::Africa) < 0.0);
    }
}
