// 💰 Base Value Calculator - Data-driven per-ton rates and premiums
// base = capacity * per_ton_rate(class) * manufacturer_premium * model_premium
//
// Manufacturer and model premiums are lookup tables loaded alongside the
// reference data, NOT code branches: adding a manufacturer is a data change.
// Unknown names fall back to a neutral 1.0 and are reported so the
// confidence estimator can take its penalty.

use crate::spec::{EquipmentClass, EquipmentSpecification, JibConfiguration};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

// ============================================================================
// VALUE MODEL
// ============================================================================

/// One entry on the premium-luffing-eligible list.
/// `model: None` makes every model of the manufacturer eligible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuffingEligibility {
    pub manufacturer: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueModel {
    /// Currency per ton of rated capacity, by equipment class
    pub per_ton_rates: HashMap<EquipmentClass, f64>,

    /// Keyed by lowercase manufacturer name
    pub manufacturer_premiums: HashMap<String, f64>,

    /// Keyed by lowercase model name
    pub model_premiums: HashMap<String, f64>,

    /// Manufacturer/model combinations that earn the flat luffing bonus
    pub premium_luffing_eligible: Vec<LuffingEligibility>,
}

impl Default for ValueModel {
    fn default() -> Self {
        let mut per_ton_rates = HashMap::new();
        per_ton_rates.insert(EquipmentClass::Crawler, 8_500.0);
        per_ton_rates.insert(EquipmentClass::AllTerrain, 7_800.0);
        per_ton_rates.insert(EquipmentClass::RoughTerrain, 5_200.0);
        per_ton_rates.insert(EquipmentClass::TruckMounted, 4_300.0);
        per_ton_rates.insert(EquipmentClass::TelescopicCrawler, 7_000.0);
        per_ton_rates.insert(EquipmentClass::Tower, 6_000.0);
        per_ton_rates.insert(EquipmentClass::Other, 5_000.0);

        let mut manufacturer_premiums = HashMap::new();
        for (name, premium) in [
            ("liebherr", 1.15),
            ("manitowoc", 1.12),
            ("tadano", 1.10),
            ("demag", 1.10),
            ("grove", 1.08),
            ("kobelco", 1.05),
            ("link-belt", 1.04),
            ("terex", 1.02),
            ("xcmg", 0.93),
            ("sany", 0.92),
            ("zoomlion", 0.90),
        ] {
            manufacturer_premiums.insert(name.to_string(), premium);
        }

        let mut model_premiums = HashMap::new();
        for (name, premium) in [
            ("lr 11000", 1.10),
            ("ltm 11200", 1.08),
            ("cc 8800", 1.09),
            ("m31000", 1.07),
            ("ck1100g", 1.03),
            ("gmk5150", 1.02),
        ] {
            model_premiums.insert(name.to_string(), premium);
        }

        let premium_luffing_eligible = vec![
            LuffingEligibility { manufacturer: "liebherr".to_string(), model: None },
            LuffingEligibility { manufacturer: "manitowoc".to_string(), model: Some("m31000".to_string()) },
            LuffingEligibility { manufacturer: "demag".to_string(), model: Some("cc 8800".to_string()) },
        ];

        ValueModel {
            per_ton_rates,
            manufacturer_premiums,
            model_premiums,
            premium_luffing_eligible,
        }
    }
}

impl ValueModel {
    /// Load model overrides from a JSON file; missing sections keep defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read value model: {:?}", path.as_ref()))?;

        let model: ValueModel =
            serde_json::from_str(&content).context("Failed to parse value model JSON")?;

        Ok(model)
    }

    pub fn per_ton_rate(&self, class: EquipmentClass) -> f64 {
        self.per_ton_rates
            .get(&class)
            .or_else(|| self.per_ton_rates.get(&EquipmentClass::Other))
            .copied()
            .unwrap_or(5_000.0)
    }

    /// (premium, known) - unknown manufacturers get a neutral 1.0
    pub fn manufacturer_premium(&self, manufacturer: &str) -> (f64, bool) {
        match self.manufacturer_premiums.get(&lookup_key(manufacturer)) {
            Some(premium) => (*premium, true),
            None => (1.0, false),
        }
    }

    pub fn model_premium(&self, model: &str) -> (f64, bool) {
        match self.model_premiums.get(&lookup_key(model)) {
            Some(premium) => (*premium, true),
            None => (1.0, false),
        }
    }

    /// Whether this spec's luffing jib earns the flat eligibility bonus
    pub fn luffing_eligible(&self, spec: &EquipmentSpecification) -> bool {
        if spec.jib != JibConfiguration::Luffing {
            return false;
        }

        let manufacturer = lookup_key(&spec.manufacturer);
        let model = lookup_key(&spec.model);

        self.premium_luffing_eligible.iter().any(|entry| {
            lookup_key(&entry.manufacturer) == manufacturer
                && entry
                    .model
                    .as_ref()
                    .map(|m| lookup_key(m) == model)
                    .unwrap_or(true)
        })
    }
}

fn lookup_key(text: &str) -> String {
    text.trim().to_lowercase()
}

// ============================================================================
// BASE VALUE
// ============================================================================

/// Unadjusted base value plus the factors that produced it
#[derive(Debug, Clone, Serialize)]
pub struct BaseValue {
    pub value: f64,
    pub per_ton_rate: f64,
    pub manufacturer_premium: f64,
    pub model_premium: f64,
    pub known_manufacturer: bool,
    pub known_model: bool,
}

/// Never errors, always >= 0
pub fn calculate_base_value(model: &ValueModel, spec: &EquipmentSpecification) -> BaseValue {
    let per_ton_rate = model.per_ton_rate(spec.class);
    let (manufacturer_premium, known_manufacturer) = model.manufacturer_premium(&spec.manufacturer);
    let (model_premium, known_model) = model.model_premium(&spec.model);

    let value = spec.capacity_tons * per_ton_rate * manufacturer_premium * model_premium;

    BaseValue {
        value: value.max(0.0),
        per_ton_rate,
        manufacturer_premium,
        model_premium,
        known_manufacturer,
        known_model,
    }
}

// ============================================================================
// TESTS
// ============================================================================
