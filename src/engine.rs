// 🏗️ Valuation Engine
// Owns the configuration, the value model and the reference store, and runs
// the full appraisal for one request: normalize → base value → adjustment
// pipeline → {comparables, rental} → ROI → risk/confidence/deal → aggregate.
// Each call grabs one reference snapshot up front and works against it for
// the whole computation, so a concurrent reload never changes a result
// mid-flight.

use crate::adjustments::{AdjustmentLine, apply_adjustments};
use crate::base_value::{BaseValue, ValueModel, calculate_base_value};
use crate::comparables::{ComparableMatches, match_comparables};
use crate::config::EngineConfig;
use crate::reference::ReferenceStore;
use crate::rental::{RentalRateEstimate, calibrate_rental_rate};
use crate::roi::{RoiSummary, analyze_roi};
use crate::scoring::{
    ConfidenceSignals, DealGrade, RiskAssessment, assess_risk, deal_grade, estimate_confidence,
    is_typical_capacity, value_range,
};
use crate::spec::{
    Condition, EquipmentSpecification, ValidationError, ValuationRequest, normalize,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

pub const VALUE_MODEL_FILE: &str = "value_model.json";
pub const ENGINE_CONFIG_FILE: &str = "engine_config.json";

// ============================================================================
// RESULT
// ============================================================================

/// Immutable appraisal output. Assembled once per call; persistence, if any,
/// is the caller's business.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationResult {
    pub valuation_id: Uuid,
    pub generated_at: DateTime<Utc>,

    /// Version id of the reference dataset this result was computed against
    pub dataset_fingerprint: String,

    pub specification: EquipmentSpecification,

    pub base_value: f64,
    pub point_estimate: f64,
    pub value_low: f64,
    pub value_high: f64,

    /// 0-1
    pub confidence: f64,
    pub confidence_notes: Vec<String>,

    pub risk: RiskAssessment,
    pub deal_grade: DealGrade,

    pub adjustments: Vec<AdjustmentLine>,
    pub implied_condition: Condition,

    pub comparables: ComparableMatches,
    pub rental: RentalRateEstimate,
    pub roi: RoiSummary,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct ValuationEngine {
    config: EngineConfig,
    value_model: ValueModel,
    store: ReferenceStore,
}

impl ValuationEngine {
    pub fn new(config: EngineConfig, value_model: ValueModel, store: ReferenceStore) -> Self {
        ValuationEngine {
            config,
            value_model,
            store,
        }
    }

    /// Load everything from a data directory and fail fast on any problem.
    /// The reference CSVs are required; `value_model.json` and
    /// `engine_config.json` fall back to the compiled-in defaults when absent.
    pub fn from_data_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let config_path = dir.join(ENGINE_CONFIG_FILE);
        let config = if config_path.exists() {
            EngineConfig::from_file(&config_path)
                .with_context(|| format!("Failed to load engine config: {:?}", config_path))?
        } else {
            EngineConfig::default()
        };

        let model_path = dir.join(VALUE_MODEL_FILE);
        let value_model = if model_path.exists() {
            ValueModel::from_file(&model_path)
                .with_context(|| format!("Failed to load value model: {:?}", model_path))?
        } else {
            ValueModel::default()
        };

        let store = ReferenceStore::open(dir)
            .with_context(|| format!("Failed to load reference data from {:?}", dir))?;

        Ok(ValuationEngine::new(config, value_model, store))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &ReferenceStore {
        &self.store
    }

    /// Run one full appraisal. Validation problems come back as the Err
    /// variant with every field error collected; everything past
    /// normalization always succeeds.
    pub fn appraise(
        &self,
        raw: &ValuationRequest,
    ) -> Result<ValuationResult, Vec<ValidationError>> {
        let snapshot = self.store.snapshot();
        let current_year = Utc::now().year();

        let spec = normalize(raw, &self.config, current_year)?;
        let market_factor = raw.market_factor.unwrap_or(self.config.market_factor);

        let base = calculate_base_value(&self.value_model, &spec);
        let adjusted = apply_adjustments(
            &base,
            &spec,
            &self.value_model,
            &self.config,
            current_year,
            market_factor,
        );

        let comparables = match_comparables(&snapshot, &spec, &self.config.comparables);
        let rental = calibrate_rental_rate(&snapshot, &spec, &self.config, current_year);

        let purchase_price = raw.purchase_price.unwrap_or(adjusted.final_value);
        let roi = analyze_roi(purchase_price, rental.monthly_rate, &self.config.roi);

        let risk = assess_risk(&spec, &base, &self.config.risk, current_year);
        let confidence = estimate_confidence(
            confidence_signals(&spec, &base, &rental, &comparables, &self.config),
            &self.config.confidence,
        );
        let grade = deal_grade(confidence.score, risk.overall, &self.config.deal);

        let (value_low, value_high) =
            value_range(adjusted.final_value, confidence.score, &self.config.confidence);

        Ok(ValuationResult {
            valuation_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            dataset_fingerprint: snapshot.fingerprint.clone(),
            specification: spec,
            base_value: adjusted.base_value,
            point_estimate: adjusted.final_value,
            value_low,
            value_high,
            confidence: confidence.score,
            confidence_notes: confidence.reasons,
            risk,
            deal_grade: grade,
            adjustments: adjusted.breakdown,
            implied_condition: adjusted.implied_condition,
            comparables,
            rental,
            roi,
        })
    }
}

fn confidence_signals(
    spec: &EquipmentSpecification,
    base: &BaseValue,
    rental: &RentalRateEstimate,
    comparables: &ComparableMatches,
    config: &EngineConfig,
) -> ConfidenceSignals {
    ConfidenceSignals {
        known_manufacturer: base.known_manufacturer,
        known_model: base.known_model,
        condition_supplied: spec.condition.is_some(),
        typical_capacity: is_typical_capacity(spec.class, spec.capacity_tons, &config.confidence),
        calibrated_rental: rental.calibrated,
        has_comparables: !comparables.is_empty(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
