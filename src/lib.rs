// Crane Valuation Engine - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod adjustments;
pub mod base_value;
pub mod comparables;
pub mod config;
pub mod engine;
pub mod reference;
pub mod rental;
pub mod roi;
pub mod scoring;
pub mod spec;

// Re-export commonly used types
pub use adjustments::{AdjustedValue, AdjustmentLine, apply_adjustments};
pub use base_value::{BaseValue, ValueModel, calculate_base_value};
pub use comparables::{ComparableMatches, match_comparables};
pub use config::EngineConfig;
pub use engine::{ValuationEngine, ValuationResult};
pub use reference::{
    ComparableSale, RateTableEntry, ReferenceSnapshot, ReferenceStore, Trend,
};
pub use rental::{RentalRateEstimate, calibrate_rental_rate};
pub use roi::{RoiScenario, RoiSummary, analyze_roi};
pub use scoring::{
    ConfidenceEstimate, ConfidenceSignals, DealGrade, RiskAssessment, RiskBand,
    assess_risk, deal_grade, estimate_confidence,
};
pub use spec::{
    Condition, EquipmentClass, EquipmentSpecification, JibConfiguration, Region,
    RentalMode, ValidationError, ValuationRequest, normalize,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
