// 🏗️ Equipment Specification - Raw request → validated canonical form
// The normalizer is the only constructor of EquipmentSpecification: every
// downstream module can assume capacity > 0, a plausible year, known class
// and region, and defaulted optional fields. Rejections are field-level
// ValidationErrors, never silent coercions.

use crate::config::EngineConfig;
use serde::{Deserialize, Serialize};

// ============================================================================
// ENUMERATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EquipmentClass {
    Crawler,
    AllTerrain,
    RoughTerrain,
    TruckMounted,
    TelescopicCrawler,
    Tower,
    Other,
}

impl EquipmentClass {
    pub const ALL: [EquipmentClass; 7] = [
        EquipmentClass::Crawler,
        EquipmentClass::AllTerrain,
        EquipmentClass::RoughTerrain,
        EquipmentClass::TruckMounted,
        EquipmentClass::TelescopicCrawler,
        EquipmentClass::Tower,
        EquipmentClass::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentClass::Crawler => "crawler",
            EquipmentClass::AllTerrain => "all-terrain",
            EquipmentClass::RoughTerrain => "rough-terrain",
            EquipmentClass::TruckMounted => "truck-mounted",
            EquipmentClass::TelescopicCrawler => "telescopic-crawler",
            EquipmentClass::Tower => "tower",
            EquipmentClass::Other => "other",
        }
    }

    /// Parse user input; case-insensitive, accepts '-', '_' or spaces
    pub fn parse(text: &str) -> Option<EquipmentClass> {
        match canonical_token(text).as_str() {
            "crawler" => Some(EquipmentClass::Crawler),
            "all-terrain" => Some(EquipmentClass::AllTerrain),
            "rough-terrain" => Some(EquipmentClass::RoughTerrain),
            "truck-mounted" => Some(EquipmentClass::TruckMounted),
            "telescopic-crawler" => Some(EquipmentClass::TelescopicCrawler),
            "tower" => Some(EquipmentClass::Tower),
            "other" => Some(EquipmentClass::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    NorthAmerica,
    SouthAmerica,
    Europe,
    MiddleEast,
    Asia,
    Africa,
    Oceania,
}

impl Region {
    pub const ALL: [Region; 7] = [
        Region::NorthAmerica,
        Region::SouthAmerica,
        Region::Europe,
        Region::MiddleEast,
        Region::Asia,
        Region::Africa,
        Region::Oceania,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "north-america",
            Region::SouthAmerica => "south-america",
            Region::Europe => "europe",
            Region::MiddleEast => "middle-east",
            Region::Asia => "asia",
            Region::Africa => "africa",
            Region::Oceania => "oceania",
        }
    }

    pub fn parse(text: &str) -> Option<Region> {
        match canonical_token(text).as_str() {
            "north-america" => Some(Region::NorthAmerica),
            "south-america" => Some(Region::SouthAmerica),
            "europe" => Some(Region::Europe),
            "middle-east" => Some(Region::MiddleEast),
            "asia" => Some(Region::Asia),
            "africa" => Some(Region::Africa),
            "oceania" => Some(Region::Oceania),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Excellent => "excellent",
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::Poor => "poor",
        }
    }

    pub fn parse(text: &str) -> Option<Condition> {
        match canonical_token(text).as_str() {
            "excellent" => Some(Condition::Excellent),
            "good" => Some(Condition::Good),
            "fair" => Some(Condition::Fair),
            "poor" => Some(Condition::Poor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JibConfiguration {
    None,
    Standard,
    Luffing,
}

impl JibConfiguration {
    pub fn as_str(&self) -> &'static str {
        match self {
            JibConfiguration::None => "none",
            JibConfiguration::Standard => "standard",
            JibConfiguration::Luffing => "luffing",
        }
    }

    pub fn parse(text: &str) -> Option<JibConfiguration> {
        match canonical_token(text).as_str() {
            "none" => Some(JibConfiguration::None),
            "standard" => Some(JibConfiguration::Standard),
            "luffing" => Some(JibConfiguration::Luffing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalMode {
    Bare,
    Operated,
}

impl RentalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalMode::Bare => "bare",
            RentalMode::Operated => "operated",
        }
    }

    pub fn parse(text: &str) -> Option<RentalMode> {
        match canonical_token(text).as_str() {
            "bare" => Some(RentalMode::Bare),
            "operated" => Some(RentalMode::Operated),
            _ => None,
        }
    }
}

/// Lowercase and fold '_' and spaces into '-' so "North America",
/// "north_america" and "north-america" all parse the same way
fn canonical_token(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .replace([' ', '_'], "-")
}

// ============================================================================
// VALIDATION ERROR
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// RAW REQUEST
// ============================================================================

/// Raw valuation request as received from the surrounding application.
/// Permissive on purpose: enumerations arrive as strings, required numbers
/// as Options, so a malformed request deserializes and is then rejected
/// with field-level errors instead of a serde failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationRequest {
    pub manufacturer: String,
    pub model: String,
    pub equipment_class: String,
    pub capacity_tons: Option<f64>,
    pub boom_length: Option<f64>,
    pub jib: Option<String>,
    pub jib_length: Option<f64>,
    pub year: Option<i32>,
    pub hours: Option<i64>,
    pub condition: Option<String>,
    pub region: String,
    pub rental_mode: Option<String>,

    /// Defaults to the computed estimate when absent
    pub purchase_price: Option<f64>,

    /// Market condition override for scenario testing
    pub market_factor: Option<f64>,
}

// ============================================================================
// VALIDATED SPECIFICATION
// ============================================================================

/// Validated, canonical equipment specification.
/// Constructed once per request by `normalize`, immutable thereafter.
#[derive(Debug, Clone, Serialize)]
pub struct EquipmentSpecification {
    pub manufacturer: String,
    pub model: String,
    pub class: EquipmentClass,
    pub capacity_tons: f64,
    pub boom_length: f64,
    pub jib: JibConfiguration,
    pub jib_length: Option<f64>,
    pub year: i32,
    pub hours: u32,
    pub condition: Option<Condition>,
    pub region: Region,
    pub rental_mode: RentalMode,
}

impl EquipmentSpecification {
    /// Age in whole years relative to the reference (current) year
    pub fn age_years(&self, reference_year: i32) -> u32 {
        (reference_year - self.year).max(0) as u32
    }
}

pub const MIN_YEAR: i32 = 1950;

/// Validate and canonicalize a raw request. Pure transform: collects every
/// field error instead of stopping at the first one.
pub fn normalize(
    raw: &ValuationRequest,
    config: &EngineConfig,
    current_year: i32,
) -> Result<EquipmentSpecification, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let class = match EquipmentClass::parse(&raw.equipment_class) {
        Some(class) => Some(class),
        None => {
            if raw.equipment_class.trim().is_empty() {
                errors.push(ValidationError::new("equipment_class", "Required field is missing"));
            } else {
                errors.push(ValidationError::new(
                    "equipment_class",
                    format!("Unsupported equipment class '{}'", raw.equipment_class),
                ));
            }
            None
        }
    };

    let region = match Region::parse(&raw.region) {
        Some(region) => Some(region),
        None => {
            if raw.region.trim().is_empty() {
                errors.push(ValidationError::new("region", "Required field is missing"));
            } else {
                errors.push(ValidationError::new(
                    "region",
                    format!("Unsupported region '{}'", raw.region),
                ));
            }
            None
        }
    };

    let capacity_tons = match raw.capacity_tons {
        Some(capacity) if capacity > 0.0 && capacity.is_finite() => Some(capacity),
        Some(capacity) => {
            errors.push(ValidationError::new(
                "capacity_tons",
                format!("Must be a positive number, got {}", capacity),
            ));
            None
        }
        None => {
            errors.push(ValidationError::new("capacity_tons", "Required field is missing"));
            None
        }
    };

    let year = match raw.year {
        Some(year) if (MIN_YEAR..=current_year + 1).contains(&year) => Some(year),
        Some(year) => {
            errors.push(ValidationError::new(
                "year",
                format!("Must be between {} and {}, got {}", MIN_YEAR, current_year + 1, year),
            ));
            None
        }
        None => {
            errors.push(ValidationError::new("year", "Required field is missing"));
            None
        }
    };

    let hours = match raw.hours {
        Some(hours) => match u32::try_from(hours) {
            Ok(hours) => Some(hours),
            Err(_) => {
                errors.push(ValidationError::new(
                    "hours",
                    format!("Must be between 0 and {}, got {}", u32::MAX, hours),
                ));
                None
            }
        },
        None => {
            errors.push(ValidationError::new("hours", "Required field is missing"));
            None
        }
    };

    let jib = match &raw.jib {
        Some(text) => match JibConfiguration::parse(text) {
            Some(jib) => jib,
            None => {
                errors.push(ValidationError::new(
                    "jib",
                    format!("Must be none, standard or luffing, got '{}'", text),
                ));
                JibConfiguration::None
            }
        },
        None => JibConfiguration::None,
    };

    let condition = match &raw.condition {
        Some(text) => match Condition::parse(text) {
            Some(condition) => Some(condition),
            None => {
                errors.push(ValidationError::new(
                    "condition",
                    format!("Must be excellent, good, fair or poor, got '{}'", text),
                ));
                None
            }
        },
        None => None,
    };

    let rental_mode = match &raw.rental_mode {
        Some(text) => match RentalMode::parse(text) {
            Some(mode) => mode,
            None => {
                errors.push(ValidationError::new(
                    "rental_mode",
                    format!("Must be bare or operated, got '{}'", text),
                ));
                RentalMode::Bare
            }
        },
        None => RentalMode::Bare,
    };

    if let Some(boom) = raw.boom_length {
        if boom < 0.0 || !boom.is_finite() {
            errors.push(ValidationError::new(
                "boom_length",
                format!("Must be non-negative, got {}", boom),
            ));
        }
    }

    if let Some(jib_length) = raw.jib_length {
        if jib_length < 0.0 || !jib_length.is_finite() {
            errors.push(ValidationError::new(
                "jib_length",
                format!("Must be non-negative, got {}", jib_length),
            ));
        } else if jib == JibConfiguration::None && raw.jib.is_some() {
            errors.push(ValidationError::new(
                "jib_length",
                "Jib length given but jib configuration is 'none'",
            ));
        }
    }

    if let Some(price) = raw.purchase_price {
        if price <= 0.0 || !price.is_finite() {
            errors.push(ValidationError::new(
                "purchase_price",
                format!("Must be a positive number, got {}", price),
            ));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // All unwraps guarded by the empty error list
    let class = class.unwrap();
    let boom_length = raw
        .boom_length
        .unwrap_or_else(|| config.boom.baseline_for(class));

    Ok(EquipmentSpecification {
        manufacturer: raw.manufacturer.trim().to_string(),
        model: raw.model.trim().to_string(),
        class,
        capacity_tons: capacity_tons.unwrap(),
        boom_length,
        jib,
        jib_length: raw.jib_length.filter(|_| jib != JibConfiguration::None),
        year: year.unwrap(),
        hours: hours.unwrap(),
        condition,
        region: region.unwrap(),
        rental_mode,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_request() -> ValuationRequest {
        ValuationRequest {
            manufacturer: "Liebherr".to_string(),
            model: "LR 11000".to_string(),
            equipment_class: "crawler".to_string(),
            capacity_tons: Some(110.0),
            boom_length: Some(350.0),
            jib: Some("luffing".to_string()),
            jib_length: Some(120.0),
            year: Some(2018),
            hours: Some(5000),
            condition: None,
            region: "North America".to_string(),
            rental_mode: None,
            purchase_price: None,
            market_factor: None,
        }
    }

    #[test]
    fn test_normalize_valid_request() {
        let config = EngineConfig::default();
        let spec = normalize(&create_test_request(), &config, 2026).unwrap();

        assert_eq!(spec.class, EquipmentClass::Crawler);
        assert_eq!(spec.region, Region::NorthAmerica);
        assert_eq!(spec.jib, JibConfiguration::Luffing);
        assert_eq!(spec.rental_mode, RentalMode::Bare);
        assert_eq!(spec.boom_length, 350.0);
        assert_eq!(spec.age_years(2026), 8);
    }

    #[test]
    fn test_normalize_missing_capacity() {
        let config = EngineConfig::default();
        let mut raw = create_test_request();
        raw.capacity_tons = None;

        let errors = normalize(&raw, &config, 2026).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "capacity_tons");
    }

    #[test]
    fn test_normalize_collects_multiple_errors() {
        let config = EngineConfig::default();
        let mut raw = create_test_request();
        raw.capacity_tons = Some(-5.0);
        raw.year = Some(1900);
        raw.hours = Some(-10);

        let errors = normalize(&raw, &config, 2026).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"capacity_tons"));
        assert!(fields.contains(&"year"));
        assert!(fields.contains(&"hours"));
    }

    #[test]
    fn test_normalize_rejects_future_year() {
        let config = EngineConfig::default();
        let mut raw = create_test_request();

        raw.year = Some(2027);
        assert!(normalize(&raw, &config, 2026).is_ok()); // current + 1 allowed

        raw.year = Some(2028);
        assert!(normalize(&raw, &config, 2026).is_err());
    }

    #[test]
    fn test_normalize_rejects_hours_beyond_u32() {
        let config = EngineConfig::default();

        // Values past the u32 range must be rejected, never wrapped into a
        // plausible low-hours reading
        for hours in [4_294_967_296_i64, 4_294_967_396, i64::MAX, -1] {
            let mut raw = create_test_request();
            raw.hours = Some(hours);

            let errors = normalize(&raw, &config, 2026).unwrap_err();
            assert!(
                errors.iter().any(|e| e.field == "hours"),
                "hours {} accepted",
                hours
            );
        }

        // The boundary itself is fine
        let mut raw = create_test_request();
        raw.hours = Some(u32::MAX as i64);
        assert!(normalize(&raw, &config, 2026).is_ok());
    }

    #[test]
    fn test_normalize_unknown_class_and_region() {
        let config = EngineConfig::default();
        let mut raw = create_test_request();
        raw.equipment_class = "hovercraft".to_string();
        raw.region = "Atlantis".to_string();

        let errors = normalize(&raw, &config, 2026).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();

        assert!(fields.contains(&"equipment_class"));
        assert!(fields.contains(&"region"));
    }

    #[test]
    fn test_normalize_defaults_boom_to_class_baseline() {
        let config = EngineConfig::default();
        let mut raw = create_test_request();
        raw.boom_length = None;
        raw.jib = None;
        raw.jib_length = None;

        let spec = normalize(&raw, &config, 2026).unwrap();
        assert_eq!(spec.boom_length, config.boom.baseline_for(EquipmentClass::Crawler));
        assert_eq!(spec.jib, JibConfiguration::None);
        assert_eq!(spec.jib_length, None);
    }

    #[test]
    fn test_parse_tolerates_spelling_variants() {
        assert_eq!(EquipmentClass::parse("All Terrain"), Some(EquipmentClass::AllTerrain));
        assert_eq!(EquipmentClass::parse("rough_terrain"), Some(EquipmentClass::RoughTerrain));
        assert_eq!(Region::parse("NORTH AMERICA"), Some(Region::NorthAmerica));
        assert_eq!(Region::parse("middle_east"), Some(Region::MiddleEast));
    }

    #[test]
    fn test_jib_length_without_jib_rejected() {
        let config = EngineConfig::default();
        let mut raw = create_test_request();
        raw.jib = Some("none".to_string());
        raw.jib_length = Some(50.0);

        let errors = normalize(&raw, &config, 2026).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "jib_length"));
    }
}
