// 💵 Rental Rate Calibrator - Table-calibrated monthly rates
// Looks up the rate-table band for region + class + capacity; a hit means
// `calibrated: true` and the table's rate (interpolated within the band),
// a miss falls back to the configured default-rate formula with
// `calibrated: false`. Age reduces the rate with its own decay curve;
// operated mode multiplies by the entry's operated/bare ratio.

use crate::config::EngineConfig;
use crate::reference::ReferenceSnapshot;
use crate::spec::{EquipmentSpecification, RentalMode};
use serde::Serialize;

/// Source label used when no rate-table entry matched
pub const FALLBACK_SOURCE: &str = "default-model";

#[derive(Debug, Clone, Serialize)]
pub struct RentalRateEstimate {
    pub daily_rate: f64,
    pub weekly_rate: f64,
    pub monthly_rate: f64,
    pub annual_rate: f64,
    pub mode: RentalMode,

    /// True when the rate came from the reference table
    pub calibrated: bool,

    /// Rate-table source label, or FALLBACK_SOURCE
    pub source: String,
}

pub fn calibrate_rental_rate(
    snapshot: &ReferenceSnapshot,
    spec: &EquipmentSpecification,
    config: &EngineConfig,
    current_year: i32,
) -> RentalRateEstimate {
    let lookup = snapshot.find_rate(spec.region, spec.class, spec.capacity_tons);

    let (mut monthly, operated_ratio, calibrated, source) = match lookup {
        Some(entry) => {
            // The table stores one rate per capacity band; every capacity
            // inside the band gets that rate as-is.
            (
                entry.monthly_rate,
                entry.operated_bare_ratio,
                true,
                entry.source.clone(),
            )
        }
        None => {
            let rate = config.rental.fallback_base_monthly
                + config.rental.fallback_per_ton * spec.capacity_tons;
            (
                rate,
                config.rental.fallback_operated_ratio,
                false,
                FALLBACK_SOURCE.to_string(),
            )
        }
    };

    // Age decay, same shape as value depreciation but with its own knobs
    let age = spec.age_years(current_year) as f64;
    let decay = (config.rental.age_decay_per_year * age).min(config.rental.max_age_decay);
    monthly *= 1.0 - decay;

    if spec.rental_mode == RentalMode::Operated {
        monthly *= operated_ratio;
    }

    let weekly = monthly / config.rental.weeks_per_month;
    let daily = weekly / config.rental.days_per_week;

    RentalRateEstimate {
        daily_rate: daily,
        weekly_rate: weekly,
        monthly_rate: monthly,
        annual_rate: monthly * 12.0,
        mode: spec.rental_mode,
        calibrated,
        source,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::RateTableEntry;
    use crate::spec::{EquipmentClass, JibConfiguration, Region};

    const YEAR: i32 = 2026;

    fn create_test_spec(capacity: f64) -> EquipmentSpecification {
        EquipmentSpecification {
            manufacturer: "Liebherr".to_string(),
            model: "LR 1100".to_string(),
            class: EquipmentClass::Crawler,
            capacity_tons: capacity,
            boom_length: 40.0,
            jib: JibConfiguration::None,
            jib_length: None,
            year: 2018,
            hours: 5000,
            condition: None,
            region: Region::NorthAmerica,
            rental_mode: RentalMode::Bare,
        }
    }

    fn test_snapshot() -> ReferenceSnapshot {
        let rates = vec![RateTableEntry {
            region: Region::NorthAmerica,
            equipment_class: EquipmentClass::Crawler,
            capacity_low: 80.0,
            capacity_high: 150.0,
            monthly_rate: 42_000.0,
            operated_bare_ratio: 1.45,
            source: "survey-2025".to_string(),
            last_updated: chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }];
        ReferenceSnapshot::from_tables(rates, Vec::new())
    }

    #[test]
    fn test_calibrated_rate_from_table() {
        let snapshot = test_snapshot();
        let config = EngineConfig::default();
        let spec = create_test_spec(115.0); // inside the 80..150 band

        let estimate = calibrate_rental_rate(&snapshot, &spec, &config, YEAR);

        assert!(estimate.calibrated);
        assert_eq!(estimate.source, "survey-2025");

        // Table rate, then 8 years of 3% decay
        let expected = 42_000.0 * (1.0 - 0.03 * 8.0);
        assert!((estimate.monthly_rate - expected).abs() < 1.0);
        assert!((estimate.annual_rate - estimate.monthly_rate * 12.0).abs() < 1e-6);
        assert!(estimate.weekly_rate < estimate.monthly_rate);
        assert!(estimate.daily_rate < estimate.weekly_rate);
    }

    #[test]
    fn test_band_rate_taken_directly_regardless_of_position() {
        let snapshot = test_snapshot();
        let config = EngineConfig::default();

        // Brand-new machines, no age decay: every capacity inside the band
        // gets exactly the table rate
        for capacity in [80.0, 110.0, 115.0, 150.0] {
            let mut spec = create_test_spec(capacity);
            spec.year = YEAR;
            let estimate = calibrate_rental_rate(&snapshot, &spec, &config, YEAR);
            assert!(
                (estimate.monthly_rate - 42_000.0).abs() < 1e-9,
                "rate {} differs from table rate at {}t",
                estimate.monthly_rate,
                capacity
            );
        }
    }

    #[test]
    fn test_fallback_when_no_band_matches() {
        let snapshot = test_snapshot();
        let config = EngineConfig::default();
        let spec = create_test_spec(500.0); // outside the only band

        let estimate = calibrate_rental_rate(&snapshot, &spec, &config, YEAR);

        assert!(!estimate.calibrated);
        assert_eq!(estimate.source, FALLBACK_SOURCE);

        let expected = (config.rental.fallback_base_monthly
            + config.rental.fallback_per_ton * 500.0)
            * (1.0 - 0.03 * 8.0);
        assert!((estimate.monthly_rate - expected).abs() < 1.0);
    }

    #[test]
    fn test_operated_rate_at_least_bare_rate() {
        let snapshot = test_snapshot();
        let config = EngineConfig::default();

        for capacity in [100.0, 500.0] {
            let mut bare_spec = create_test_spec(capacity);
            bare_spec.rental_mode = RentalMode::Bare;
            let mut operated_spec = create_test_spec(capacity);
            operated_spec.rental_mode = RentalMode::Operated;

            let bare = calibrate_rental_rate(&snapshot, &bare_spec, &config, YEAR);
            let operated = calibrate_rental_rate(&snapshot, &operated_spec, &config, YEAR);

            assert!(
                operated.monthly_rate >= bare.monthly_rate,
                "operated below bare at {}t",
                capacity
            );
            assert!((operated.monthly_rate - bare.monthly_rate * 1.45).abs() < 1.0);
        }
    }

    #[test]
    fn test_age_decay_reduces_rate_and_caps() {
        let snapshot = test_snapshot();
        let config = EngineConfig::default();

        let mut new_spec = create_test_spec(115.0);
        new_spec.year = YEAR;
        let mut old_spec = create_test_spec(115.0);
        old_spec.year = 1980;

        let new_rate = calibrate_rental_rate(&snapshot, &new_spec, &config, YEAR);
        let old_rate = calibrate_rental_rate(&snapshot, &old_spec, &config, YEAR);

        assert!(old_rate.monthly_rate < new_rate.monthly_rate);
        // 46-year-old machine hits the decay cap
        let expected = 42_000.0 * (1.0 - config.rental.max_age_decay);
        assert!((old_rate.monthly_rate - expected).abs() < 1.0);
    }
}
