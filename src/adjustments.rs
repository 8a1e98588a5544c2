// 🔧 Adjustment Pipeline - Ordered, commuting value modifiers
// Seven steps, each computing a labeled delta AGAINST THE ORIGINAL BASE
// (not compounded on prior steps), so the itemized deltas always sum to
// exactly final - base and reordering cannot drift the result.
// Clamps (depreciation cap, extreme hours) are breakdown annotations,
// never errors.

use crate::base_value::{BaseValue, ValueModel};
use crate::config::EngineConfig;
use crate::spec::{Condition, EquipmentSpecification, JibConfiguration};
use serde::Serialize;

// ============================================================================
// BREAKDOWN
// ============================================================================

/// One itemized line of the adjustment breakdown
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentLine {
    pub label: String,

    /// Currency delta this step contributed
    pub delta: f64,

    /// Running subtotal after this step
    pub subtotal: f64,

    /// Clamp/derivation annotation, when any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Pipeline output: final value plus the full itemization
#[derive(Debug, Clone, Serialize)]
pub struct AdjustedValue {
    pub base_value: f64,
    pub final_value: f64,
    pub breakdown: Vec<AdjustmentLine>,

    /// Condition tier implied by the utilization curve; informational when
    /// an explicit descriptor was supplied
    pub implied_condition: Condition,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub fn apply_adjustments(
    base: &BaseValue,
    spec: &EquipmentSpecification,
    model: &ValueModel,
    config: &EngineConfig,
    current_year: i32,
    market_factor: f64,
) -> AdjustedValue {
    let base_value = base.value;
    let mut breakdown: Vec<AdjustmentLine> = Vec::with_capacity(7);
    let mut subtotal = base_value;

    fn push(
        breakdown: &mut Vec<AdjustmentLine>,
        subtotal: &mut f64,
        label: &str,
        delta: f64,
        note: Option<String>,
    ) {
        *subtotal += delta;
        breakdown.push(AdjustmentLine {
            label: label.to_string(),
            delta,
            subtotal: *subtotal,
            note,
        });
    }

    // 1. Age depreciation, capped at max_total of base
    let age = spec.age_years(current_year) as f64;
    let raw_depreciation = config.depreciation.rate_per_year * age;
    let (depreciation, age_note) = if raw_depreciation > config.depreciation.max_total {
        (
            config.depreciation.max_total,
            Some(format!(
                "depreciation capped at {:.0}% (uncapped {:.0}%)",
                config.depreciation.max_total * 100.0,
                raw_depreciation * 100.0
            )),
        )
    } else {
        (raw_depreciation, None)
    };
    push(&mut breakdown, &mut subtotal, "Age depreciation", -depreciation * base_value, age_note);

    // 2. Utilization vs the expected-hours curve for this age
    let (utilization_pct, implied_condition, utilization_note) =
        utilization_tier(spec, config, current_year);
    push(
        &mut breakdown,
        &mut subtotal,
        "Utilization",
        utilization_pct * base_value,
        utilization_note,
    );

    // 3. Regional demand factor
    let regional = config.regional_factor(spec.region);
    push(&mut breakdown, &mut subtotal, "Regional demand", regional * base_value, None);

    // 4. Condition: an explicit descriptor overrides the utilization tier
    let (condition_pct, condition_note) = match spec.condition {
        Some(condition) => (config.condition.adjustment_for(condition), None),
        None => (
            0.0,
            Some(format!("no descriptor supplied; utilization implies {}", implied_condition.as_str())),
        ),
    };
    push(&mut breakdown, &mut subtotal, "Condition", condition_pct * base_value, condition_note);

    // 5. Boom length premium/penalty around the class baseline
    let baseline = config.boom.baseline_for(spec.class);
    let boom_pct = if spec.boom_length > baseline {
        (spec.boom_length - baseline) / 10.0 * config.boom.premium_per_10_over
    } else {
        -((baseline - spec.boom_length) / 10.0 * config.boom.penalty_per_10_under)
    };
    push(&mut breakdown, &mut subtotal, "Boom length", boom_pct * base_value, None);

    // 6. Jib premium - additive currency, not a percentage
    let (jib_delta, jib_note) = jib_premium(spec, model, config);
    push(&mut breakdown, &mut subtotal, "Jib configuration", jib_delta, jib_note);

    // 7. Market condition factor, floored so the subtotal never goes negative
    let mut market_delta = (market_factor - 1.0) * base_value;
    let mut market_note = None;
    if subtotal + market_delta < 0.0 {
        market_delta = -subtotal;
        market_note = Some("final value floored at zero".to_string());
    }
    push(&mut breakdown, &mut subtotal, "Market conditions", market_delta, market_note);

    AdjustedValue {
        base_value,
        final_value: subtotal,
        breakdown,
        implied_condition,
    }
}

/// Tier the actual hours against the expected-hours curve.
/// Returns (value adjustment pct, implied condition, clamp annotation).
fn utilization_tier(
    spec: &EquipmentSpecification,
    config: &EngineConfig,
    current_year: i32,
) -> (f64, Condition, Option<String>) {
    let u = &config.utilization;

    // A machine in its first year is measured against one year of use
    let age = spec.age_years(current_year).max(1) as f64;
    let expected = age * u.reference_hours_per_year;

    let raw_ratio = spec.hours as f64 / expected;
    let (ratio, note) = if raw_ratio > u.max_ratio {
        (
            u.max_ratio,
            Some(format!(
                "hours ratio {:.1}x clamped to {:.1}x of expected",
                raw_ratio, u.max_ratio
            )),
        )
    } else {
        (raw_ratio, None)
    };

    let (pct, implied) = if ratio < u.light_threshold {
        (u.light_bonus, Condition::Excellent)
    } else if ratio <= u.neutral_threshold {
        (0.0, Condition::Good)
    } else if ratio <= u.heavy_threshold {
        (u.mild_penalty, Condition::Fair)
    } else {
        (u.heavy_penalty, Condition::Poor)
    };

    (pct, implied, note)
}

/// Fixed base + per-unit-length amount; luffing configurations on the
/// eligibility list earn an extra flat premium.
fn jib_premium(
    spec: &EquipmentSpecification,
    model: &ValueModel,
    config: &EngineConfig,
) -> (f64, Option<String>) {
    let length = spec.jib_length.unwrap_or(0.0);

    match spec.jib {
        JibConfiguration::None => (0.0, None),
        JibConfiguration::Standard => {
            (config.jib.standard_base + config.jib.standard_per_unit * length, None)
        }
        JibConfiguration::Luffing => {
            let mut delta = config.jib.luffing_base + config.jib.luffing_per_unit * length;
            let mut note = None;
            if model.luffing_eligible(spec) {
                delta += config.jib.premium_luffing_bonus;
                note = Some("premium-luffing-eligible manufacturer/model".to_string());
            }
            (delta, note)
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
