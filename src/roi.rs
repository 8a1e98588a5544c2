// 📈 ROI / Utilization Analyzer - Purchase vs rental cash flows
// Projects total cost of ownership against total rental cost for each
// utilization scenario over a configurable horizon, finds the break-even
// point (linear interpolation between year boundaries) and flags scenarios
// where renting stays strictly cheaper across the whole horizon.

use crate::config::RoiConfig;
use serde::Serialize;

// ============================================================================
// OUTPUT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RoiScenario {
    /// Utilization fraction this scenario assumes (0.50, 0.70, ...)
    pub utilization: f64,

    /// purchase price + maintenance + insurance + storage over the horizon
    pub purchase_total_cost: f64,

    /// monthly rate * utilization * 12 * horizon
    pub rental_total_cost: f64,

    /// Gross rental income per year if the machine is rented out
    pub annual_rental_revenue: f64,

    /// Revenue minus operating expenses
    pub net_operating_income: f64,

    /// Years until cumulative ownership cost drops below cumulative rental
    /// cost; None when that never happens within the horizon
    pub break_even_years: Option<f64>,

    /// Renting is strictly cheaper across the full horizon
    pub rental_recommended: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoiSummary {
    pub purchase_price: f64,
    pub monthly_rate: f64,
    pub horizon_years: u32,
    pub scenarios: Vec<RoiScenario>,
}

// ============================================================================
// ANALYZER
// ============================================================================

pub fn analyze_roi(purchase_price: f64, monthly_rate: f64, config: &RoiConfig) -> RoiSummary {
    let horizon = config.horizon_years as f64;

    // Fixed annual carrying cost of ownership
    let annual_carry = purchase_price
        * (config.maintenance_pct_per_year + config.insurance_pct_per_year)
        + config.storage_cost_per_year;

    let scenarios = config
        .utilization_scenarios
        .iter()
        .map(|&utilization| {
            let annual_rental = monthly_rate * utilization * 12.0;

            let purchase_total_cost = purchase_price + annual_carry * horizon;
            let rental_total_cost = annual_rental * horizon;

            let annual_rental_revenue = annual_rental;
            let net_operating_income =
                annual_rental_revenue * (1.0 - config.operating_expense_ratio);

            // Cumulative purchase = price + carry*t, cumulative rental =
            // annual_rental*t; they cross at t = price / (rental - carry)
            let break_even_years = if annual_rental > annual_carry {
                let t = purchase_price / (annual_rental - annual_carry);
                if t <= horizon {
                    Some(t)
                } else {
                    None
                }
            } else {
                None
            };

            RoiScenario {
                utilization,
                purchase_total_cost,
                rental_total_cost,
                annual_rental_revenue,
                net_operating_income,
                break_even_years,
                rental_recommended: rental_total_cost < purchase_total_cost,
            }
        })
        .collect();

    RoiSummary {
        purchase_price,
        monthly_rate,
        horizon_years: config.horizon_years,
        scenarios,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RoiConfig {
        RoiConfig::default()
    }

    #[test]
    fn test_scenario_totals() {
        let config = test_config();
        let summary = analyze_roi(1_000_000.0, 40_000.0, &config);

        assert_eq!(summary.scenarios.len(), 4);
        let s = &summary.scenarios[0]; // 50% utilization

        // price + 5 * (3% + 1.5%) * price + 5 * 12_000
        let expected_purchase = 1_000_000.0 + 5.0 * 45_000.0 + 5.0 * 12_000.0;
        assert!((s.purchase_total_cost - expected_purchase).abs() < 1e-6);

        // 40_000 * 0.5 * 12 * 5
        assert!((s.rental_total_cost - 1_200_000.0).abs() < 1e-6);

        assert!((s.annual_rental_revenue - 240_000.0).abs() < 1e-6);
        assert!((s.net_operating_income - 240_000.0 * 0.65).abs() < 1e-6);
    }

    #[test]
    fn test_rental_cost_increases_with_utilization() {
        let summary = analyze_roi(1_000_000.0, 40_000.0, &test_config());

        let costs: Vec<f64> = summary
            .scenarios
            .iter()
            .map(|s| s.rental_total_cost)
            .collect();
        for pair in costs.windows(2) {
            assert!(pair[0] < pair[1]);
        }

        // Purchase cost is utilization-independent
        let first = summary.scenarios[0].purchase_total_cost;
        assert!(summary
            .scenarios
            .iter()
            .all(|s| (s.purchase_total_cost - first).abs() < 1e-9));
    }

    #[test]
    fn test_break_even_interpolated() {
        let config = test_config();
        let summary = analyze_roi(1_000_000.0, 40_000.0, &config);

        // 95% utilization: annual rental 456_000, carry 57_000
        // t = 1_000_000 / 399_000 ≈ 2.506 years
        let s = summary.scenarios.last().unwrap();
        let t = s.break_even_years.unwrap();
        assert!((t - 1_000_000.0 / 399_000.0).abs() < 1e-6);
        assert!(t > 2.0 && t < 3.0);
    }

    #[test]
    fn test_rental_recommended_when_cheaper_over_horizon() {
        // Cheap rental vs expensive machine: renting wins at every
        // utilization, so no scenario breaks even
        let summary = analyze_roi(5_000_000.0, 10_000.0, &test_config());

        for s in &summary.scenarios {
            assert!(s.rental_recommended, "rental not recommended at {}", s.utilization);
            assert!(s.break_even_years.is_none());
        }
    }

    #[test]
    fn test_purchase_wins_at_high_utilization() {
        let summary = analyze_roi(500_000.0, 40_000.0, &test_config());

        let high = summary.scenarios.last().unwrap();
        assert!(!high.rental_recommended);
        assert!(high.break_even_years.unwrap() < 5.0);
    }

    #[test]
    fn test_break_even_consistent_with_recommendation() {
        for (price, rate) in [
            (200_000.0, 10_000.0),
            (1_000_000.0, 40_000.0),
            (3_000_000.0, 25_000.0),
        ] {
            let summary = analyze_roi(price, rate, &test_config());
            for s in &summary.scenarios {
                // Breaking even inside the horizon <=> buying ends up cheaper
                assert_eq!(
                    s.break_even_years.is_some(),
                    !s.rental_recommended,
                    "inconsistent at price {} rate {} util {}",
                    price,
                    rate,
                    s.utilization
                );
            }
        }
    }
}
