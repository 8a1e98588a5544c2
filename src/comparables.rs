// 🔎 Comparable Sales Matcher - Filter then rank the reference store
// Hard filters first (exact class, capacity within tolerance - a crawler is
// only ever compared to crawlers), then rank survivors by capacity
// closeness, recency and hours similarity. Zero matches is a normal,
// annotated outcome, not an error.

use crate::config::ComparablesConfig;
use crate::reference::{ComparableSale, ReferenceSnapshot};
use crate::spec::EquipmentSpecification;
use serde::Serialize;
use std::cmp::Ordering;

/// Matcher output: up to N ranked sales, or an explanation for none
#[derive(Debug, Clone, Serialize)]
pub struct ComparableMatches {
    pub sales: Vec<ComparableSale>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl ComparableMatches {
    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }
}

pub fn match_comparables(
    snapshot: &ReferenceSnapshot,
    spec: &EquipmentSpecification,
    config: &ComparablesConfig,
) -> ComparableMatches {
    let mut candidates: Vec<&ComparableSale> = snapshot
        .comparables
        .iter()
        .filter(|sale| sale.equipment_class == spec.class)
        .filter(|sale| capacity_distance(sale, spec) <= config.capacity_tolerance)
        .collect();

    if candidates.is_empty() {
        return ComparableMatches {
            sales: Vec::new(),
            annotation: Some(format!(
                "no comparable sales found for class {} within ±{:.0}% capacity",
                spec.class.as_str(),
                config.capacity_tolerance * 100.0
            )),
        };
    }

    candidates.sort_by(|a, b| rank(a, b, spec));
    candidates.truncate(config.max_results);

    ComparableMatches {
        sales: candidates.into_iter().cloned().collect(),
        annotation: None,
    }
}

/// Absolute capacity distance as a fraction of the subject's capacity
fn capacity_distance(sale: &ComparableSale, spec: &EquipmentSpecification) -> f64 {
    (sale.capacity - spec.capacity_tons).abs() / spec.capacity_tons
}

/// Closer capacity first, then more recent sale, then smaller hours delta
fn rank(a: &ComparableSale, b: &ComparableSale, spec: &EquipmentSpecification) -> Ordering {
    capacity_distance(a, spec)
        .partial_cmp(&capacity_distance(b, spec))
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.year.cmp(&a.year))
        .then_with(|| {
            let delta_a = (a.hours as i64 - spec.hours as i64).abs();
            let delta_b = (b.hours as i64 - spec.hours as i64).abs();
            delta_a.cmp(&delta_b)
        })
}

// ============================================================================
// TESTS
// ============================================================================
