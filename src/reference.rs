// 📋 Reference Store - Calibration data (rate table + comparable sales)
// Loaded in bulk at engine initialization from CSV files and treated as
// read-only for the lifetime of the process. Reload builds a complete new
// snapshot and swaps it in one assignment, so in-flight valuations see
// either the old table or the new one, never a partial mix.

use crate::spec::{EquipmentClass, Region};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

pub const RATE_TABLE_FILE: &str = "rate_table.csv";
pub const COMPARABLE_SALES_FILE: &str = "comparable_sales.csv";

// ============================================================================
// TABLE ROWS
// ============================================================================

/// One row of the regional rental rate table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTableEntry {
    pub region: Region,
    pub equipment_class: EquipmentClass,
    pub capacity_low: f64,
    pub capacity_high: f64,

    /// Monthly bare rate at the middle of the capacity band
    pub monthly_rate: f64,

    /// Operated rate = bare rate * this ratio (>= 1.0, typically 1.38-1.56)
    pub operated_bare_ratio: f64,

    pub source: String,
    pub last_updated: NaiveDate,
}

impl RateTableEntry {
    pub fn covers(&self, region: Region, class: EquipmentClass, capacity_tons: f64) -> bool {
        self.region == region
            && self.equipment_class == class
            && capacity_tons >= self.capacity_low
            && capacity_tons <= self.capacity_high
    }
}

/// Price trend indicator carried by a comparable sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Flat,
    Down,
}

/// One historical transaction from the comparable sales table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparableSale {
    pub equipment_class: EquipmentClass,
    pub manufacturer: String,
    pub model: String,
    pub year: i32,
    pub capacity: f64,
    pub hours: u32,
    pub sale_price: f64,
    pub region: Region,
    pub trend: Trend,
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Immutable view of the full reference dataset.
/// Valuation requests grab one Arc to a snapshot up front and keep it for
/// the whole computation; reloads never touch an existing snapshot.
#[derive(Debug)]
pub struct ReferenceSnapshot {
    pub rates: Vec<RateTableEntry>,
    pub comparables: Vec<ComparableSale>,

    /// SHA-256 over the raw reference files - the dataset version id
    pub fingerprint: String,

    pub loaded_at: DateTime<Utc>,
}

impl ReferenceSnapshot {
    /// Load both reference tables from a data directory.
    /// Any missing file, parse failure or implausible row is fatal: the
    /// engine must refuse to initialize rather than run uncalibrated.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let rate_path = dir.join(RATE_TABLE_FILE);
        let rate_bytes = fs::read(&rate_path)
            .with_context(|| format!("Failed to read rate table: {:?}", rate_path))?;
        let rates = parse_rate_table(&rate_bytes)
            .with_context(|| format!("Corrupt rate table: {:?}", rate_path))?;

        let sales_path = dir.join(COMPARABLE_SALES_FILE);
        let sales_bytes = fs::read(&sales_path)
            .with_context(|| format!("Failed to read comparable sales: {:?}", sales_path))?;
        let comparables = parse_comparable_sales(&sales_bytes)
            .with_context(|| format!("Corrupt comparable sales table: {:?}", sales_path))?;

        let mut hasher = Sha256::new();
        hasher.update(&rate_bytes);
        hasher.update(&sales_bytes);
        let fingerprint = format!("{:x}", hasher.finalize());

        Ok(ReferenceSnapshot {
            rates,
            comparables,
            fingerprint,
            loaded_at: Utc::now(),
        })
    }

    /// Build a snapshot from in-memory tables (tests, embedded defaults).
    /// The fingerprint is derived from the serialized rows.
    pub fn from_tables(rates: Vec<RateTableEntry>, comparables: Vec<ComparableSale>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(&rates).unwrap_or_default());
        hasher.update(serde_json::to_vec(&comparables).unwrap_or_default());

        ReferenceSnapshot {
            rates,
            comparables,
            fingerprint: format!("{:x}", hasher.finalize()),
            loaded_at: Utc::now(),
        }
    }

    /// First rate-table entry whose region, class and capacity band match
    pub fn find_rate(
        &self,
        region: Region,
        class: EquipmentClass,
        capacity_tons: f64,
    ) -> Option<&RateTableEntry> {
        self.rates
            .iter()
            .find(|entry| entry.covers(region, class, capacity_tons))
    }
}

fn parse_rate_table(bytes: &[u8]) -> Result<Vec<RateTableEntry>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut rates = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        let entry: RateTableEntry = result
            .with_context(|| format!("Failed to deserialize rate table row {}", index + 1))?;

        if entry.capacity_low < 0.0 || entry.capacity_high <= entry.capacity_low {
            bail!(
                "Rate table row {}: invalid capacity band {}..{}",
                index + 1,
                entry.capacity_low,
                entry.capacity_high
            );
        }
        if entry.monthly_rate <= 0.0 {
            bail!("Rate table row {}: monthly rate must be positive", index + 1);
        }
        if entry.operated_bare_ratio < 1.0 {
            bail!(
                "Rate table row {}: operated/bare ratio {} below 1.0",
                index + 1,
                entry.operated_bare_ratio
            );
        }

        rates.push(entry);
    }

    if rates.is_empty() {
        bail!("Rate table contains no entries - refusing to run uncalibrated");
    }

    Ok(rates)
}

fn parse_comparable_sales(bytes: &[u8]) -> Result<Vec<ComparableSale>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut sales = Vec::new();

    for (index, result) in rdr.deserialize().enumerate() {
        let sale: ComparableSale = result
            .with_context(|| format!("Failed to deserialize comparable sale row {}", index + 1))?;

        if sale.capacity <= 0.0 {
            bail!("Comparable sale row {}: capacity must be positive", index + 1);
        }
        if sale.sale_price <= 0.0 {
            bail!("Comparable sale row {}: sale price must be positive", index + 1);
        }

        sales.push(sale);
    }

    // An empty comparables table is thin but workable: the matcher reports
    // "no comparable sales found" and confidence drops accordingly.
    Ok(sales)
}

// ============================================================================
// STORE (shared handle, atomic swap on reload)
// ============================================================================

/// Shared, read-mostly handle to the current reference snapshot
#[derive(Clone)]
pub struct ReferenceStore {
    current: Arc<RwLock<Arc<ReferenceSnapshot>>>,
}

impl ReferenceStore {
    pub fn new(snapshot: ReferenceSnapshot) -> Self {
        ReferenceStore {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Open a store from a data directory (fatal on missing/corrupt data)
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Ok(ReferenceStore::new(ReferenceSnapshot::load(dir)?))
    }

    /// Current snapshot. The returned Arc stays valid across reloads.
    pub fn snapshot(&self) -> Arc<ReferenceSnapshot> {
        self.current.read().unwrap().clone()
    }

    /// Build a fresh snapshot from the data directory, then swap it in.
    /// On any load error the previous snapshot stays active untouched.
    pub fn reload<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let snapshot = ReferenceSnapshot::load(dir)?;
        self.swap(snapshot);
        Ok(())
    }

    /// Atomically replace the current snapshot
    pub fn swap(&self, snapshot: ReferenceSnapshot) {
        *self.current.write().unwrap() = Arc::new(snapshot);
    }
}

// ============================================================================
// TESTS
// ============================================================================
