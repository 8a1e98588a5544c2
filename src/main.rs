use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::process;

use crane_valuation::{ValuationEngine, ValuationRequest};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("appraise") => match args.get(2) {
            Some(path) => run_appraise(path)?,
            None => {
                eprintln!("Usage: crane-valuation appraise <request.json>");
                process::exit(2);
            }
        },
        Some("demo") => run_demo()?,
        Some("reference") => run_reference()?,
        _ => print_usage(),
    }

    Ok(())
}

fn print_usage() {
    println!("Crane Valuation Engine v{}", crane_valuation::VERSION);
    println!();
    println!("Usage:");
    println!("  crane-valuation appraise <request.json>   Appraise one machine");
    println!("  crane-valuation demo                      Run a sample appraisal");
    println!("  crane-valuation reference                 Show loaded reference data");
    println!();
    println!("Reference data is read from ./data (override with CRANE_DATA_DIR).");
}

fn data_dir() -> String {
    env::var("CRANE_DATA_DIR").unwrap_or_else(|_| "data".to_string())
}

fn run_appraise(path: &str) -> Result<()> {
    println!("🏗️  Crane Valuation - Appraisal");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading reference data from {}...", data_dir());
    let engine = ValuationEngine::from_data_dir(data_dir())?;
    let snapshot = engine.store().snapshot();
    println!(
        "✓ {} rate bands, {} comparable sales (dataset {})",
        snapshot.rates.len(),
        snapshot.comparables.len(),
        &snapshot.fingerprint[..12]
    );

    println!("\n📄 Reading request {}...", path);
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file: {}", path))?;
    let request: ValuationRequest =
        serde_json::from_str(&raw).with_context(|| format!("Invalid request JSON: {}", path))?;

    println!("\n⚙️  Running valuation...");
    match engine.appraise(&request) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Err(errors) => {
            eprintln!("❌ Request rejected ({} validation errors):", errors.len());
            for error in &errors {
                eprintln!("   • {}: {}", error.field, error.message);
            }
            process::exit(1);
        }
    }

    Ok(())
}

fn run_demo() -> Result<()> {
    println!("🏗️  Crane Valuation - Demo Appraisal");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading reference data from {}...", data_dir());
    let engine = ValuationEngine::from_data_dir(data_dir())?;

    // 110t crawler with a long boom and luffing jib
    let request = ValuationRequest {
        manufacturer: "Liebherr".to_string(),
        model: "LR 1100".to_string(),
        equipment_class: "crawler".to_string(),
        capacity_tons: Some(110.0),
        boom_length: Some(350.0),
        jib: Some("luffing".to_string()),
        jib_length: Some(120.0),
        year: Some(2018),
        hours: Some(5_000),
        condition: Some("good".to_string()),
        region: "north-america".to_string(),
        rental_mode: None,
        purchase_price: None,
        market_factor: None,
    };

    println!("\n⚙️  Appraising {} {}...", request.manufacturer, request.model);

    let result = engine
        .appraise(&request)
        .map_err(|errors| anyhow::anyhow!("demo request rejected: {:?}", errors))?;

    println!("\n💰 Point estimate: ${:.0}", result.point_estimate);
    println!("   Range: ${:.0} - ${:.0}", result.value_low, result.value_high);
    println!("   Confidence: {:.0}%", result.confidence * 100.0);
    println!("   Risk: {:.1} ({})", result.risk.overall, result.risk.band.as_str());
    println!("   Deal grade: {}", result.deal_grade.as_str());

    println!("\n📋 Adjustment breakdown:");
    for line in &result.adjustments {
        print!("   {:<18} {:>12.0}  → {:>12.0}", line.label, line.delta, line.subtotal);
        match &line.note {
            Some(note) => println!("  ({})", note),
            None => println!(),
        }
    }

    println!("\n🏷️  Rental: ${:.0}/mo ({})",
        result.rental.monthly_rate,
        if result.rental.calibrated { "calibrated" } else { "default model" });
    println!("   Comparable sales matched: {}", result.comparables.sales.len());

    println!("\n📈 ROI scenarios over {} years:", result.roi.horizon_years);
    for scenario in &result.roi.scenarios {
        println!(
            "   {:>3.0}% utilization: rent ${:.0} vs own ${:.0} → {}",
            scenario.utilization * 100.0,
            scenario.rental_total_cost,
            scenario.purchase_total_cost,
            if scenario.rental_recommended { "rent" } else { "buy" }
        );
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 Demo complete (valuation {})", result.valuation_id);

    Ok(())
}

fn run_reference() -> Result<()> {
    println!("🗄️  Crane Valuation - Reference Data");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let engine = ValuationEngine::from_data_dir(data_dir())?;
    let snapshot = engine.store().snapshot();

    println!("\n✓ Dataset fingerprint: {}", snapshot.fingerprint);
    println!("✓ Loaded at: {}", snapshot.loaded_at);
    println!("✓ Rate table entries: {}", snapshot.rates.len());
    println!("✓ Comparable sales: {}", snapshot.comparables.len());

    println!("\n📊 Rate bands:");
    for entry in &snapshot.rates {
        println!(
            "   {:<14} {:<18} {:>6.0}-{:<6.0}t  ${:>7.0}/mo  (ratio {:.2}, {})",
            entry.region.as_str(),
            entry.equipment_class.as_str(),
            entry.capacity_low,
            entry.capacity_high,
            entry.monthly_rate,
            entry.operated_bare_ratio,
            entry.source
        );
    }

    Ok(())
}
