// Crane Valuation Engine - Web Server
// REST API with Axum

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crane_valuation::{ValidationError, ValuationEngine, ValuationRequest};

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<ValuationEngine>,
    data_dir: String,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

/// Reference dataset status
#[derive(Serialize)]
struct ReferenceStatus {
    fingerprint: String,
    loaded_at: String,
    rate_entries: usize,
    comparable_sales: usize,
}

/// Validation failure payload: every field error at once
#[derive(Serialize)]
struct ValidationFailure {
    success: bool,
    errors: Vec<ValidationError>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/valuations - Appraise one machine
async fn create_valuation(
    State(state): State<AppState>,
    Json(request): Json<ValuationRequest>,
) -> impl IntoResponse {
    match state.engine.appraise(&request) {
        Ok(result) => (StatusCode::OK, Json(ApiResponse::ok(result))).into_response(),
        Err(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationFailure {
                success: false,
                errors,
            }),
        )
            .into_response(),
    }
}

/// GET /api/reference/status - Loaded dataset version and row counts
async fn reference_status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.engine.store().snapshot();

    Json(ApiResponse::ok(ReferenceStatus {
        fingerprint: snapshot.fingerprint.clone(),
        loaded_at: snapshot.loaded_at.to_rfc3339(),
        rate_entries: snapshot.rates.len(),
        comparable_sales: snapshot.comparables.len(),
    }))
}

/// POST /api/reference/reload - Re-read the reference files and swap the
/// snapshot atomically. In-flight valuations keep the snapshot they started
/// with; a failed reload leaves the current one in place.
async fn reference_reload(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.store().reload(&state.data_dir) {
        Ok(()) => {
            let snapshot = state.engine.store().snapshot();
            println!("🔄 Reference data reloaded (dataset {})", &snapshot.fingerprint[..12]);

            (
                StatusCode::OK,
                Json(ApiResponse::ok(ReferenceStatus {
                    fingerprint: snapshot.fingerprint.clone(),
                    loaded_at: snapshot.loaded_at.to_rfc3339(),
                    rate_entries: snapshot.rates.len(),
                    comparable_sales: snapshot.comparables.len(),
                })),
            )
                .into_response()
        }
        Err(e) => {
            eprintln!("Error reloading reference data: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(format!("{:#}", e))),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("🌐 Crane Valuation Engine - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let data_dir =
        std::env::var("CRANE_DATA_DIR").unwrap_or_else(|_| "data".to_string());

    let engine = match ValuationEngine::from_data_dir(&data_dir) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("❌ Failed to initialize engine: {:#}", e);
            eprintln!("   Reference data expected in ./{} (override with CRANE_DATA_DIR)", data_dir);
            std::process::exit(1);
        }
    };

    let snapshot = engine.store().snapshot();
    println!(
        "✓ Reference data loaded: {} rate bands, {} comparable sales",
        snapshot.rates.len(),
        snapshot.comparables.len()
    );
    println!("✓ Dataset fingerprint: {}", &snapshot.fingerprint[..12]);

    // Create shared state
    let state = AppState {
        engine: Arc::new(engine),
        data_dir,
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/valuations", post(create_valuation))
        .route("/reference/status", get(reference_status))
        .route("/reference/reload", post(reference_reload))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("❌ Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    println!("\n🚀 Server running on http://localhost:3000");
    println!("   POST http://localhost:3000/api/valuations");
    println!("   GET  http://localhost:3000/api/reference/status");
    println!("\n   Press Ctrl+C to stop\n");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("❌ Server error: {}", e);
        std::process::exit(1);
    }
}
