use crate::error::ApiResult;
use crate::server::StoreState;
use axum::extract::State;
use axum::response::Json;
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// `GET /health` on the store: total record count, no filtering.
pub async fn store_health(State(state): State<Arc<StoreState>>) -> ApiResult<Json<Value>> {
    let records = state.load_records().await?;
    Ok(Json(json!({
        "status": "healthy",
        "data_records": records.len(),
    })))
}

/// `POST /reload-data`. There is nothing cached to refresh; this reads the
/// file once more and reports what it found.
pub async fn reload_data(State(state): State<Arc<StoreState>>) -> ApiResult<Json<Value>> {
    let records = state.load_records().await?;
    info!(records = records.len(), path = %state.dataset.path().display(), "Data reloaded");
    Ok(Json(json!({
        "message": "Data reloaded successfully",
        "records": records.len(),
    })))
}

/// `GET /api/health` on the gateway.
pub async fn gateway_health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
