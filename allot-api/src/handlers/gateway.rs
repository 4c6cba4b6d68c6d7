use crate::error::ApiResult;
use crate::server::GatewayState;
use allot_core::AllocationEnvelope;
use allot_proxy::{ComparisonReport, GatewayRequest, parse_payload};
use axum::extract::State;
use axum::response::Json;
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;

/// `POST /api/allocations`
///
/// Validation failures are 400s. Once validated, the upstream outcome is
/// always reported with a 200 and `success` in the envelope.
pub async fn get_allocations(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> ApiResult<Json<AllocationEnvelope>> {
    let request = GatewayRequest::from_json(&json_or_null(&body))?;
    Ok(Json(state.forwarder.forward(request).await))
}

/// `POST /api/allocations/compare`: diff the latest two successful runs
/// recorded for `{projectCode, allocStartDate, allocEndDate}`.
pub async fn compare_allocations(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> ApiResult<Json<ComparisonReport>> {
    let payload = parse_payload(&json_or_null(&body))?;
    Ok(Json(state.forwarder.compare_runs(payload).await?))
}

/// Unparsable bodies read as `null`, which validation reports as
/// "No JSON data provided".
fn json_or_null(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}
