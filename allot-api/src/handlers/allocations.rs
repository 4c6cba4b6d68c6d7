use crate::error::ApiResult;
use crate::server::StoreState;
use allot_core::{AllocationQuery, AllocationRecord, AllotError};
use allot_store::filter_allocations;
use axum::{
    extract::State,
    http::{HeaderMap, header::CONTENT_TYPE},
    response::Json,
};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// `POST /AlconNxt/Allocation/GetProjectAllocations`
pub async fn get_project_allocations(
    State(state): State<Arc<StoreState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Vec<AllocationRecord>>> {
    if !is_json_content(&headers) {
        return Err(AllotError::BadRequest("Content-Type must be application/json".into()).into());
    }

    let body: Value = serde_json::from_slice(&body)
        .map_err(|_| AllotError::BadRequest("Request body must be valid JSON".into()))?;
    let query = AllocationQuery::from_json(&body)?;

    let records = state.load_records().await?;
    let total = records.len();
    let matches = filter_allocations(records, &query);

    info!(
        project = %query.project_code,
        total,
        matched = matches.len(),
        "Allocations served"
    );
    Ok(Json(matches))
}

/// Media-type essence must be `application/json`; parameters are ignored.
fn is_json_content(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}
