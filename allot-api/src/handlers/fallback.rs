use crate::error::ApiError;
use allot_core::AllotError;
use axum::http::{StatusCode, header::ALLOW};
use axum::response::{IntoResponse, Response};

/// Router fallback for unknown paths.
pub async fn not_found() -> ApiError {
    AllotError::NotFound.into()
}

/// Replace axum's empty 405 with the JSON error body, keeping `Allow`.
pub async fn normalize_method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }
    let allow = response.headers().get(ALLOW).cloned();
    let mut normalized = ApiError(AllotError::MethodNotAllowed).into_response();
    if let Some(allow) = allow {
        normalized.headers_mut().insert(ALLOW, allow);
    }
    normalized
}
