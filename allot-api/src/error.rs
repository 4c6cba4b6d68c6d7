use allot_core::{AllotError, ErrorKind};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// HTTP-facing wrapper around [`AllotError`].
///
/// Client errors keep their message. Internal errors are logged with full
/// detail and answered with a generic message.
#[derive(Debug)]
pub struct ApiError(pub AllotError);

impl From<AllotError> for ApiError {
    fn from(err: AllotError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.0.kind() == ErrorKind::Internal {
            error!(error = %self.0, "Internal error");
        }
        (status, Json(self.0.to_json_body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
