use crate::error::ApiError;
use crate::server::StoreState;
use allot_core::{AllotError, BasicCredentials};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Basic-auth guard for the store's allocation endpoint.
///
/// Runs before content-type and body validation, so an unauthenticated
/// caller always gets 401 regardless of what it sent.
pub async fn basic_auth(
    State(state): State<Arc<StoreState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credentials = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(BasicCredentials::from_header);

    match credentials {
        Some(creds) if creds.verify_with(state.verifier.as_ref()) => Ok(next.run(request).await),
        Some(creds) => {
            warn!(username = %creds.username, "Rejected credentials");
            Err(AllotError::Unauthorized.into())
        }
        None => {
            warn!("Missing or malformed Authorization header");
            Err(AllotError::Unauthorized.into())
        }
    }
}
