use crate::handlers;
use crate::middleware::basic_auth;
use allot_core::config::{GatewayConfig, StoreConfig};
use allot_core::{AllocationRecord, AllotError, CredentialVerifier, StaticCredentials};
use allot_observability::{AuditFileConfig, AuditFileWriter};
use allot_proxy::{Forwarder, HttpUpstream};
use allot_store::DatasetSource;
use axum::{
    Router,
    middleware::{from_fn_with_state, map_response},
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

pub const ALLOCATIONS_PATH: &str = "/AlconNxt/Allocation/GetProjectAllocations";

// ── Store ─────────────────────────────────────────────────────

/// Shared state for the Allocation Store Service.
pub struct StoreState {
    pub dataset: DatasetSource,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl StoreState {
    pub fn new(dataset: DatasetSource, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { dataset, verifier }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(
            DatasetSource::new(&config.data_file),
            Arc::new(StaticCredentials::new(&config.username, &config.password)),
        )
    }

    /// Read the dataset off the async executor.
    pub async fn load_records(&self) -> Result<Vec<AllocationRecord>, AllotError> {
        let dataset = self.dataset.clone();
        tokio::task::spawn_blocking(move || dataset.load())
            .await
            .map_err(|e| AllotError::Internal(format!("dataset load task failed: {e}")))
    }
}

pub fn build_store_router(state: Arc<StoreState>) -> Router {
    let protected = Router::new()
        .route(ALLOCATIONS_PATH, post(handlers::allocations::get_project_allocations))
        .route_layer(from_fn_with_state(Arc::clone(&state), basic_auth));

    Router::new()
        .merge(protected)
        .route("/health", get(handlers::health::store_health))
        .route("/reload-data", post(handlers::health::reload_data))
        .fallback(handlers::fallback::not_found)
        .layer(map_response(handlers::fallback::normalize_method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Gateway ───────────────────────────────────────────────────

/// Shared state for the Allocation Gateway Service.
pub struct GatewayState {
    pub forwarder: Forwarder,
}

impl GatewayState {
    pub fn new(forwarder: Forwarder) -> Self {
        Self { forwarder }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, AllotError> {
        let upstream = HttpUpstream::new(&config.upstream_url, config.timeout())?;
        let audit = AuditFileWriter::new(AuditFileConfig::in_dir(&config.audit_dir))?;
        Ok(Self::new(Forwarder::new(Arc::new(upstream), Arc::new(audit))))
    }
}

pub fn build_gateway_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health::gateway_health))
        .route("/api/allocations", post(handlers::gateway::get_allocations))
        .route("/api/allocations/compare", post(handlers::gateway::compare_allocations))
        .fallback(handlers::fallback::not_found)
        .layer(map_response(handlers::fallback::normalize_method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Serving ───────────────────────────────────────────────────

/// Bind `addr` and serve `app` until `shutdown` resolves.
pub async fn serve<F>(name: &'static str, addr: &str, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(service = name, addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!(service = name, "Stopped");
    Ok(())
}
