use crate::client::{ForwardError, UpstreamClient, UpstreamResponse};
use crate::compare::{ComparisonReport, compare_latest_runs};
use crate::request::GatewayRequest;
use allot_core::{AllocationEnvelope, AllotError, ForwardPayload};
use allot_observability::AuditFileWriter;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Relays one gateway request to the store and records the exchange.
///
/// The returned envelope is always a value, never an error: every upstream
/// failure is folded into `success = false` with a classified message.
#[derive(Clone)]
pub struct Forwarder {
    upstream: Arc<dyn UpstreamClient>,
    audit: Arc<AuditFileWriter>,
}

impl Forwarder {
    pub fn new(upstream: Arc<dyn UpstreamClient>, audit: Arc<AuditFileWriter>) -> Self {
        Self { upstream, audit }
    }

    pub async fn forward(&self, request: GatewayRequest) -> AllocationEnvelope {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "forward",
            %request_id,
            project = %request.payload.project_code,
        );

        async move {
            info!("Forwarding allocation request");
            let result = self
                .upstream
                .post_allocations(&request.credentials, &request.payload)
                .await;
            let envelope = envelope_for(result, request.payload);

            match envelope.status_code {
                0 => error!(error = envelope.error.as_deref().unwrap_or_default(), "Upstream call failed"),
                status => info!(status, success = envelope.success, "Upstream call completed"),
            }

            self.persist(&envelope).await;
            envelope
        }
        .instrument(span)
        .await
    }

    /// Diff the two most recent successful runs on record for `payload`.
    /// The audit directory is the run history.
    pub async fn compare_runs(&self, payload: ForwardPayload) -> Result<ComparisonReport, AllotError> {
        let audit = Arc::clone(&self.audit);
        let history = tokio::task::spawn_blocking(move || audit.read_records::<AllocationEnvelope>())
            .await
            .map_err(|e| AllotError::Internal(format!("audit read task failed: {e}")))??;

        let report = compare_latest_runs(history, payload);
        info!(
            project = %report.request_payload.project_code,
            runs = report.runs,
            net_change = ?report.comparison.as_ref().map(|c| c.summary.net_change),
            "Compared allocation runs"
        );
        Ok(report)
    }

    /// Write the audit record. A failure here is logged and otherwise
    /// ignored so the caller still receives the envelope.
    async fn persist(&self, envelope: &AllocationEnvelope) {
        let audit = Arc::clone(&self.audit);
        let record = envelope.clone();
        let written =
            tokio::task::spawn_blocking(move || audit.write_record(&record, record.timestamp)).await;

        match written {
            Ok(Ok(path)) => info!(path = %path.display(), "Audit record saved"),
            Ok(Err(e)) => error!(error = %e, "Failed to write audit record"),
            Err(e) => error!(error = %e, "Audit writer task failed"),
        }
    }
}

/// Classify an upstream outcome into the result envelope.
pub fn envelope_for(
    result: Result<UpstreamResponse, ForwardError>,
    payload: ForwardPayload,
) -> AllocationEnvelope {
    let response = match result {
        Ok(response) => response,
        Err(ForwardError::Timeout) => return AllocationEnvelope::timed_out(payload),
        Err(ForwardError::Connect(detail)) => {
            warn!(%detail, "Store unreachable");
            return AllocationEnvelope::unreachable(payload);
        }
        Err(ForwardError::Other(detail)) => return AllocationEnvelope::unexpected(payload, detail),
    };

    let data = if response.status == 200 && !response.body.is_empty() {
        match serde_json::from_str(&response.body) {
            Ok(value) => Some(value),
            Err(e) => return AllocationEnvelope::unexpected(payload, e),
        }
    } else {
        None
    };

    AllocationEnvelope::completed(
        response.status,
        data,
        response.body,
        payload,
        response.headers,
    )
}
