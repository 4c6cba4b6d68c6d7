//! Result envelope returned by the gateway for every forwarded call.
//!
//! The same structure is persisted verbatim as the audit record, so a file
//! under the audit directory is exactly what the caller received.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const TIMEOUT_MESSAGE: &str = "Request timeout - the server took too long to respond";
pub const CONNECTION_MESSAGE: &str = "Connection error - unable to reach the server";

/// Query parameters relayed to the store. Values are forwarded exactly as
/// the gateway caller sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardPayload {
    pub project_code: Value,
    pub alloc_start_date: Value,
    pub alloc_end_date: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEnvelope {
    /// Upstream HTTP status; 0 when the call never completed.
    pub status_code: u16,
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub request_payload: ForwardPayload,
    pub timestamp: DateTime<Utc>,
    /// Only present when the upstream answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<BTreeMap<String, String>>,
}

impl AllocationEnvelope {
    /// Envelope for a call that reached the upstream and got a response.
    ///
    /// A 200 carries the decoded body in `data`; anything else carries the
    /// raw body text in `error`.
    pub fn completed(
        status_code: u16,
        data: Option<Value>,
        body_text: String,
        request_payload: ForwardPayload,
        response_headers: BTreeMap<String, String>,
    ) -> Self {
        let success = status_code == 200;
        Self {
            status_code,
            success,
            data: if success { data } else { None },
            error: if success { None } else { Some(body_text) },
            request_payload,
            timestamp: Utc::now(),
            response_headers: Some(response_headers),
        }
    }

    /// Envelope for a call that never produced a usable response.
    pub fn failed(request_payload: ForwardPayload, message: impl Into<String>) -> Self {
        Self {
            status_code: 0,
            success: false,
            data: None,
            error: Some(message.into()),
            request_payload,
            timestamp: Utc::now(),
            response_headers: None,
        }
    }

    pub fn timed_out(request_payload: ForwardPayload) -> Self {
        Self::failed(request_payload, TIMEOUT_MESSAGE)
    }

    pub fn unreachable(request_payload: ForwardPayload) -> Self {
        Self::failed(request_payload, CONNECTION_MESSAGE)
    }

    pub fn unexpected(request_payload: ForwardPayload, detail: impl std::fmt::Display) -> Self {
        Self::failed(request_payload, format!("Unexpected error: {detail}"))
    }
}
