use allot_core::{AllotError, BasicCredentials, ForwardPayload, is_blank};
use serde_json::{Map, Value};

/// Fields every gateway request must carry, in reporting order.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "username",
    "password",
    "projectCode",
    "allocStartDate",
    "allocEndDate",
];

/// Fields identifying a run for `POST /api/allocations/compare`.
pub const PAYLOAD_FIELDS: [&str; 3] = ["projectCode", "allocStartDate", "allocEndDate"];

/// A validated `POST /api/allocations` body.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub credentials: BasicCredentials,
    pub payload: ForwardPayload,
}

impl GatewayRequest {
    /// Validate a request body.
    ///
    /// A field is missing when absent or "empty": null, `false`, `0`, `""`,
    /// `[]` or `{}`. All missing names are reported at once.
    pub fn from_json(body: &Value) -> Result<Self, AllotError> {
        let fields = require(body, &REQUIRED_FIELDS)?;
        Ok(Self {
            credentials: BasicCredentials::new(as_text(&fields["username"]), as_text(&fields["password"])),
            payload: payload_of(fields),
        })
    }
}

/// Validate a comparison body: the three payload fields, same rules as
/// [`GatewayRequest::from_json`]. Credentials are not needed.
pub fn parse_payload(body: &Value) -> Result<ForwardPayload, AllotError> {
    require(body, &PAYLOAD_FIELDS).map(payload_of)
}

fn require<'a>(body: &'a Value, required: &[&str]) -> Result<&'a Map<String, Value>, AllotError> {
    let fields = body
        .as_object()
        .filter(|map| !map.is_empty())
        .ok_or_else(|| AllotError::BadRequest("No JSON data provided".into()))?;

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| fields.get(*name).is_none_or(is_blank))
        .collect();
    if !missing.is_empty() {
        return Err(AllotError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    Ok(fields)
}

fn payload_of(fields: &Map<String, Value>) -> ForwardPayload {
    ForwardPayload {
        project_code: fields["projectCode"].clone(),
        alloc_start_date: fields["allocStartDate"].clone(),
        alloc_end_date: fields["allocEndDate"].clone(),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
