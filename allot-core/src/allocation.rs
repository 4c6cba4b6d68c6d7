use crate::error::AllotError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PROJECT_CODE_FIELD: &str = "ProjectCode";
pub const START_DATE_FIELD: &str = "AllocStartDate";
pub const END_DATE_FIELD: &str = "AllocEndDate";

/// One allocation entry from the backing dataset.
///
/// Only `ProjectCode`, `AllocStartDate` and `AllocEndDate` are interpreted;
/// every other field is carried through untouched, in its original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationRecord(pub Map<String, Value>);

impl AllocationRecord {
    /// Raw `ProjectCode`; codes are compared as JSON values, so `1042` and
    /// `"1042"` are different projects.
    pub fn project_code(&self) -> Option<&Value> {
        self.0.get(PROJECT_CODE_FIELD)
    }

    pub fn start_date(&self) -> Option<&str> {
        self.0.get(START_DATE_FIELD).and_then(Value::as_str)
    }

    pub fn end_date(&self) -> Option<&str> {
        self.0.get(END_DATE_FIELD).and_then(Value::as_str)
    }
}

/// Filter sent to the store's allocation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationQuery {
    pub project_code: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alloc_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alloc_end_date: Option<String>,
}

impl AllocationQuery {
    pub fn new(project_code: impl Into<Value>) -> Self {
        Self {
            project_code: project_code.into(),
            alloc_start_date: None,
            alloc_end_date: None,
        }
    }

    pub fn with_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.alloc_start_date = Some(start.into());
        self.alloc_end_date = Some(end.into());
        self
    }

    /// Build a query from a request body.
    ///
    /// `projectCode` may be any non-blank JSON value. Date fields that are
    /// absent, empty or not strings are treated as not supplied.
    pub fn from_json(body: &Value) -> Result<Self, AllotError> {
        let project_code = body
            .get("projectCode")
            .filter(|code| !is_blank(code))
            .ok_or_else(|| AllotError::BadRequest("projectCode is required".into()))?;

        Ok(Self {
            project_code: project_code.clone(),
            alloc_start_date: optional_string(body, "allocStartDate"),
            alloc_end_date: optional_string(body, "allocEndDate"),
        })
    }
}

/// Blank means absent-like: null, `false`, `0`, `""`, `[]` or `{}`.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn optional_string(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
