use thiserror::Error;

/// Generic message returned to callers for every internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Unified error type for Allot.
#[derive(Error, Debug)]
pub enum AllotError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Endpoint not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal: {0}")]
    Internal(String),
}

/// Coarse classification of an [`AllotError`], used at the HTTP edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    Internal,
}

impl AllotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AllotError::BadRequest(_) => ErrorKind::BadRequest,
            AllotError::Unauthorized => ErrorKind::Unauthorized,
            AllotError::NotFound => ErrorKind::NotFound,
            AllotError::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            AllotError::Io(_) | AllotError::Serde(_) | AllotError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Map to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Internal => 500,
        }
    }

    /// Message that is safe to hand back to a client. Internal details are
    /// replaced by [`INTERNAL_ERROR_MESSAGE`].
    pub fn safe_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    /// JSON error body: `{"success":false,"error":"..."}`.
    pub fn to_json_body(&self) -> serde_json::Value {
        serde_json::json!({
            "success": false,
            "error": self.safe_message(),
        })
    }
}
