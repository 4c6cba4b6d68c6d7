use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decides whether a username/password pair may access the store.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Accepts exactly one configured pair.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

impl<F> CredentialVerifier for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn verify(&self, username: &str, password: &str) -> bool {
        self(username, password)
    }
}

/// Username/password carried in an `Authorization: Basic ...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse an `Authorization` header value. Returns `None` for any other
    /// scheme, bad base64, non-UTF-8 content or a missing `:` separator.
    pub fn from_header(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self::new(username, password))
    }

    /// Render as an `Authorization` header value.
    pub fn to_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }

    pub fn verify_with(&self, verifier: &dyn CredentialVerifier) -> bool {
        verifier.verify(&self.username, &self.password)
    }
}
