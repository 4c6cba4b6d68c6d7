use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration shared by both services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllotConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Allocation Store Service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_addr")]
    pub addr: String,
    /// JSON file holding the allocation array. Read on every query.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// The single Basic-auth pair accepted by the store.
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

/// Allocation Gateway Service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_addr")]
    pub addr: String,
    /// Full URL of the store's allocation endpoint.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    /// Hard timeout for the single upstream attempt.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Directory receiving one audit file per gateway call.
    #[serde(default = "default_audit_dir")]
    pub audit_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_store_addr() -> String { "0.0.0.0:5000".into() }
fn default_data_file() -> PathBuf { PathBuf::from("data.json") }
fn default_username() -> String { "bob".into() }
fn default_password() -> String { "bob".into() }
fn default_gateway_addr() -> String { "0.0.0.0:8000".into() }
fn default_upstream_url() -> String {
    "http://localhost:5000/AlconNxt/Allocation/GetProjectAllocations".into()
}
fn default_timeout() -> u64 { 30 }
fn default_audit_dir() -> PathBuf { PathBuf::from("response_data") }
fn default_log_level() -> String { "info".into() }

// ── Impls ─────────────────────────────────────────────────────

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            addr: default_store_addr(),
            data_file: default_data_file(),
            username: default_username(),
            password: default_password(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: default_gateway_addr(),
            upstream_url: default_upstream_url(),
            timeout_secs: default_timeout(),
            audit_dir: default_audit_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AllotConfig {
    /// Load configuration from YAML file + env overrides.
    ///
    /// Environment keys use the `ALLOT_` prefix with `__` between levels,
    /// e.g. `ALLOT_GATEWAY__TIMEOUT_SECS=10`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: AllotConfig = Self::figment(path).extract()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("ALLOT_").split("__"))
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}
