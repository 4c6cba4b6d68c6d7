//! One-file-per-call audit trail.
//!
//! Every gateway exchange is written as a pretty-printed JSON document named
//! after the second it completed in: `allocation_20250115_093000.json`.
//!
//! Files are opened with `create_new`, so an existing audit file is never
//! overwritten. When two calls land in the same second the later one gets a
//! numeric suffix (`allocation_20250115_093000_1.json`, `_2`, ...).
//!
//! The same directory doubles as the history that later runs are compared
//! against, so the writer can also read its records back.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Upper bound on same-second suffixes before giving up.
const MAX_SUFFIX: u32 = 10_000;

// ── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AuditFileConfig {
    /// Directory receiving the audit files. Created on demand.
    pub dir: PathBuf,
    /// File name prefix, before the timestamp.
    pub prefix: String,
}

impl Default for AuditFileConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("response_data"),
            prefix: "allocation".to_string(),
        }
    }
}

impl AuditFileConfig {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }
}

// ── Writer ───────────────────────────────────────────────────────────────────

pub struct AuditFileWriter {
    config: AuditFileConfig,
}

impl AuditFileWriter {
    /// Create a writer, making sure the audit directory exists.
    pub fn new(config: AuditFileConfig) -> io::Result<Self> {
        fs::create_dir_all(&config.dir)?;
        info!(dir = %config.dir.display(), "Audit file writer ready");
        Ok(Self { config })
    }

    /// Load every audit file that deserializes as `T`, in no particular
    /// order. A missing directory yields nothing; files that fail to read or
    /// parse are skipped.
    pub fn read_records<T: DeserializeOwned>(&self) -> io::Result<Vec<T>> {
        let entries = match fs::read_dir(&self.config.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let prefix = format!("{}_", self.config.prefix);
        let mut records = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_audit_file = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".json"));
            if !is_audit_file {
                continue;
            }

            let parsed = fs::read(&path)
                .and_then(|bytes| serde_json::from_slice(&bytes).map_err(io::Error::other));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping audit file"),
            }
        }
        Ok(records)
    }

    /// Persist one record stamped `at`. Returns the path written.
    pub fn write_record<T: Serialize>(&self, record: &T, at: DateTime<Utc>) -> io::Result<PathBuf> {
        // The directory may have been removed since startup.
        fs::create_dir_all(&self.config.dir)?;

        let stem = file_stem(&self.config.prefix, at);
        for attempt in 0..=MAX_SUFFIX {
            let path = candidate_path(&self.config.dir, &stem, attempt);
            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(f) => f,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };

            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, record).map_err(io::Error::other)?;
            writer.flush()?;

            debug!(path = %path.display(), "Audit record written");
            return Ok(path);
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free audit file name for {stem}"),
        ))
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// `allocation` + 2025-01-15T09:30:00Z → `allocation_20250115_093000`.
fn file_stem(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}_{}", at.format("%Y%m%d_%H%M%S"))
}

fn candidate_path(dir: &Path, stem: &str, attempt: u32) -> PathBuf {
    if attempt == 0 {
        dir.join(format!("{stem}.json"))
    } else {
        dir.join(format!("{stem}_{attempt}.json"))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
