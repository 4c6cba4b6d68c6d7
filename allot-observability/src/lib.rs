pub mod audit_file_writer;
pub mod logger;

pub use audit_file_writer::{AuditFileConfig, AuditFileWriter};
pub use logger::init_tracing;
