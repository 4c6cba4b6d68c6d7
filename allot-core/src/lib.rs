pub mod allocation;
pub mod config;
pub mod credentials;
pub mod envelope;
pub mod error;

pub use allocation::{AllocationQuery, AllocationRecord, is_blank};
pub use config::AllotConfig;
pub use credentials::{BasicCredentials, CredentialVerifier, StaticCredentials};
pub use envelope::{AllocationEnvelope, ForwardPayload};
pub use error::{AllotError, ErrorKind};
