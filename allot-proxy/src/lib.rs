pub mod client;
pub mod compare;
pub mod forwarder;
pub mod request;

pub use client::{ForwardError, HttpUpstream, UpstreamClient, UpstreamResponse};
pub use compare::{Comparison, ComparisonReport, compare, compare_latest_runs};
pub use forwarder::Forwarder;
pub use request::{GatewayRequest, parse_payload};
