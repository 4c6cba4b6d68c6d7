pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::ApiError;
pub use server::{GatewayState, StoreState, build_gateway_router, build_store_router, serve};
