pub mod dataset;
pub mod filter;

pub use dataset::DatasetSource;
pub use filter::{DateRange, filter_allocations, parse_date};
