//! HTTP protocol layer module
//!
//! Response builders and request decoding helpers, decoupled from the
//! product logic itself.

pub mod query;
pub mod response;

// Re-export commonly used items
pub use query::query_param;
pub use response::{
    build_404_response, build_413_response, build_failure_response, build_health_response,
    build_product_response,
};
