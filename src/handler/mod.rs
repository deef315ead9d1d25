//! Request handler module
//!
//! Routes incoming HTTP requests to the product handler or the health probes.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
