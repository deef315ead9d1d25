//! Product module
//!
//! The CRUD core: record types, the response envelope and the
//! method dispatcher. Independent of the HTTP host.

mod envelope;
mod error;
mod handler;
mod types;

pub use envelope::{Envelope, ProductResponse};
pub use handler::{handle, ProductRequest};
pub use types::{Product, ProductPatch};
