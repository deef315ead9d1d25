// Product handler failures
// Each variant is an ordinary response, never a fault

use hyper::StatusCode;
use thiserror::Error;

/// Why a product request was refused
///
/// The `Display` text is the message placed in the failure envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("Invalid product data. 'id', 'name', and 'price' are required.")]
    InvalidProduct,

    #[error("Invalid product data. 'name' must not be empty.")]
    EmptyName,

    #[error("Product ID is required for {action}.")]
    MissingId { action: &'static str },

    #[error("Product with ID \"{id}\" not found.")]
    NotFound { id: String },

    #[error("Method {method} not allowed.")]
    MethodNotAllowed { method: String },

    #[error("Invalid request body: {reason}")]
    MalformedBody { reason: String },
}

impl ProductError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidProduct
            | Self::EmptyName
            | Self::MissingId { .. }
            | Self::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl From<serde_json::Error> for ProductError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedBody {
            reason: err.to_string(),
        }
    }
}
