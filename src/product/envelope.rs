// Response envelope
// { "success": bool, "data"?: ..., "message"?: "..." }

use hyper::StatusCode;
use serde::Serialize;

use super::error::ProductError;
use super::types::Product;

/// Payload carried by a success envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    One(Product),
    Many(Vec<Product>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub const fn data(data: Payload) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Status code plus envelope, what the handler hands back to the host
#[derive(Debug, Clone, PartialEq)]
pub struct ProductResponse {
    pub status: StatusCode,
    pub body: Envelope,
}

impl ProductResponse {
    pub const fn new(status: StatusCode, body: Envelope) -> Self {
        Self { status, body }
    }

    pub const fn is_success(&self) -> bool {
        self.body.success
    }

    pub fn message(&self) -> Option<&str> {
        self.body.message.as_deref()
    }
}

impl From<ProductError> for ProductResponse {
    fn from(err: ProductError) -> Self {
        Self::new(err.status(), Envelope::failure(err.to_string()))
    }
}
