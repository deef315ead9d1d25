//! Product request dispatch
//!
//! Routes a request by method to list/get, create, update or delete,
//! and turns every outcome, including refusals, into a `ProductResponse`.

use hyper::body::Bytes;
use hyper::StatusCode;
use serde::de::DeserializeOwned;

use super::envelope::{Envelope, Payload, ProductResponse};
use super::error::ProductError;
use super::types::{NewProduct, ProductPatch};
use crate::store::ProductStore;

/// What the host extracted from an HTTP request
#[derive(Debug, Clone, Default)]
pub struct ProductRequest {
    /// HTTP method, any case
    pub method: String,
    /// `id` query parameter; an empty value counts as absent
    pub id: Option<String>,
    pub body: Bytes,
}

impl ProductRequest {
    pub fn new(method: impl Into<String>, id: Option<&str>) -> Self {
        Self {
            method: method.into(),
            id: id.map(ToString::to_string),
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

type HandlerResult = Result<ProductResponse, ProductError>;

/// Handle one product request against `store`
pub fn handle(req: &ProductRequest, store: &ProductStore) -> ProductResponse {
    let method = req.method.to_ascii_uppercase();

    let result = match method.as_str() {
        "GET" => match req.id() {
            Some(id) => get_product(store, id),
            None => Ok(list_products(store)),
        },
        "POST" => create_product(store, &req.body),
        "PUT" => update_product(store, req.id(), &req.body),
        "DELETE" => delete_product(store, req.id()),
        _ => Err(ProductError::MethodNotAllowed { method }),
    };

    result.unwrap_or_else(ProductResponse::from)
}

/// Parse a JSON object body. Arrays are refused even though serde would
/// fill struct fields from them by position.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ProductError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(ProductError::MalformedBody {
            reason: "expected a JSON object".to_string(),
        });
    }
    Ok(serde_json::from_value(value)?)
}

fn list_products(store: &ProductStore) -> ProductResponse {
    let products = store.list();
    tracing::debug!(count = products.len(), "listing products");
    ProductResponse::new(StatusCode::OK, Envelope::data(Payload::Many(products)))
}

fn get_product(store: &ProductStore, id: &str) -> HandlerResult {
    let product = store.get(id).ok_or_else(|| ProductError::NotFound { id: id.to_string() })?;
    Ok(ProductResponse::new(
        StatusCode::OK,
        Envelope::data(Payload::One(product)),
    ))
}

fn create_product(store: &ProductStore, body: &[u8]) -> HandlerResult {
    let product = parse_body::<NewProduct>(body)?
        .into_product()
        .ok_or(ProductError::InvalidProduct)?;

    let id = product.id.clone();
    if store.upsert(product.clone()).is_some() {
        tracing::debug!(%id, "product replaced");
    } else {
        tracing::debug!(%id, "product created");
    }

    Ok(ProductResponse::new(
        StatusCode::CREATED,
        Envelope::data(Payload::One(product))
            .with_message(format!("Product with ID \"{id}\" created.")),
    ))
}

fn update_product(store: &ProductStore, id: Option<&str>, body: &[u8]) -> HandlerResult {
    let id = id.ok_or(ProductError::MissingId { action: "updating" })?;
    let patch = parse_body::<ProductPatch>(body)?;
    if patch.clears_name() {
        return Err(ProductError::EmptyName);
    }

    let product = store
        .update(id, patch)
        .ok_or_else(|| ProductError::NotFound { id: id.to_string() })?;
    tracing::debug!(%id, "product updated");

    Ok(ProductResponse::new(
        StatusCode::OK,
        Envelope::data(Payload::One(product))
            .with_message(format!("Product with ID \"{id}\" updated.")),
    ))
}

fn delete_product(store: &ProductStore, id: Option<&str>) -> HandlerResult {
    let id = id.ok_or(ProductError::MissingId { action: "deletion" })?;
    let product = store
        .remove(id)
        .ok_or_else(|| ProductError::NotFound { id: id.to_string() })?;
    tracing::debug!(%id, "product deleted");

    Ok(ProductResponse::new(
        StatusCode::OK,
        Envelope::data(Payload::One(product))
            .with_message(format!("Product with ID \"{id}\" deleted.")),
    ))
}
