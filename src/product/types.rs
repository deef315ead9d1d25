// Product record types
// Stored entity plus the request body shapes for create and update

use serde::{Deserialize, Serialize};

/// A product held in the store, keyed by `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
}

/// POST body
///
/// Every field is optional at the wire level so that a missing field is
/// reported as invalid product data instead of a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl NewProduct {
    /// Turn the body into a storable product.
    ///
    /// `id` and `name` must be supplied and non-empty, `price` must be
    /// supplied and finite. Zero is a valid price.
    pub fn into_product(self) -> Option<Product> {
        let id = self.id.filter(|id| !id.is_empty())?;
        let name = self.name.filter(|name| !name.is_empty())?;
        let price = self.price.filter(|price| price.is_finite())?;
        Some(Product { id, name, price })
    }
}

/// PUT body, `None` means "leave unchanged"
#[derive(Debug, Default, Deserialize)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl ProductPatch {
    /// Whether a supplied name would clear the product's name
    pub fn clears_name(&self) -> bool {
        self.name.as_deref().is_some_and(str::is_empty)
    }

    /// Overwrite the supplied fields on `product`
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
    }
}
