//! In-memory product store
//!
//! Owned by `AppState` and handed to the product handler. Every operation
//! takes the lock once and releases it before returning, so a single
//! read, insert, field update or delete is never observed half-done.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::product::{Product, ProductPatch};

#[derive(Debug, Default)]
pub struct ProductStore {
    products: RwLock<BTreeMap<String, Product>>,
}

impl ProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the map half-written,
    // so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Product>> {
        self.products.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Product>> {
        self.products.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of every product, ordered by id
    pub fn list(&self) -> Vec<Product> {
        self.read().values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Product> {
        self.read().get(id).cloned()
    }

    /// Insert `product`, replacing any record with the same id.
    /// Returns the replaced record.
    pub fn upsert(&self, product: Product) -> Option<Product> {
        self.write().insert(product.id.clone(), product)
    }

    /// Apply `patch` to the product stored under `id`.
    /// Returns the updated record, or `None` if no such product exists.
    pub fn update(&self, id: &str, patch: ProductPatch) -> Option<Product> {
        let mut products = self.write();
        let product = products.get_mut(id)?;
        patch.apply(product);
        let updated = product.clone();
        drop(products);
        Some(updated)
    }

    pub fn remove(&self, id: &str) -> Option<Product> {
        self.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn product(id: &str, name: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            price,
        }
    }

    #[test]
    fn test_starts_empty() {
        let store = ProductStore::new();
        assert!(store.is_empty());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_upsert_replaces_whole_record() {
        let store = ProductStore::new();
        assert!(store.upsert(product("p1", "A", 1.0)).is_none());
        let old = store.upsert(product("p1", "B", 2.0)).unwrap();
        assert_eq!(old.name, "A");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("p1").unwrap(), product("p1", "B", 2.0));
    }

    #[test]
    fn test_update_missing_returns_none() {
        let store = ProductStore::new();
        assert!(store.update("missing", ProductPatch::default()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_is_snapshot() {
        let store = ProductStore::new();
        store.upsert(product("p2", "B", 2.0));
        store.upsert(product("p1", "A", 1.0));
        let snapshot = store.list();
        store.remove("p1");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, "p1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_keys_match_ids() {
        let store = ProductStore::new();
        store.upsert(product("a", "A", 1.0));
        store.upsert(product("b", "B", 1.0));
        for (key, value) in store.read().iter() {
            assert_eq!(key, &value.id);
        }
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(ProductStore::new());
        store.upsert(product("p1", "A", 0.0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.upsert(product(&format!("t{i}"), "T", 1.0));
                        store.update(
                            "p1",
                            ProductPatch {
                                name: Some(format!("writer-{i}")),
                                price: None,
                            },
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 9);
        assert!(store.get("p1").unwrap().name.starts_with("writer-"));
    }
}
