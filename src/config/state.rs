// Application state module
// Shared between connections: configuration, the product store, counters

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use super::types::Config;
use crate::store::ProductStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: ProductStore,

    /// Active connection count, checked against `max_connections`
    pub active_connections: Arc<AtomicUsize>,
}

impl AppState {
    /// Create `AppState` with an empty product store
    pub fn new(config: &Config) -> Self {
        Self::with_store(config, ProductStore::new())
    }

    pub fn with_store(config: &Config, store: ProductStore) -> Self {
        Self {
            config: config.clone(),
            store,
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }
}
