//! Handler Registry Service
//!
//! Maps registry keys (`web`, `voice`, ...) to handler instances.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::ports::Handler;

/// Shared, mutable map from key to handler.
///
/// Readers (the dispatcher) and the single writer path (registration) may run
/// concurrently; a registration is visible to every dispatch that starts after
/// it returns.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the handler under `key`.
    pub async fn register(&self, key: impl Into<String>, handler: Arc<dyn Handler>) {
        let key = key.into();
        info!(key = %key, handler = handler.name(), "registering handler");
        self.handlers.write().await.insert(key, handler);
    }

    pub async fn get(&self, key: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.read().await.get(key).cloned()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.handlers.read().await.contains_key(key)
    }

    /// Registered keys in sorted order.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.handlers.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.handlers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.handlers.read().await.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry").finish_non_exhaustive()
    }
}
