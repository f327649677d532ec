//! In-memory backend (no persistence)
//!
//! Keeps inserted keys in a set. It's useful for:
//! - Dry runs of the harness without a database server
//! - Testing the dispatcher and metrics wiring
//!
//! Keys are unique just like the `users.user_id` primary key, so duplicate
//! inserts fail the same way they do against a real engine.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::contract::Backend;
use super::error::{BackendError, BackendResult};
use crate::config::Engine;
use crate::metrics::{MetricsRegistry, Operation};

/// In-memory backend
pub struct MemoryBackend {
    keys: RwLock<HashSet<String>>,
    metrics: Arc<MetricsRegistry>,
    online: AtomicBool,
}

impl MemoryBackend {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            keys: RwLock::new(HashSet::new()),
            metrics,
            online: AtomicBool::new(true),
        }
    }

    /// Simulate the database going away (or coming back)
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.keys.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.keys.read().await.is_empty()
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, key: &str) -> BackendResult<String> {
        self.metrics
            .instrument(Operation::Get, async {
                let statement = format!("lookup {key}");
                if !self.is_online() {
                    return Err(BackendError::lookup(&statement, "backend offline"));
                }

                self.keys
                    .read()
                    .await
                    .get(key)
                    .cloned()
                    .ok_or_else(|| BackendError::lookup(&statement, "no such key"))
            })
            .await
    }

    async fn insert(&self, key: &str) -> BackendResult<()> {
        self.metrics
            .instrument(Operation::Add, async {
                if !self.is_online() {
                    return Err(BackendError::write(key, "backend offline"));
                }

                if self.keys.write().await.insert(key.to_string()) {
                    trace!("in-memory backend: stored {key}");
                    Ok(())
                } else {
                    debug!("in-memory backend: duplicate key {key}");
                    Err(BackendError::write(key, "duplicate key"))
                }
            })
            .await
    }

    async fn ping(&self) -> BackendResult<()> {
        if self.is_online() {
            Ok(())
        } else {
            Err(BackendError::Connectivity(
                "in-memory backend is offline".to_string(),
            ))
        }
    }

    async fn close(&self) {
        debug!("closing in-memory backend");
        self.set_online(false);
    }

    fn engine(&self) -> Engine {
        Engine::Memory
    }
}
