//! Backend contract
//!
//! This module defines the `Backend` trait every database engine under test
//! implements. The dispatcher only ever talks to this trait.

use async_trait::async_trait;

use super::error::BackendResult;
use crate::config::Engine;

/// Trait for databases a benchmark can run against
///
/// ## Metrics
///
/// Every `get` and `insert` records exactly one measurement in the shared
/// [`crate::metrics::MetricsRegistry`]: a latency observation when the call
/// succeeds, an error increment when it fails. Implementations never retry.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as a single instance is shared by
/// all workers. Connection checkout is left to the driver's pool.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Look up the row keyed by `key` and return its key column
    ///
    /// Fails with `NotFoundOrQuery` if no row matches or the query fails.
    async fn get(&self, key: &str) -> BackendResult<String>;

    /// Insert one row keyed by `key`
    ///
    /// Fails with `Write` on constraint violations or lost connections.
    async fn insert(&self, key: &str) -> BackendResult<()>;

    /// Check that the database answers
    ///
    /// Fails with `Connectivity` if it does not.
    async fn ping(&self) -> BackendResult<()>;

    /// Close the backend and release its connections
    async fn close(&self);

    /// Engine serving this backend
    fn engine(&self) -> Engine;
}
