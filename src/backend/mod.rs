//! Database backends under test
//!
//! This module provides a trait-based abstraction over the databases a
//! benchmark run can target.
//!
//! ## Design
//!
//! - **Trait-based**: `Backend` is the only thing the dispatcher sees
//! - **Async**: all operations are async and share one pool per backend
//! - **Instrumented**: every `get`/`insert` feeds the shared metrics registry
//!
//! ## Backends
//!
//! - **MySQL**: any MySQL compatible server
//! - **PostgreSQL**: any Postgres compatible server
//! - **SQLite**: local database file, no server needed
//! - **In-Memory**: no persistence, for dry runs and tests

/// `migrate` and the [`Backend`] impl for a pooled sqlx engine
///
/// The type needs a `pool` field holding the engine's sqlx pool and a
/// `metrics: Arc<MetricsRegistry>` field. Statements take the key as their
/// only bound parameter.
macro_rules! sql_backend {
    ($backend:ty, $engine:expr, $name:literal, insert: $insert:expr, get: $get:expr $(,)?) => {
        impl $backend {
            /// Apply every pending migration found in `source`
            ///
            /// Returns the number of migrations known to the migrator, applied
            /// now or earlier; nothing pending counts as success.
            #[tracing::instrument(skip(self))]
            pub async fn migrate(&self, source: &std::path::Path) -> $crate::backend::BackendResult<usize> {
                tracing::debug!("automatically migrating {}", $name);

                let migrator = $crate::backend::load_migrations(source).await?;
                migrator.run(&self.pool).await?;

                tracing::debug!("successfully migrated {}", $name);
                Ok(migrator.iter().count())
            }
        }

        #[async_trait::async_trait]
        impl $crate::backend::Backend for $backend {
            #[tracing::instrument(level = "trace", skip(self))]
            async fn get(&self, key: &str) -> $crate::backend::BackendResult<String> {
                self.metrics
                    .instrument($crate::metrics::Operation::Get, async {
                        sqlx::query_scalar::<_, String>($get)
                            .bind(key)
                            .fetch_one(&self.pool)
                            .await
                            .map_err(|e| $crate::backend::BackendError::lookup($get, e))
                    })
                    .await
            }

            #[tracing::instrument(level = "trace", skip(self))]
            async fn insert(&self, key: &str) -> $crate::backend::BackendResult<()> {
                self.metrics
                    .instrument($crate::metrics::Operation::Add, async {
                        sqlx::query($insert)
                            .bind(key)
                            .execute(&self.pool)
                            .await
                            .map(|result| {
                                tracing::trace!("insert affected {} rows", result.rows_affected())
                            })
                            .map_err(|e| {
                                tracing::debug!("failed to insert with error {e}");
                                $crate::backend::BackendError::write(key, e)
                            })
                    })
                    .await
            }

            #[tracing::instrument(level = "debug", skip(self))]
            async fn ping(&self) -> $crate::backend::BackendResult<()> {
                use sqlx::Connection;

                let mut conn = self
                    .pool
                    .acquire()
                    .await
                    .map_err(|e| $crate::backend::BackendError::Connectivity(e.to_string()))?;

                conn.ping().await.map_err(|e| {
                    tracing::debug!("failed to ping {}: {e}", $name);
                    $crate::backend::BackendError::Connectivity(e.to_string())
                })
            }

            async fn close(&self) {
                tracing::info!("closing {} backend", $name);
                self.pool.close().await;
            }

            fn engine(&self) -> $crate::config::Engine {
                $engine
            }
        }
    };
}

pub mod contract;
pub mod database;
pub mod error;
pub mod memory;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

use std::path::Path;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::pool::PoolOptions;

pub use contract::Backend;
pub use database::Database;
pub use error::{BackendError, BackendResult, BootstrapError, BootstrapStage};

use crate::config::ConnectionParameters;

/// Pool sized to `pool_size` whose connections are never retired
pub(crate) fn pool_options<DB: sqlx::Database>(params: &ConnectionParameters) -> PoolOptions<DB> {
    PoolOptions::new()
        .max_connections(params.pool_size)
        .min_connections(0)
        .idle_timeout(None)
        .max_lifetime(None)
        .acquire_timeout(Duration::from_secs(params.connect_timeout_secs))
}

/// Read the migration scripts in `source`
pub(crate) async fn load_migrations(source: &Path) -> BackendResult<Migrator> {
    Migrator::new(source.to_path_buf())
        .await
        .map_err(BackendError::from)
}
