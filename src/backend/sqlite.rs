//! SQLite backend implementation
//!
//! Runs the benchmark against a local database file. Useful to check the
//! harness itself or to get a baseline without standing up a server.
//!
//! ## Configuration
//!
//! - **WAL mode**: readers don't block the writer
//! - **Busy timeout**: workers wait on lock contention instead of failing
//!
//! Writes still serialize on the database lock, so raising the pool size
//! mostly measures contention.

use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use tracing::{info, instrument};

use super::error::{BackendError, BackendResult};
use super::pool_options;
use crate::config::{ConnectionParameters, Engine};
use crate::metrics::MetricsRegistry;

const INSERT_STATEMENT: &str = "INSERT INTO users (user_id) VALUES (?)";
const GET_STATEMENT: &str = "SELECT user_id FROM users WHERE user_id = ?";

/// SQLite backend
pub struct SqliteBackend {
    pool: SqlitePool,
    metrics: Arc<MetricsRegistry>,
    db_path: String,
}

impl SqliteBackend {
    pub fn connect_options(params: &ConnectionParameters) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&params.database)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30))
    }

    /// Open (and create if missing) the database file named by `database`
    #[instrument(skip_all, fields(path = %params.database))]
    pub async fn open(
        params: &ConnectionParameters,
        metrics: Arc<MetricsRegistry>,
    ) -> BackendResult<Self> {
        info!("initializing SQLite backend at: {}", params.database);

        let pool = pool_options(params)
            .connect_with(Self::connect_options(params))
            .await
            .map_err(|e| BackendError::Connectivity(e.to_string()))?;

        info!("SQLite connection pool created");

        Ok(Self {
            pool,
            metrics,
            db_path: params.database.clone(),
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }
}

sql_backend!(
    SqliteBackend,
    Engine::Sqlite,
    "sqlite",
    insert: INSERT_STATEMENT,
    get: GET_STATEMENT,
);
