//! MySQL backend implementation
//!
//! Talks to any MySQL compatible server (MySQL, MariaDB, TiDB, Vitess, ...)
//! through a bounded sqlx pool.

use std::sync::Arc;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool};
use tracing::{debug, info, instrument};

use super::error::{BackendError, BackendResult};
use super::pool_options;
use crate::config::{ConnectionParameters, Engine};
use crate::metrics::MetricsRegistry;

const INSERT_STATEMENT: &str = "INSERT INTO users (user_id) VALUES (?)";
const GET_STATEMENT: &str = "SELECT user_id FROM users WHERE user_id = ?";

/// MySQL backend
pub struct MySqlBackend {
    pool: MySqlPool,
    metrics: Arc<MetricsRegistry>,
}

impl MySqlBackend {
    /// Connection options built from the parameters, field by field
    pub fn connect_options(params: &ConnectionParameters) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port())
            .username(&params.user)
            .password(&params.password)
            .database(&params.database)
    }

    /// Open a pool of at most `pool_size` connections
    ///
    /// Connections are never recycled; the pool keeps up to `pool_size` of
    /// them idle between requests.
    #[instrument(skip_all, fields(host = %params.host, database = %params.database))]
    pub async fn open(
        params: &ConnectionParameters,
        metrics: Arc<MetricsRegistry>,
    ) -> BackendResult<Self> {
        debug!("connecting to mysql at {}:{}", params.host, params.port());

        let pool = pool_options(params)
            .connect_with(Self::connect_options(params))
            .await
            .map_err(|e| BackendError::Connectivity(e.to_string()))?;

        info!("mysql connection pool created ({} connections)", params.pool_size);

        Ok(Self { pool, metrics })
    }
}

sql_backend!(
    MySqlBackend,
    Engine::Mysql,
    "mysql",
    insert: INSERT_STATEMENT,
    get: GET_STATEMENT,
);
