//! PostgreSQL backend implementation
//!
//! Works against PostgreSQL and wire compatible servers (CockroachDB,
//! YugabyteDB, ...). TLS is disabled, matching how the benchmark is usually
//! pointed at databases on a private network.

use std::sync::Arc;

use sqlx::postgres::{PgConnectOptions, PgPool, PgSslMode};
use tracing::{debug, info, instrument};

use super::error::{BackendError, BackendResult};
use super::pool_options;
use crate::config::{ConnectionParameters, Engine};
use crate::metrics::MetricsRegistry;

const INSERT_STATEMENT: &str = "INSERT INTO users (user_id) VALUES ($1)";
const GET_STATEMENT: &str = "SELECT user_id FROM users WHERE user_id = $1";

/// PostgreSQL backend
pub struct PostgresBackend {
    pool: PgPool,
    metrics: Arc<MetricsRegistry>,
}

impl PostgresBackend {
    /// Connection options built from the parameters, field by field
    pub fn connect_options(params: &ConnectionParameters) -> PgConnectOptions {
        PgConnectOptions::new()
            .ssl_mode(PgSslMode::Disable)
            .host(&params.host)
            .port(params.port())
            .username(&params.user)
            .password(&params.password)
            .database(&params.database)
    }

    #[instrument(skip_all, fields(host = %params.host, database = %params.database))]
    pub async fn open(
        params: &ConnectionParameters,
        metrics: Arc<MetricsRegistry>,
    ) -> BackendResult<Self> {
        debug!("connecting to postgres at {}:{}", params.host, params.port());

        let pool = pool_options(params)
            .connect_with(Self::connect_options(params))
            .await
            .map_err(|e| BackendError::Connectivity(e.to_string()))?;

        info!("postgres connection pool created ({} connections)", params.pool_size);

        Ok(Self { pool, metrics })
    }
}

sql_backend!(
    PostgresBackend,
    Engine::Postgres,
    "postgres",
    insert: INSERT_STATEMENT,
    get: GET_STATEMENT,
);
