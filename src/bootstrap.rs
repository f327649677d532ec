//! Turn connection parameters into a ready backend
//!
//! [`connect`] runs the startup sequence and stops at the first failure:
//!
//! 1. validate the parameters
//! 2. open a pool of `pool_size` connections for the selected engine
//! 3. ping the database
//! 4. apply pending migrations from `<migrations_dir>/<engine>/` if requested
//!
//! Any failure comes back as a [`BootstrapError`]. Nothing has been written
//! at that point, so there is nothing to roll back; the caller is expected to
//! report the error and exit.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::backend::memory::MemoryBackend;
use crate::backend::mysql::MySqlBackend;
use crate::backend::postgres::PostgresBackend;
use crate::backend::sqlite::SqliteBackend;
use crate::backend::{Backend, BootstrapError, BootstrapStage, Database};
use crate::config::{ConnectionParameters, Engine};
use crate::metrics::MetricsRegistry;

/// Open, verify and (optionally) migrate the database described by `params`
#[instrument(skip_all, fields(engine = %params.engine))]
pub async fn connect(
    params: ConnectionParameters,
    metrics: Arc<MetricsRegistry>,
) -> Result<Database, BootstrapError> {
    debug!("bootstrapping with {params:?}");

    params
        .validate()
        .map_err(|e| fail(BootstrapStage::Configure, e))?;

    let database = match params.engine {
        Engine::Mysql => MySqlBackend::open(&params, metrics).await.map(Database::MySql),
        Engine::Postgres => PostgresBackend::open(&params, metrics)
            .await
            .map(Database::Postgres),
        Engine::Sqlite => SqliteBackend::open(&params, metrics)
            .await
            .map(Database::Sqlite),
        Engine::Memory => Ok(Database::Memory(MemoryBackend::new(metrics))),
    }
    .map_err(|e| fail(BootstrapStage::Connect, e))?;

    database
        .ping()
        .await
        .map_err(|e| fail(BootstrapStage::Ping, e))?;
    info!("successfully connected to {}", params.engine);

    if params.auto_migrate {
        let source = params.migration_source();
        let known = database
            .migrate(&source)
            .await
            .map_err(|e| fail(BootstrapStage::Migrate, e))?;
        info!("schema up to date ({known} migrations in {})", source.display());
    }

    Ok(database)
}

/// Callers report the error
fn fail(stage: BootstrapStage, source: crate::backend::BackendError) -> BootstrapError {
    debug!("bootstrap stopped while {stage}: {source}");
    BootstrapError::new(stage, source)
}
