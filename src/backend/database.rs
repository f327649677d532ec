//! The set of engines a benchmark can target

use std::path::Path;

use async_trait::async_trait;

use super::contract::Backend;
use super::error::BackendResult;
use super::memory::MemoryBackend;
use super::mysql::MySqlBackend;
use super::postgres::PostgresBackend;
use super::sqlite::SqliteBackend;
use crate::config::Engine;

/// A ready backend for one of the supported engines
///
/// Produced by [`crate::bootstrap::connect`]; every call is forwarded to the
/// engine's own [`Backend`] implementation.
pub enum Database {
    MySql(MySqlBackend),
    Postgres(PostgresBackend),
    Sqlite(SqliteBackend),
    Memory(MemoryBackend),
}

macro_rules! delegate {
    ($self:expr, $backend:ident => $call:expr) => {
        match $self {
            Database::MySql($backend) => $call,
            Database::Postgres($backend) => $call,
            Database::Sqlite($backend) => $call,
            Database::Memory($backend) => $call,
        }
    };
}

impl Database {
    /// Apply pending migrations from `source`, returning how many are known
    pub async fn migrate(&self, source: &Path) -> BackendResult<usize> {
        match self {
            Database::MySql(backend) => backend.migrate(source).await,
            Database::Postgres(backend) => backend.migrate(source).await,
            Database::Sqlite(backend) => backend.migrate(source).await,
            Database::Memory(_) => Ok(0),
        }
    }
}

#[async_trait]
impl Backend for Database {
    async fn get(&self, key: &str) -> BackendResult<String> {
        delegate!(self, backend => backend.get(key).await)
    }

    async fn insert(&self, key: &str) -> BackendResult<()> {
        delegate!(self, backend => backend.insert(key).await)
    }

    async fn ping(&self) -> BackendResult<()> {
        delegate!(self, backend => backend.ping().await)
    }

    async fn close(&self) {
        delegate!(self, backend => backend.close().await)
    }

    fn engine(&self) -> Engine {
        delegate!(self, backend => backend.engine())
    }
}
