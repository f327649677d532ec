use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::trace;

use crate::backend::error::{BackendError, BackendResult};

/// Database engine a benchmark run targets
///
/// Names are matched case-insensitively wherever they come from (config
/// file, environment, command line); `postgresql` is accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(try_from = "String")]
pub enum Engine {
    /// MySQL compatible server
    Mysql,

    /// Postgres compatible server
    Postgres,

    /// Embedded SQLite file, `database` is the file path
    Sqlite,

    /// In-process keyspace without any persistence
    Memory,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::Mysql => "mysql",
            Engine::Postgres => "postgres",
            Engine::Sqlite => "sqlite",
            Engine::Memory => "memory",
        }
    }

    /// Port used when the parameters don't name one
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Engine::Mysql => Some(3306),
            Engine::Postgres => Some(5432),
            Engine::Sqlite | Engine::Memory => None,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Engine::Mysql),
            "postgres" | "postgresql" => Ok(Engine::Postgres),
            "sqlite" => Ok(Engine::Sqlite),
            "memory" => Ok(Engine::Memory),
            other => Err(BackendError::InvalidConfig(format!(
                "unknown database engine '{other}'"
            ))),
        }
    }
}

impl TryFrom<String> for Engine {
    type Error = BackendError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Everything needed to open a pooled connection to the database under test.
///
/// Consumed by [`crate::bootstrap::connect`].
#[derive(Clone, serde::Deserialize)]
pub struct ConnectionParameters {
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_host")]
    pub host: String,

    /// Falls back to the engine's well-known port
    #[serde(default)]
    pub port: Option<u16>,

    /// Database name, or the database file for SQLite
    #[serde(default)]
    pub database: String,

    pub engine: Engine,

    /// Maximum number of physical connections, also the worker count
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,

    /// Root folder holding one migration directory per engine
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// How long to wait for a pooled connection before giving up
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl ConnectionParameters {
    /// Parameters for `engine` with every other field at its default
    pub fn new(engine: Engine) -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            host: default_host(),
            port: None,
            database: String::new(),
            engine,
            pool_size: default_pool_size(),
            auto_migrate: default_auto_migrate(),
            migrations_dir: default_migrations_dir(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
            .or_else(|| self.engine.default_port())
            .unwrap_or_default()
    }

    /// Directory the migrator reads for this engine (`<migrations_dir>/<engine>/`)
    pub fn migration_source(&self) -> PathBuf {
        self.migrations_dir.join(self.engine.as_str())
    }

    pub fn validate(&self) -> BackendResult<()> {
        if self.pool_size == 0 {
            return Err(BackendError::InvalidConfig(
                "pool size must be at least 1".to_string(),
            ));
        }

        if self.engine != Engine::Memory && self.database.trim().is_empty() {
            return Err(BackendError::InvalidConfig(format!(
                "a database name is required for {}",
                self.engine
            )));
        }

        if matches!(self.engine, Engine::Mysql | Engine::Postgres) && self.host.trim().is_empty()
        {
            return Err(BackendError::InvalidConfig(format!(
                "a host name is required for {}",
                self.engine
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port())
            .field("database", &self.database)
            .field("engine", &self.engine)
            .field("pool_size", &self.pool_size)
            .field("auto_migrate", &self.auto_migrate)
            .field("migrations_dir", &self.migrations_dir)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

fn default_host() -> String {
    String::from("localhost")
}

fn default_pool_size() -> u32 {
    5
}

fn default_auto_migrate() -> bool {
    true
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("./migrations")
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Settings of the `/metrics` HTTP exporter
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ExporterConfig {
    #[serde(default = "default_exporter_enabled")]
    pub enabled: bool,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            enabled: default_exporter_enabled(),
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_exporter_enabled() -> bool {
    true
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct BenchmarkConfig {
    pub connection: ConnectionParameters,

    /// Number of rows the run inserts
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    #[serde(default)]
    pub exporter: ExporterConfig,
}

fn default_jobs() -> usize {
    500_000
}

/// Load a benchmark config from a `.json` or `.toml` file
pub fn read_config_file(path: impl AsRef<Path>) -> anyhow::Result<BenchmarkConfig> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path)?;

    let config: BenchmarkConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&file_content)
            .map_err(|e| anyhow::anyhow!("invalid configuration file {}: {e}", path.display()))?,
        _ => serde_json::from_str(&file_content)
            .map_err(|e| anyhow::anyhow!("invalid configuration file {}: {e}", path.display()))?,
    };

    config.connection.validate()?;
    trace!("loaded config: {config:?}");
    Ok(config)
}
