//! Error types for backend operations

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur while talking to the database under test
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The database could not be reached
    #[error("database unreachable: {0}")]
    Connectivity(String),

    /// An insert was rejected (constraint violation, lost connection, ...)
    #[error("failed to insert '{key}': {reason}")]
    Write { key: String, reason: String },

    /// A lookup matched no row or the query itself failed
    #[error("query {statement:?} failed: {reason}")]
    NotFoundOrQuery { statement: String, reason: String },

    /// Applying pending migrations failed
    #[error("database migration failed: {0}")]
    Migration(String),

    /// The connection parameters can't be used
    #[error("invalid connection parameters: {0}")]
    InvalidConfig(String),
}

impl BackendError {
    pub(crate) fn write(key: &str, err: impl std::fmt::Display) -> Self {
        BackendError::Write {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn lookup(statement: &str, err: impl std::fmt::Display) -> Self {
        BackendError::NotFoundOrQuery {
            statement: statement.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for BackendError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        BackendError::Migration(err.to_string())
    }
}

/// Stage of [`crate::bootstrap::connect`] that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    Configure,
    Connect,
    Ping,
    Migrate,
}

impl std::fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            BootstrapStage::Configure => "validating connection parameters",
            BootstrapStage::Connect => "opening the connection pool",
            BootstrapStage::Ping => "pinging the database",
            BootstrapStage::Migrate => "applying migrations",
        };
        f.write_str(stage)
    }
}

/// Unrecoverable failure while preparing the backend.
///
/// Nothing has been written when this is returned; callers are expected to
/// report it and terminate.
#[derive(Debug, thiserror::Error)]
#[error("bootstrap failed while {stage}: {source}")]
pub struct BootstrapError {
    pub stage: BootstrapStage,
    #[source]
    pub source: BackendError,
}

impl BootstrapError {
    pub fn new(stage: BootstrapStage, source: BackendError) -> Self {
        Self { stage, source }
    }
}
