use thiserror::Error;

/// Unified error type for every fallible operation in the crate.
///
/// Driver and pool errors pass through transparently; the string variants
/// cover conditions the drivers cannot express (bad configuration, refused
/// statement shapes, decode failures).
#[derive(Debug, Error)]
pub enum SqlScribeError {
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    PoolErrorPostgres(#[from] deadpool_postgres::PoolError),

    #[error(transparent)]
    PoolErrorSqlite(#[from] deadpool::managed::PoolError<rusqlite::Error>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Other database error: {0}")]
    Other(String),
}
