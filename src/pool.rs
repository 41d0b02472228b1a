use async_trait::async_trait;

use crate::error::SqlScribeError;
use crate::results::ResultSet;
use crate::sqlite::{SqliteConn, SqlitePool};
use crate::types::{Backend, DbValue};
use crate::{postgres, sqlite};

/// Connection pool for database access.
///
/// Wraps the pool types of the supported backends so calling code can stay
/// generic over the database engine.
#[derive(Clone, Debug)]
pub struct DbPool {
    inner: PoolInner,
}

#[derive(Clone, Debug)]
enum PoolInner {
    Sqlite(SqlitePool),
    Postgres(deadpool_postgres::Pool),
}

impl DbPool {
    /// Open a `SQLite`-backed pool for the given database file.
    ///
    /// # Errors
    /// Returns `ConnectionError` if the pool cannot be created or the
    /// initial pragma batch fails.
    pub async fn new_sqlite(db_path: &str) -> Result<Self, SqlScribeError> {
        Ok(Self {
            inner: PoolInner::Sqlite(sqlite::new_pool(db_path).await?),
        })
    }

    /// Open a Postgres-backed pool from a validated configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` for missing fields or `ConnectionError` if the
    /// pool cannot be created.
    pub async fn new_postgres(config: deadpool_postgres::Config) -> Result<Self, SqlScribeError> {
        Ok(Self {
            inner: PoolInner::Postgres(postgres::new_pool(config).await?),
        })
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        match &self.inner {
            PoolInner::Sqlite(_) => Backend::Sqlite,
            PoolInner::Postgres(_) => Backend::Postgres,
        }
    }

    /// Check a connection out of the pool.
    ///
    /// # Errors
    /// Returns the backend's pool error if checkout fails.
    pub async fn get(&self) -> Result<DbConn, SqlScribeError> {
        match &self.inner {
            PoolInner::Sqlite(pool) => Ok(DbConn::Sqlite(
                pool.get().await.map_err(SqlScribeError::PoolErrorSqlite)?,
            )),
            PoolInner::Postgres(pool) => Ok(DbConn::Postgres(
                pool.get()
                    .await
                    .map_err(SqlScribeError::PoolErrorPostgres)?,
            )),
        }
    }
}

/// A pooled connection to either backend.
#[derive(Debug)]
pub enum DbConn {
    Sqlite(SqliteConn),
    Postgres(deadpool_postgres::Object),
}

impl DbConn {
    #[must_use]
    pub fn backend(&self) -> Backend {
        match self {
            DbConn::Sqlite(_) => Backend::Sqlite,
            DbConn::Postgres(_) => Backend::Postgres,
        }
    }
}

/// Generic statement execution over a pooled connection.
#[async_trait]
pub trait SqlExecutor {
    /// Execute a multi-statement script (reads and writes). No parameters
    /// are supported; the script runs as-is and may manage its own
    /// transactions.
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlScribeError>;

    /// Execute a single SELECT statement and return the result set.
    async fn execute_select(
        &mut self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<ResultSet, SqlScribeError>;

    /// Execute a single DML statement (INSERT, UPDATE, DELETE, DDL) and
    /// return the number of rows affected.
    async fn execute_dml(&mut self, sql: &str, params: &[DbValue])
    -> Result<usize, SqlScribeError>;
}

#[async_trait]
impl SqlExecutor for DbConn {
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlScribeError> {
        match self {
            DbConn::Sqlite(conn) => sqlite::execute_batch(conn, sql).await,
            DbConn::Postgres(client) => postgres::execute_batch(client, sql).await,
        }
    }

    async fn execute_select(
        &mut self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<ResultSet, SqlScribeError> {
        match self {
            DbConn::Sqlite(conn) => sqlite::execute_select(conn, sql, params).await,
            DbConn::Postgres(client) => postgres::execute_select(client, sql, params).await,
        }
    }

    async fn execute_dml(
        &mut self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<usize, SqlScribeError> {
        match self {
            DbConn::Sqlite(conn) => sqlite::execute_dml(conn, sql, params).await,
            DbConn::Postgres(client) => postgres::execute_dml(client, sql, params).await,
        }
    }
}
