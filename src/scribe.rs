use std::path::Path;

use crate::backup;
use crate::decode;
use crate::error::SqlScribeError;
use crate::pool::{DbPool, SqlExecutor};
use crate::query;
use crate::results::{Record, ResultSet};
use crate::schema;
use crate::types::{Backend, DbValue};

/// Convenience handle bundling a pool with the CRUD, search, and dump
/// operations of the crate.
///
/// Reads come back as [`Record`] mappings with text cells opportunistically
/// decoded (JSON and PHP-serialized payloads become [`DbValue::Json`]);
/// [`Scribe::query_raw`] skips the decoding.
///
/// ```rust,no_run
/// use sql_scribe::{DbValue, Scribe};
///
/// # async fn demo() -> Result<(), sql_scribe::SqlScribeError> {
/// let db = Scribe::connect_sqlite("app.db").await?;
/// db.insert("player", &[("name", DbValue::from("alice"))]).await?;
/// let rows = db.search("player", "ali|name").await?;
/// # let _ = rows;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Scribe {
    pool: DbPool,
}

impl Scribe {
    /// Connect to a `SQLite` database file.
    ///
    /// # Errors
    /// Returns `ConnectionError` if the pool cannot be created.
    pub async fn connect_sqlite(db_path: &str) -> Result<Self, SqlScribeError> {
        Ok(Self {
            pool: DbPool::new_sqlite(db_path).await?,
        })
    }

    /// Connect to a Postgres database.
    ///
    /// # Errors
    /// Returns `ConfigError` for missing fields or `ConnectionError` if the
    /// pool cannot be created.
    pub async fn connect_postgres(
        config: deadpool_postgres::Config,
    ) -> Result<Self, SqlScribeError> {
        Ok(Self {
            pool: DbPool::new_postgres(config).await?,
        })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.pool.backend()
    }

    /// Insert a row built from a field map; returns rows affected.
    ///
    /// # Errors
    /// Returns `ParameterError` for an empty field map, or the execution
    /// error from the backend.
    pub async fn insert(
        &self,
        table: &str,
        fields: &[(&str, DbValue)],
    ) -> Result<usize, SqlScribeError> {
        let built = query::insert(self.backend(), table, fields)?;
        let mut conn = self.pool.get().await?;
        conn.execute_dml(&built.sql, &built.params).await
    }

    /// Update rows matching the conditions; returns rows affected.
    ///
    /// # Errors
    /// Returns `ParameterError` for an empty field map or empty conditions,
    /// or the execution error from the backend.
    pub async fn update(
        &self,
        table: &str,
        fields: &[(&str, DbValue)],
        conditions: &[(&str, DbValue)],
    ) -> Result<usize, SqlScribeError> {
        let built = query::update(self.backend(), table, fields, conditions)?;
        let mut conn = self.pool.get().await?;
        conn.execute_dml(&built.sql, &built.params).await
    }

    /// Delete rows matching the conditions; returns rows affected.
    ///
    /// # Errors
    /// Returns `ParameterError` for empty conditions, or the execution
    /// error from the backend.
    pub async fn delete(
        &self,
        table: &str,
        conditions: &[(&str, DbValue)],
    ) -> Result<usize, SqlScribeError> {
        let built = query::delete(self.backend(), table, conditions)?;
        let mut conn = self.pool.get().await?;
        conn.execute_dml(&built.sql, &built.params).await
    }

    /// Select columns from a table; an empty column list selects `*`.
    ///
    /// # Errors
    /// Returns the execution error from the backend.
    pub async fn select(
        &self,
        table: &str,
        columns: &[&str],
    ) -> Result<Vec<Record>, SqlScribeError> {
        let built = query::select(self.backend(), table, columns, false)?;
        self.run_decoded(&built.sql, &built.params).await
    }

    /// Select distinct column values from a table.
    ///
    /// # Errors
    /// Returns the execution error from the backend.
    pub async fn select_distinct(
        &self,
        table: &str,
        columns: &[&str],
    ) -> Result<Vec<Record>, SqlScribeError> {
        let built = query::select(self.backend(), table, columns, true)?;
        self.run_decoded(&built.sql, &built.params).await
    }

    /// Select with an AND-joined condition list.
    ///
    /// # Errors
    /// Returns the execution error from the backend.
    pub async fn select_where(
        &self,
        table: &str,
        columns: &[&str],
        conditions: &[(&str, DbValue)],
    ) -> Result<Vec<Record>, SqlScribeError> {
        let built = query::select_where(self.backend(), table, columns, false, conditions)?;
        self.run_decoded(&built.sql, &built.params).await
    }

    /// Run an arbitrary SELECT; rows come back decoded.
    ///
    /// # Errors
    /// Returns the execution error from the backend.
    pub async fn query(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<Vec<Record>, SqlScribeError> {
        self.run_decoded(sql, params).await
    }

    /// Run an arbitrary SELECT without any decoding.
    ///
    /// # Errors
    /// Returns the execution error from the backend.
    pub async fn query_raw(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<ResultSet, SqlScribeError> {
        let mut conn = self.pool.get().await?;
        conn.execute_select(sql, params).await
    }

    /// Run an arbitrary DML statement; returns rows affected.
    ///
    /// # Errors
    /// Returns the execution error from the backend.
    pub async fn execute(&self, sql: &str, params: &[DbValue]) -> Result<usize, SqlScribeError> {
        let mut conn = self.pool.get().await?;
        conn.execute_dml(sql, params).await
    }

    /// Run a multi-statement script. The script runs as-is and may manage
    /// its own transactions; dump output restores through this path.
    ///
    /// # Errors
    /// Returns the execution error from the backend.
    pub async fn batch(&self, sql: &str) -> Result<(), SqlScribeError> {
        let mut conn = self.pool.get().await?;
        conn.execute_batch(sql).await
    }

    /// LIKE-search a table using a `needle|col1,col2` spec.
    ///
    /// Without the `|` part, every column of the table is searched (columns
    /// are discovered from the catalog).
    ///
    /// # Errors
    /// Returns `ExecutionError` for an unknown table, or the execution
    /// error from the backend.
    pub async fn search(&self, table: &str, spec: &str) -> Result<Vec<Record>, SqlScribeError> {
        let (needle, columns) = query::parse_search_spec(spec);
        let mut conn = self.pool.get().await?;
        let columns = match columns {
            Some(columns) => columns,
            None => schema::column_names(&mut conn, table).await?,
        };
        let built = query::search(self.backend(), table, &needle, &columns)?;
        let rs = conn.execute_select(&built.sql, &built.params).await?;
        Ok(rs.rows.iter().map(decode::decode_row).collect())
    }

    /// Dump the schema and contents of the given tables as SQL text.
    ///
    /// `tables = None` dumps every user table.
    ///
    /// # Errors
    /// Returns `ExecutionError` for an unknown table name, or the execution
    /// error from the backend.
    pub async fn dump(&self, tables: Option<&[String]>) -> Result<String, SqlScribeError> {
        let mut conn = self.pool.get().await?;
        backup::dump(&mut conn, tables).await
    }

    /// Write a dump to a file.
    ///
    /// # Errors
    /// Returns a dump error, or `Other` when the file cannot be written.
    pub async fn dump_to_file(
        &self,
        path: impl AsRef<Path>,
        tables: Option<&[String]>,
    ) -> Result<(), SqlScribeError> {
        let mut conn = self.pool.get().await?;
        backup::dump_to_file(&mut conn, path, tables).await
    }

    /// Drop every user table; returns the count dropped.
    ///
    /// # Errors
    /// Returns the execution error from the backend.
    pub async fn drop_all_tables(&self) -> Result<usize, SqlScribeError> {
        let mut conn = self.pool.get().await?;
        backup::drop_all_tables(&mut conn).await
    }

    async fn run_decoded(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<Vec<Record>, SqlScribeError> {
        let mut conn = self.pool.get().await?;
        let rs = conn.execute_select(sql, params).await?;
        Ok(rs.rows.iter().map(decode::decode_row).collect())
    }
}
