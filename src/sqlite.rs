//! `SQLite` backend: pooling, parameter conversion, and execution.

use std::sync::Arc;

use deadpool::managed::{self, Metrics, RecycleResult};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, Statement, ToSql};
use tokio::sync::Mutex;

use crate::error::SqlScribeError;
use crate::results::{DbRow, ResultSet};
use crate::types::DbValue;

/// Connection handle shared with blocking closures.
pub type SharedSqliteConn = Arc<Mutex<Connection>>;
/// Managed pool of `SQLite` connections.
pub type SqlitePool = managed::Pool<SqliteManager>;
/// A pooled `SQLite` connection.
pub type SqliteConn = managed::Object<SqliteManager>;

/// Pool manager that opens rusqlite connections on demand.
///
/// Connections are wrapped in an async mutex so statements can run on the
/// blocking thread pool while the pooled object stays checkout-owned.
#[derive(Debug)]
pub struct SqliteManager {
    db_path: String,
}

impl SqliteManager {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl managed::Manager for SqliteManager {
    type Type = SharedSqliteConn;
    type Error = rusqlite::Error;

    async fn create(&self) -> Result<Self::Type, Self::Error> {
        let conn = Connection::open(&self.db_path)?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    async fn recycle(
        &self,
        _conn: &mut Self::Type,
        _metrics: &Metrics,
    ) -> RecycleResult<Self::Error> {
        Ok(())
    }
}

/// Create a `SQLite` pool and apply the WAL pragma.
///
/// # Errors
/// Returns `ConnectionError` if the pool cannot be built, or the underlying
/// error if the initial pragma batch fails.
pub async fn new_pool(db_path: &str) -> Result<SqlitePool, SqlScribeError> {
    let pool = SqlitePool::builder(SqliteManager::new(db_path))
        .max_size(8)
        .build()
        .map_err(|e| {
            SqlScribeError::ConnectionError(format!("failed to create SQLite pool: {e}"))
        })?;

    {
        let conn = pool.get().await.map_err(SqlScribeError::PoolErrorSqlite)?;
        execute_batch(&conn, "PRAGMA journal_mode = WAL;").await?;
    }
    tracing::debug!(db_path, "sqlite pool ready");

    Ok(pool)
}

fn conn_handle(conn: &SqliteConn) -> SharedSqliteConn {
    Arc::clone(conn)
}

pub(crate) async fn run_blocking<F, R>(conn: SharedSqliteConn, func: F) -> Result<R, SqlScribeError>
where
    F: FnOnce(&mut Connection) -> Result<R, SqlScribeError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| {
        SqlScribeError::ExecutionError(format!("sqlite spawn_blocking join error: {e}"))
    })?
}

/// Bind generic values to `SQLite` parameter values.
///
/// # Errors
/// Currently infallible; kept fallible for parity with the Postgres side.
pub fn convert_params(params: &[DbValue]) -> Result<Vec<Value>, SqlScribeError> {
    let mut out = Vec::with_capacity(params.len());
    for p in params {
        let v = match p {
            DbValue::Int(i) => Value::Integer(*i),
            DbValue::Float(f) => Value::Real(*f),
            DbValue::Text(s) => Value::Text(s.clone()),
            DbValue::Bool(b) => Value::Integer(i64::from(*b)),
            DbValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
            DbValue::Null => Value::Null,
            DbValue::Json(jsval) => Value::Text(jsval.to_string()),
            DbValue::Blob(bytes) => Value::Blob(bytes.clone()),
        };
        out.push(v);
    }
    Ok(out)
}

fn extract_value(row: &rusqlite::Row, idx: usize) -> Result<DbValue, SqlScribeError> {
    match row.get_ref(idx) {
        Err(e) => Err(SqlScribeError::SqliteError(e)),
        Ok(ValueRef::Null) => Ok(DbValue::Null),
        Ok(ValueRef::Integer(i)) => Ok(DbValue::Int(i)),
        Ok(ValueRef::Real(f)) => Ok(DbValue::Float(f)),
        Ok(ValueRef::Text(bytes)) => Ok(DbValue::Text(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
        Ok(ValueRef::Blob(b)) => Ok(DbValue::Blob(b.to_vec())),
    }
}

/// Run a prepared statement and collect its rows.
///
/// # Errors
/// Returns the underlying `rusqlite` error if binding or stepping fails.
pub fn build_result_set(
    stmt: &mut Statement,
    params: &[Value],
) -> Result<ResultSet, SqlScribeError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    // Column names and the lookup cache are shared by every row.
    let column_names = Arc::new(column_names);
    let index_cache = DbRow::index_cache(&column_names);

    let mut rows_iter = stmt.query(&param_refs[..])?;
    let mut result_set = ResultSet::default();

    while let Some(row) = rows_iter.next()? {
        let mut values = Vec::with_capacity(column_names.len());
        for i in 0..column_names.len() {
            values.push(extract_value(row, i)?);
        }
        result_set.add_row(DbRow::with_cache(
            Arc::clone(&column_names),
            Arc::clone(&index_cache),
            values,
        ));
    }

    Ok(result_set)
}

/// Execute a multi-statement script.
///
/// The script runs as-is, so it may carry its own transaction statements
/// (dump output does).
///
/// # Errors
/// Returns the underlying error if any statement fails.
pub async fn execute_batch(conn: &SqliteConn, sql: &str) -> Result<(), SqlScribeError> {
    let sql = sql.to_owned();
    run_blocking(conn_handle(conn), move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
    })
    .await
}

/// Execute a SELECT and collect the result set.
///
/// # Errors
/// Returns the underlying error if preparation, binding, or stepping fails.
pub async fn execute_select(
    conn: &SqliteConn,
    sql: &str,
    params: &[DbValue],
) -> Result<ResultSet, SqlScribeError> {
    let sql = sql.to_owned();
    let params = convert_params(params)?;
    run_blocking(conn_handle(conn), move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        build_result_set(&mut stmt, &params)
    })
    .await
}

/// Execute a DML statement inside a transaction; returns rows affected.
///
/// # Errors
/// Returns the underlying error if preparation or execution fails; the
/// transaction is rolled back.
pub async fn execute_dml(
    conn: &SqliteConn,
    sql: &str,
    params: &[DbValue],
) -> Result<usize, SqlScribeError> {
    let sql = sql.to_owned();
    let params = convert_params(params)?;
    run_blocking(conn_handle(conn), move |conn| {
        let tx = conn.transaction()?;
        let rows = {
            let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
            let mut stmt = tx.prepare(&sql)?;
            stmt.execute(&param_refs[..])?
        };
        tx.commit()?;
        Ok(rows)
    })
    .await
}
