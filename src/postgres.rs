//! `PostgreSQL` backend: pooling, parameter conversion, and execution.

use std::error::Error;
use std::sync::Arc;

use chrono::NaiveDateTime;
use deadpool_postgres::{Config as PgConfig, Object, Transaction};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio_postgres::{
    NoTls, Statement,
    types::{IsNull, ToSql, Type, to_sql_checked},
};
use tokio_util::bytes;

use crate::error::SqlScribeError;
use crate::results::{DbRow, ResultSet};
use crate::types::DbValue;

/// Connection settings that can be loaded from a config file.
///
/// ```rust
/// use sql_scribe::postgres::PgSettings;
///
/// let settings: PgSettings = serde_json::from_str(
///     r#"{"host": "localhost", "port": 5432, "dbname": "app",
///         "user": "app", "password": "secret"}"#,
/// ).unwrap();
/// let _config = settings.into_config();
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PgSettings {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl PgSettings {
    /// Convert into the pool configuration the driver consumes.
    #[must_use]
    pub fn into_config(self) -> PgConfig {
        let mut cfg = PgConfig::new();
        cfg.host = Some(self.host);
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname);
        cfg.user = Some(self.user);
        cfg.password = Some(self.password);
        cfg
    }
}

/// Create a Postgres pool after validating the configuration.
///
/// # Errors
/// Returns `ConfigError` when a required field is missing, or
/// `ConnectionError` when the pool cannot be created.
pub async fn new_pool(pg_config: PgConfig) -> Result<deadpool_postgres::Pool, SqlScribeError> {
    if pg_config.dbname.is_none() {
        return Err(SqlScribeError::ConfigError("dbname is required".to_string()));
    }
    if pg_config.host.is_none() {
        return Err(SqlScribeError::ConfigError("host is required".to_string()));
    }
    if pg_config.port.is_none() {
        return Err(SqlScribeError::ConfigError("port is required".to_string()));
    }
    if pg_config.user.is_none() {
        return Err(SqlScribeError::ConfigError("user is required".to_string()));
    }
    if pg_config.password.is_none() {
        return Err(SqlScribeError::ConfigError("password is required".to_string()));
    }

    let pool = pg_config
        .create_pool(Some(deadpool_postgres::Runtime::Tokio1), NoTls)
        .map_err(|e| {
            SqlScribeError::ConnectionError(format!("failed to create Postgres pool: {e}"))
        })?;
    tracing::debug!("postgres pool ready");
    Ok(pool)
}

/// Container for Postgres parameters with lifetime tracking.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    /// Borrow a slice of generic values as Postgres parameters.
    ///
    /// # Errors
    /// Currently infallible; kept fallible for parity with the `SQLite` side.
    pub fn convert(params: &'a [DbValue]) -> Result<Params<'a>, SqlScribeError> {
        let references: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Ok(Params { references })
    }

    /// Get a reference to the underlying parameter array.
    #[must_use]
    pub fn as_refs(&self) -> &[&'a (dyn ToSql + Sync)] {
        &self.references
    }
}

impl ToSql for DbValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            DbValue::Int(i) => (*i).to_sql(ty, out),
            DbValue::Float(f) => (*f).to_sql(ty, out),
            DbValue::Text(s) => s.to_sql(ty, out),
            DbValue::Bool(b) => (*b).to_sql(ty, out),
            DbValue::Timestamp(dt) => dt.to_sql(ty, out),
            DbValue::Null => Ok(IsNull::Yes),
            DbValue::Json(jsval) => jsval.to_sql(ty, out),
            DbValue::Blob(bytes) => bytes.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        match *ty {
            // Integer types
            Type::INT2 | Type::INT4 | Type::INT8 => true,
            // Floating point types
            Type::FLOAT4 | Type::FLOAT8 => true,
            // Text types
            Type::TEXT | Type::VARCHAR | Type::CHAR | Type::NAME => true,
            // Boolean type
            Type::BOOL => true,
            // Date/time types
            Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE => true,
            // JSON types
            Type::JSON | Type::JSONB => true,
            // Binary data
            Type::BYTEA => true,
            _ => false,
        }
    }

    to_sql_checked!();
}

/// Extract a single column value from a row, by the column's type name.
fn extract_value(row: &tokio_postgres::Row, idx: usize) -> Result<DbValue, SqlScribeError> {
    let type_name = row.columns()[idx].type_().name();

    match type_name {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, |v| DbValue::Int(i64::from(v))))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, |v| DbValue::Int(i64::from(v))))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Int))
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, |v| DbValue::Float(f64::from(v))))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Float))
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Bool))
        }
        "timestamp" | "timestamptz" => {
            let val: Option<NaiveDateTime> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Timestamp))
        }
        "json" | "jsonb" => {
            let val: Option<JsonValue> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Json))
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Blob))
        }
        // Everything else reads as text.
        _ => {
            let val: Option<String> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Text))
        }
    }
}

/// Run a prepared statement inside a transaction and collect its rows.
///
/// # Errors
/// Returns the underlying driver error if the query or extraction fails.
pub async fn build_result_set(
    stmt: &Statement,
    params: &[&(dyn ToSql + Sync)],
    transaction: &Transaction<'_>,
) -> Result<ResultSet, SqlScribeError> {
    let rows = transaction.query(stmt, params).await?;

    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_names = Arc::new(column_names);
    let index_cache = DbRow::index_cache(&column_names);

    let mut result_set = ResultSet::with_capacity(rows.len());
    for row in rows {
        let mut values = Vec::with_capacity(column_names.len());
        for i in 0..column_names.len() {
            values.push(extract_value(&row, i)?);
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
/// Returns the underlying driver error.
pub async fn execute_batch(pg_client: &mut Object, sql: &str) -> Result<(), SqlScribeError> {
    pg_client.batch_execute(sql).await?;
    Ok(())
}

/// Execute a SELECT and collect the result set.
///
/// # Errors
/// Returns the underlying driver error if preparation or the query fails.
pub async fn execute_select(
    pg_client: &mut Object,
    sql: &str,
    params: &[DbValue],
) -> Result<ResultSet, SqlScribeError> {
    let params = Params::convert(params)?;
    let tx = pg_client.transaction().await?;
    let stmt = tx.prepare(sql).await?;
    let result_set = build_result_set(&stmt, params.as_refs(), &tx).await?;
    tx.commit().await?;
    Ok(result_set)
}

/// Execute a DML statement inside a transaction; returns rows affected.
///
/// # Errors
/// Returns the underlying driver error; the transaction is rolled back.
pub async fn execute_dml(
    pg_client: &mut Object,
    sql: &str,
    params: &[DbValue],
) -> Result<usize, SqlScribeError> {
    let params = Params::convert(params)?;
    let tx = pg_client.transaction().await?;
    let stmt = tx.prepare(sql).await?;
    let rows = tx.execute(&stmt, params.as_refs()).await?;
    tx.commit().await?;
    Ok(rows as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_into_config() {
        let settings: PgSettings = serde_json::from_str(
            r#"{"host": "db.local", "port": 5433, "dbname": "app",
                "user": "svc", "password": "pw"}"#,
        )
        .unwrap();
        let cfg = settings.into_config();
        assert_eq!(cfg.host.as_deref(), Some("db.local"));
        assert_eq!(cfg.port, Some(5433));
        assert_eq!(cfg.dbname.as_deref(), Some("app"));
    }

    #[tokio::test]
    async fn missing_config_fields_are_rejected() {
        let cfg = PgConfig::new();
        let err = new_pool(cfg).await.unwrap_err();
        assert!(matches!(err, SqlScribeError::ConfigError(_)));
    }
}
