//! Catalog introspection: table lists, column lists, CREATE TABLE text.
//!
//! Used by search (column discovery), the dump writer, and the table
//! dropper. `SQLite` answers from `sqlite_master` and `pragma_table_info`;
//! Postgres answers from `information_schema`, with the CREATE statement
//! synthesized from column metadata since the catalog does not store one.

use crate::error::SqlScribeError;
use crate::pool::{DbConn, SqlExecutor};
use crate::query::quote_ident;
use crate::types::{Backend, DbValue};

const SQLITE_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

const PG_TABLES: &str = "SELECT table_name AS name FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' ORDER BY table_name";

const SQLITE_COLUMNS: &str = "SELECT name FROM pragma_table_info(?1) ORDER BY cid";

const PG_COLUMNS: &str = "SELECT column_name AS name FROM information_schema.columns \
     WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position";

const SQLITE_TABLE_SQL: &str =
    "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1";

const PG_COLUMN_DEFS: &str = "SELECT column_name, data_type, is_nullable, column_default \
     FROM information_schema.columns \
     WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position";

fn text_column(rs: &crate::results::ResultSet, column: &str) -> Vec<String> {
    rs.rows
        .iter()
        .filter_map(|row| row.get(column).and_then(DbValue::as_text).map(str::to_string))
        .collect()
}

/// List the user tables of the connected database, sorted by name.
///
/// # Errors
/// Returns the underlying error if the catalog query fails.
pub async fn table_names(conn: &mut DbConn) -> Result<Vec<String>, SqlScribeError> {
    let sql = match conn.backend() {
        Backend::Sqlite => SQLITE_TABLES,
        Backend::Postgres => PG_TABLES,
    };
    let rs = conn.execute_select(sql, &[]).await?;
    Ok(text_column(&rs, "name"))
}

/// List the columns of a table in declaration order.
///
/// # Errors
/// Returns `ExecutionError` when the table has no columns (which on both
/// backends means it does not exist), or the underlying error if the
/// catalog query fails.
pub async fn column_names(conn: &mut DbConn, table: &str) -> Result<Vec<String>, SqlScribeError> {
    let sql = match conn.backend() {
        Backend::Sqlite => SQLITE_COLUMNS,
        Backend::Postgres => PG_COLUMNS,
    };
    let rs = conn
        .execute_select(sql, &[DbValue::from(table)])
        .await?;
    let columns = text_column(&rs, "name");
    if columns.is_empty() {
        return Err(SqlScribeError::ExecutionError(format!(
            "no such table: {table}"
        )));
    }
    Ok(columns)
}

/// Fetch or synthesize the CREATE TABLE statement for a table.
///
/// The Postgres rendition is intentionally approximate: column names, types,
/// defaults, and NOT NULL only. Constraints and indexes are not carried.
///
/// # Errors
/// Returns `ExecutionError` for an unknown table, or the underlying error
/// if the catalog query fails.
pub async fn create_table_sql(conn: &mut DbConn, table: &str) -> Result<String, SqlScribeError> {
    match conn.backend() {
        Backend::Sqlite => {
            let rs = conn
                .execute_select(SQLITE_TABLE_SQL, &[DbValue::from(table)])
                .await?;
            rs.rows
                .first()
                .and_then(|row| row.get("sql"))
                .and_then(DbValue::as_text)
                .map(str::to_string)
                .ok_or_else(|| {
                    SqlScribeError::ExecutionError(format!("no such table: {table}"))
                })
        }
        Backend::Postgres => {
            let rs = conn
                .execute_select(PG_COLUMN_DEFS, &[DbValue::from(table)])
                .await?;
            if rs.is_empty() {
                return Err(SqlScribeError::ExecutionError(format!(
                    "no such table: {table}"
                )));
            }
            let defs: Vec<ColumnDef> = rs
                .rows
                .iter()
                .map(|row| ColumnDef {
                    name: row
                        .get("column_name")
                        .and_then(DbValue::as_text)
                        .unwrap_or_default()
                        .to_string(),
                    data_type: row
                        .get("data_type")
                        .and_then(DbValue::as_text)
                        .unwrap_or_default()
                        .to_string(),
                    not_null: row
                        .get("is_nullable")
                        .and_then(DbValue::as_text)
                        .is_some_and(|v| v == "NO"),
                    default: row
                        .get("column_default")
                        .and_then(DbValue::as_text)
                        .map(str::to_string),
                })
                .collect();
            Ok(synthesize_create_table(table, &defs))
        }
    }
}

struct ColumnDef {
    name: String,
    data_type: String,
    not_null: bool,
    default: Option<String>,
}

fn synthesize_create_table(table: &str, columns: &[ColumnDef]) -> String {
    let mut out = format!("CREATE TABLE {} (\n", quote_ident(table));
    for (i, col) in columns.iter().enumerate() {
        out.push_str("  ");
        out.push_str(&quote_ident(&col.name));
        out.push(' ');
        out.push_str(&col.data_type);
        if let Some(default) = &col.default {
            out.push_str(" DEFAULT ");
            out.push_str(default);
        }
        if col.not_null {
            out.push_str(" NOT NULL");
        }
        if i + 1 < columns.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push(')');
    out
}
