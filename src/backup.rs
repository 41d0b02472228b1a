//! Sequential SQL dump writer and table dropper.
//!
//! The dump is deliberately naive: a commented header, a transaction
//! preamble, then per table a `DROP TABLE IF EXISTS`, the CREATE statement,
//! and one INSERT per row with literal-rendered values. The output of a
//! `SQLite` dump feeds straight back through a batch execute to restore.

use std::path::Path;

use chrono::Utc;

use crate::error::SqlScribeError;
use crate::pool::{DbConn, SqlExecutor};
use crate::query::{literal, quote_ident};
use crate::results::DbRow;
use crate::schema;
use crate::types::Backend;

/// Dump the schema and contents of the given tables as SQL text.
///
/// `tables = None` dumps every user table. Listed tables are dumped in the
/// caller's order and must all exist.
///
/// # Errors
/// Returns `ExecutionError` for an unknown table name, or the underlying
/// error if any catalog or row query fails.
pub async fn dump(
    conn: &mut DbConn,
    tables: Option<&[String]>,
) -> Result<String, SqlScribeError> {
    let backend = conn.backend();
    let all = schema::table_names(conn).await?;
    let selected: Vec<String> = match tables {
        None => all,
        Some(list) => {
            for table in list {
                if !all.contains(table) {
                    return Err(SqlScribeError::ExecutionError(format!(
                        "unknown table in dump list: {table}"
                    )));
                }
            }
            list.to_vec()
        }
    };

    let mut out = String::new();
    out.push_str(&format!("-- {} dump\n", env!("CARGO_PKG_NAME")));
    out.push_str(&format!("-- version {}\n", env!("CARGO_PKG_VERSION")));
    out.push_str(&format!(
        "-- generated {} UTC\n--\n\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));
    match backend {
        Backend::Sqlite => out.push_str("PRAGMA foreign_keys=OFF;\nBEGIN TRANSACTION;\n\n"),
        Backend::Postgres => out.push_str("BEGIN;\n\n"),
    }

    for table in &selected {
        tracing::debug!(table, "dumping table");
        out.push_str(&format!("--\n-- Structure for table {}\n--\n\n", quote_ident(table)));
        out.push_str(&format!("DROP TABLE IF EXISTS {};\n", quote_ident(table)));
        let ddl = schema::create_table_sql(conn, table).await?;
        out.push_str(&ddl);
        out.push_str(";\n\n");

        let rs = conn
            .execute_select(&format!("SELECT * FROM {}", quote_ident(table)), &[])
            .await?;
        for row in &rs.rows {
            out.push_str(&insert_row_sql(backend, table, row));
        }
        out.push('\n');
    }

    out.push_str("COMMIT;\n");
    Ok(out)
}

/// Write a dump to a file.
///
/// # Errors
/// Returns a dump error, or `Other` when the file cannot be written.
pub async fn dump_to_file(
    conn: &mut DbConn,
    path: impl AsRef<Path>,
    tables: Option<&[String]>,
) -> Result<(), SqlScribeError> {
    let output = dump(conn, tables).await?;
    tokio::fs::write(path.as_ref(), output)
        .await
        .map_err(|e| SqlScribeError::Other(format!("failed to write dump file: {e}")))
}

fn insert_row_sql(backend: Backend, table: &str, row: &DbRow) -> String {
    let values: Vec<String> = row.values.iter().map(|v| literal(backend, v)).collect();
    format!(
        "INSERT INTO {} VALUES ({});\n",
        quote_ident(table),
        values.join(", ")
    )
}

/// Drop every user table in the connected database; returns the count.
///
/// Postgres drops cascade, since the naive dump makes no attempt to order
/// tables by foreign-key dependency.
///
/// # Errors
/// Returns the underlying error if discovery or the drop script fails.
pub async fn drop_all_tables(conn: &mut DbConn) -> Result<usize, SqlScribeError> {
    let tables = schema::table_names(conn).await?;
    if tables.is_empty() {
        return Ok(0);
    }

    let mut script = String::new();
    for table in &tables {
        match conn.backend() {
            Backend::Sqlite => {
                script.push_str(&format!("DROP TABLE IF EXISTS {};\n", quote_ident(table)));
            }
            Backend::Postgres => {
                script.push_str(&format!(
                    "DROP TABLE IF EXISTS {} CASCADE;\n",
                    quote_ident(table)
                ));
            }
        }
    }
    conn.execute_batch(&script).await?;
    tracing::debug!(count = tables.len(), "dropped tables");
    Ok(tables.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DbValue;
    use std::sync::Arc;

    #[test]
    fn insert_row_renders_literals_in_column_order() {
        let cols = Arc::new(vec!["id".to_string(), "name".to_string(), "bio".to_string()]);
        let row = DbRow::new(
            cols,
            vec![
                DbValue::Int(1),
                DbValue::from("O'Brien"),
                DbValue::Null,
            ],
        );
        assert_eq!(
            insert_row_sql(Backend::Sqlite, "player", &row),
            "INSERT INTO \"player\" VALUES (1, 'O''Brien', NULL);\n"
        );
    }
}
