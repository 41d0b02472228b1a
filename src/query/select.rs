use crate::error::SqlScribeError;
use crate::types::{Backend, DbValue};

use super::{BuiltSql, append_conditions, placeholder, quote_ident};

fn column_list(columns: &[&str]) -> String {
    if columns.is_empty() {
        return "*".to_string();
    }
    let mut out = String::new();
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if *column == "*" {
            out.push('*');
        } else {
            out.push_str(&quote_ident(column));
        }
    }
    out
}

/// Build a SELECT (optionally DISTINCT) over a table.
///
/// An empty column list selects `*`.
///
/// # Errors
/// Currently infallible; kept fallible for parity with the other builders.
pub fn select(
    backend: Backend,
    table: &str,
    columns: &[&str],
    distinct: bool,
) -> Result<BuiltSql, SqlScribeError> {
    select_where(backend, table, columns, distinct, &[])
}

/// Build a SELECT with an AND-joined condition list.
///
/// An empty condition list produces a plain SELECT.
///
/// # Errors
/// Currently infallible; kept fallible for parity with the other builders.
pub fn select_where(
    backend: Backend,
    table: &str,
    columns: &[&str],
    distinct: bool,
    conditions: &[(&str, DbValue)],
) -> Result<BuiltSql, SqlScribeError> {
    let keyword = if distinct { "SELECT DISTINCT" } else { "SELECT" };
    let mut sql = format!(
        "{keyword} {} FROM {}",
        column_list(columns),
        quote_ident(table)
    );
    let mut params = Vec::with_capacity(conditions.len());
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        let mut next = 1;
        append_conditions(backend, &mut sql, &mut params, conditions, &mut next);
    }
    Ok(BuiltSql { sql, params })
}

/// Build a LIKE search across the given columns.
///
/// All columns share a single `%needle%` parameter. On Postgres each column
/// is cast to TEXT first, since LIKE does not apply to non-text types there.
///
/// # Errors
/// Returns `ParameterError` when the column list is empty.
pub fn search(
    backend: Backend,
    table: &str,
    needle: &str,
    columns: &[String],
) -> Result<BuiltSql, SqlScribeError> {
    if columns.is_empty() {
        return Err(SqlScribeError::ParameterError(format!(
            "search {table}: no columns to search"
        )));
    }

    let mut sql = format!("SELECT * FROM {} WHERE ", quote_ident(table));
    let p = placeholder(backend, 1);
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            sql.push_str(" OR ");
        }
        match backend {
            Backend::Sqlite => {
                sql.push_str(&quote_ident(column));
            }
            Backend::Postgres => {
                sql.push_str("CAST(");
                sql.push_str(&quote_ident(column));
                sql.push_str(" AS TEXT)");
            }
        }
        sql.push_str(" LIKE ");
        sql.push_str(&p);
    }

    Ok(BuiltSql {
        sql,
        params: vec![DbValue::Text(format!("%{needle}%"))],
    })
}

/// Parse a `needle|col1,col2` search spec.
///
/// The part after `|` names the columns to search; when absent (or empty)
/// the caller is expected to discover columns from the catalog.
#[must_use]
pub fn parse_search_spec(spec: &str) -> (String, Option<Vec<String>>) {
    match spec.split_once('|') {
        None => (spec.to_string(), None),
        Some((needle, rest)) => {
            let columns: Vec<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            let columns = if columns.is_empty() {
                None
            } else {
                Some(columns)
            };
            (needle.to_string(), columns)
        }
    }
}
