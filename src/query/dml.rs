use crate::error::SqlScribeError;
use crate::types::{Backend, DbValue};

use super::{BuiltSql, append_conditions, placeholder, quote_ident};

/// Build an INSERT statement from a field map.
///
/// # Errors
/// Returns `ParameterError` when no fields are given.
pub fn insert(
    backend: Backend,
    table: &str,
    fields: &[(&str, DbValue)],
) -> Result<BuiltSql, SqlScribeError> {
    if fields.is_empty() {
        return Err(SqlScribeError::ParameterError(format!(
            "insert into {table}: no fields given"
        )));
    }

    let mut columns = String::new();
    let mut values = String::new();
    let mut params = Vec::with_capacity(fields.len());
    for (i, (column, value)) in fields.iter().enumerate() {
        if i > 0 {
            columns.push_str(", ");
            values.push_str(", ");
        }
        columns.push_str(&quote_ident(column));
        values.push_str(&placeholder(backend, i + 1));
        params.push(value.clone());
    }

    Ok(BuiltSql {
        sql: format!(
            "INSERT INTO {} ({columns}) VALUES ({values})",
            quote_ident(table)
        ),
        params,
    })
}

/// Build an UPDATE statement from a field map and an AND-joined condition list.
///
/// # Errors
/// Returns `ParameterError` when no fields are given, or when the condition
/// list is empty (an unconditional UPDATE is refused).
pub fn update(
    backend: Backend,
    table: &str,
    fields: &[(&str, DbValue)],
    conditions: &[(&str, DbValue)],
) -> Result<BuiltSql, SqlScribeError> {
    if fields.is_empty() {
        return Err(SqlScribeError::ParameterError(format!(
            "update {table}: no fields given"
        )));
    }
    if conditions.is_empty() {
        return Err(SqlScribeError::ParameterError(format!(
            "update {table}: refusing to update without conditions"
        )));
    }

    let mut sql = format!("UPDATE {} SET ", quote_ident(table));
    let mut params = Vec::with_capacity(fields.len() + conditions.len());
    let mut next = 1;
    for (i, (column, value)) in fields.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&quote_ident(column));
        sql.push_str(" = ");
        sql.push_str(&placeholder(backend, next));
        next += 1;
        params.push(value.clone());
    }
    sql.push_str(" WHERE ");
    append_conditions(backend, &mut sql, &mut params, conditions, &mut next);

    Ok(BuiltSql { sql, params })
}

/// Build a DELETE statement from an AND-joined condition list.
///
/// # Errors
/// Returns `ParameterError` when the condition list is empty (an
/// unconditional DELETE is refused).
pub fn delete(
    backend: Backend,
    table: &str,
    conditions: &[(&str, DbValue)],
) -> Result<BuiltSql, SqlScribeError> {
    if conditions.is_empty() {
        return Err(SqlScribeError::ParameterError(format!(
            "delete from {table}: refusing to delete without conditions"
        )));
    }

    let mut sql = format!("DELETE FROM {} WHERE ", quote_ident(table));
    let mut params = Vec::with_capacity(conditions.len());
    let mut next = 1;
    append_conditions(backend, &mut sql, &mut params, conditions, &mut next);

    Ok(BuiltSql { sql, params })
}
