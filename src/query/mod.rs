//! Statement construction.
//!
//! Everything in this module is pure string building: identifiers are
//! double-quote escaped, caller data travels as bound parameters (`?N` for
//! SQLite, `$N` for Postgres). [`literal`] renders values as SQL text and
//! exists solely for the dump writer, where binding is not an option.

use crate::types::{Backend, DbValue};

mod dml;
mod select;

pub use dml::{delete, insert, update};
pub use select::{parse_search_spec, search, select, select_where};

/// A SQL statement paired with the parameters it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSql {
    /// The SQL text, with backend-appropriate placeholders
    pub sql: String,
    /// The parameters to bind, in placeholder order
    pub params: Vec<DbValue>,
}

/// Quote an identifier for use in SQL text.
///
/// Embedded double quotes are doubled, so arbitrary table and column names
/// are safe to splice.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 2);
    out.push('"');
    for ch in ident.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Escape a string for inclusion in a single-quoted SQL literal.
#[must_use]
pub fn escape_str(s: &str) -> String {
    s.replace('\'', "''")
}

/// Render a value as a standalone SQL literal for the given backend.
///
/// Used by the dump writer. Non-finite floats have no SQL literal form and
/// render as NULL.
#[must_use]
pub fn literal(backend: Backend, value: &DbValue) -> String {
    match value {
        DbValue::Null => "NULL".to_string(),
        DbValue::Int(i) => i.to_string(),
        DbValue::Float(f) => {
            if f.is_finite() {
                f.to_string()
            } else {
                "NULL".to_string()
            }
        }
        DbValue::Bool(b) => match backend {
            Backend::Sqlite => if *b { "1" } else { "0" }.to_string(),
            Backend::Postgres => if *b { "TRUE" } else { "FALSE" }.to_string(),
        },
        DbValue::Text(s) => format!("'{}'", escape_str(s)),
        DbValue::Timestamp(dt) => format!("'{}'", dt.format("%F %T%.f")),
        DbValue::Json(v) => format!("'{}'", escape_str(&v.to_string())),
        DbValue::Blob(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2);
            for b in bytes {
                hex.push_str(&format!("{b:02X}"));
            }
            match backend {
                Backend::Sqlite => format!("X'{hex}'"),
                Backend::Postgres => format!("'\\x{hex}'"),
            }
        }
    }
}

pub(crate) fn placeholder(backend: Backend, n: usize) -> String {
    match backend {
        Backend::Sqlite => format!("?{n}"),
        Backend::Postgres => format!("${n}"),
    }
}

/// Append an AND-joined condition list to `sql`, binding values as needed.
///
/// NULL values render as `IS NULL` rather than binding a parameter, since an
/// `= NULL` predicate can never match.
pub(crate) fn append_conditions(
    backend: Backend,
    sql: &mut String,
    params: &mut Vec<DbValue>,
    conditions: &[(&str, DbValue)],
    next_placeholder: &mut usize,
) {
    for (i, (column, value)) in conditions.iter().enumerate() {
        if i > 0 {
            sql.push_str(" AND ");
        }
        sql.push_str(&quote_ident(column));
        if value.is_null() {
            sql.push_str(" IS NULL");
        } else {
            sql.push_str(" = ");
            sql.push_str(&placeholder(backend, *next_placeholder));
            *next_placeholder += 1;
            params.push(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn escape_str_doubles_single_quotes() {
        assert_eq!(escape_str("O'Brien"), "O''Brien");
        assert_eq!(escape_str("no quotes"), "no quotes");
    }

    #[test]
    fn literal_renders_scalars() {
        assert_eq!(literal(Backend::Sqlite, &DbValue::Null), "NULL");
        assert_eq!(literal(Backend::Sqlite, &DbValue::Int(-3)), "-3");
        assert_eq!(literal(Backend::Sqlite, &DbValue::Float(1.5)), "1.5");
        assert_eq!(literal(Backend::Sqlite, &DbValue::Float(f64::NAN)), "NULL");
        assert_eq!(literal(Backend::Sqlite, &DbValue::Bool(true)), "1");
        assert_eq!(literal(Backend::Postgres, &DbValue::Bool(true)), "TRUE");
        assert_eq!(
            literal(Backend::Sqlite, &DbValue::from("it's")),
            "'it''s'"
        );
    }

    #[test]
    fn literal_renders_json_and_blob() {
        assert_eq!(
            literal(Backend::Sqlite, &DbValue::Json(json!({"a": 1}))),
            "'{\"a\":1}'"
        );
        let blob = DbValue::Blob(vec![0xDE, 0xAD, 0x01]);
        assert_eq!(literal(Backend::Sqlite, &blob), "X'DEAD01'");
        assert_eq!(literal(Backend::Postgres, &blob), "'\\xDEAD01'");
    }
}
