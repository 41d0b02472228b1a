//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::decode::{decode_row, decode_value, is_json, is_serialized, unserialize};
pub use crate::error::SqlScribeError;
pub use crate::pool::{DbConn, DbPool, SqlExecutor};
pub use crate::query::{BuiltSql, escape_str, literal, quote_ident};
pub use crate::results::{DbRow, Record, ResultSet};
pub use crate::scribe::Scribe;
pub use crate::types::{Backend, DbValue};
