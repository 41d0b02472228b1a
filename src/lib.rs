//! Async CRUD, search, and SQL dump helpers over rusqlite and
//! tokio-postgres.
//!
//! The crate builds statements from loosely-typed field maps, executes them
//! through pooled connections, and converts result rows into name/value
//! mappings, opportunistically decoding JSON and PHP-serialized text cells
//! on the way out. A naive sequential dump writer covers backup and
//! restore.
//!
//! ```rust,no_run
//! use sql_scribe::{DbValue, Scribe};
//!
//! # async fn demo() -> Result<(), sql_scribe::SqlScribeError> {
//! let db = Scribe::connect_sqlite("app.db").await?;
//! db.batch("CREATE TABLE IF NOT EXISTS player (id INTEGER PRIMARY KEY, name TEXT);")
//!     .await?;
//! db.insert("player", &[("name", DbValue::from("alice"))]).await?;
//! for row in db.select("player", &[]).await? {
//!     println!("{row:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod decode;
pub mod error;
pub mod pool;
pub mod postgres;
pub mod prelude;
pub mod query;
pub mod results;
pub mod schema;
pub mod sqlite;
pub mod types;

mod scribe;

pub use error::SqlScribeError;
pub use pool::{DbConn, DbPool, SqlExecutor};
pub use query::{BuiltSql, escape_str, literal, quote_ident};
pub use results::{DbRow, Record, ResultSet};
pub use scribe::Scribe;
pub use types::{Backend, DbValue};
