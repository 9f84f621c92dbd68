//! # CQL adapter core
//!
//! Everything between the transport and the caller-facing driver surface:
//! decoding wire columns into typed values, deriving keyspace and table
//! from statement text, and encoding bound host values.
//!
//! ## Features
//!
//! - Marshal type registry with big-endian codecs (`types`, `codec`)
//! - Accessor conversion cascade over decoded values (`value`)
//! - Schema-driven column decoding with struct-mode row layout (`decoder`)
//! - Regex statement inference and row-limit injection (`inference`)
//! - JDBC-category coercion of bound values (`coercion`)
//! - Statement pipeline and forward-only result sets (`session`, `result_set`)
//!
//! ## Example
//!
//! ```rust
//! use cqlbridge_protocols::cql::{infer_keyspace, infer_table, inject_limit};
//!
//! assert_eq!(infer_keyspace("SELECT a FROM Foo.Bar", "bar"), "Foo");
//! assert_eq!(infer_table("SELECT a FROM Foo.Bar").as_deref(), Some("Bar"));
//! assert_eq!(inject_limit("SELECT * FROM t", 10), "SELECT * FROM t LIMIT 10");
//! ```

pub mod codec;
pub mod coercion;
pub mod column;
pub mod decoder;
pub mod inference;
pub mod jdbc;
pub mod result_set;
pub mod schema;
pub mod session;
pub mod types;
pub mod value;

#[cfg(test)]
mod codec_proptest;

pub use coercion::{to_bytes, to_bytes_for_code, HostValue};
pub use column::{ColumnFailure, CqlStruct, TypedColumn};
pub use decoder::{ColumnDecoder, DecodeMode, SchemaSnapshot};
pub use inference::{
    infer_keyspace, infer_table, inject_limit, is_select_all_query, is_select_count_query,
    is_select_query, matches_name_pattern, QueryContext,
};
pub use jdbc::JdbcType;
pub use result_set::{ColumnIndex, ResultSet, ResultSetMetadata, RowId};
pub use schema::{ColumnDef, KeyspaceDef, RawColumn, ResultSchema, Row, TableSchema};
pub use session::{QueryExecutor, QueryResult, RowStream, Session, StatementOutcome};
pub use types::{CqlType, TypeRegistry};
pub use value::CqlValue;
