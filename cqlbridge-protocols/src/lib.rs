//! # CQL bridge protocol core
//!
//! The data-path core of a JDBC-style adapter for a wide-column store
//! speaking CQL 2/3 over a legacy RPC transport. The transport itself is
//! external; this crate consumes rows and schema from it through the
//! [`cql::QueryExecutor`] trait.
//!
//! ## Architecture
//!
//! - [`config`]: connection configuration from URLs, property maps and TOML
//! - [`cql`]: type registry, codecs, column decoding, statement inference,
//!   value coercion, sessions and result sets
//! - [`error`]: the crate-wide [`ProtocolError`]
//! - [`logging`]: tracing subscriber bootstrap

pub mod config;
pub mod cql;
pub mod error;
pub mod logging;

pub use error::{ErrorCategory, ProtocolError, ProtocolResult};
