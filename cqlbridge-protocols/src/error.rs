//! Error types for the CQL adapter core

use cqlbridge_util::TextDecodeError;
use thiserror::Error;

/// Result type for adapter operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Coarse grouping of errors as seen by surrounding driver code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad data: wrong widths, bad text, unparsable strings, bad bindings.
    DataError,
    /// The store or the link to it failed.
    Connectivity,
    /// Operation has no meaning here.
    Unsupported,
    /// Caller misuse: bad column index, wrong statement kind, bad config.
    Usage,
}

/// Errors that can occur in the adapter core
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A fixed-width buffer had the wrong length
    #[error("{0}")]
    Marshal(String),

    /// Text could not be encoded or decoded in the declared character set
    #[error("{0}")]
    Encoding(String),

    /// A string could not be coerced into the requested value
    #[error("{0}")]
    Syntax(String),

    /// A bound object is not acceptable for the requested target type
    #[error("{0}")]
    TypeMismatch(String),

    /// Operation is not supported
    #[error("{0}")]
    Unsupported(String),

    /// The store rejected the statement
    #[error("{why}\n'{query}'")]
    InvalidRequest { why: String, query: String },

    /// No replica could serve the request
    #[error("no Cassandra server is available")]
    RemoteUnavailable,

    /// The store did not answer in time
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Nodes disagree on the schema version
    #[error("schema does not match across nodes, (try again later)")]
    SchemaConflict,

    /// Transport or protocol level failure
    #[error("remote protocol error: {0}")]
    RemoteProtocol(String),

    /// Connection configuration or URL problem
    #[error("configuration error: {0}")]
    Config(String),

    /// A statement that should produce rows did not
    #[error("No ResultSet returned from the CQL statement passed in an 'executeQuery()' method")]
    NoResultSet,

    /// A statement that should produce an update count did not
    #[error("No Update Count was returned from the CQL statement passed in an 'executeUpdate()' method")]
    NoUpdateCount,

    /// No schema snapshot entry for a table
    #[error("could not find decoder metadata for: {keyspace}.{table}")]
    MissingMetadata { keyspace: String, table: String },

    /// Unknown column index or label
    #[error("{0}")]
    InvalidColumn(String),

    /// Operation on a closed session or exhausted result
    #[error("{0}")]
    Closed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ProtocolError {
    /// Grouping used by callers that only care about the failure class.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProtocolError::Marshal(_)
            | ProtocolError::Encoding(_)
            | ProtocolError::Syntax(_)
            | ProtocolError::TypeMismatch(_)
            | ProtocolError::InvalidRequest { .. }
            | ProtocolError::Serialization(_) => ErrorCategory::DataError,
            ProtocolError::RemoteUnavailable
            | ProtocolError::Timeout(_)
            | ProtocolError::SchemaConflict
            | ProtocolError::RemoteProtocol(_)
            | ProtocolError::Io(_) => ErrorCategory::Connectivity,
            ProtocolError::Unsupported(_) => ErrorCategory::Unsupported,
            ProtocolError::Config(_)
            | ProtocolError::NoResultSet
            | ProtocolError::NoUpdateCount
            | ProtocolError::MissingMetadata { .. }
            | ProtocolError::InvalidColumn(_)
            | ProtocolError::Closed(_) => ErrorCategory::Usage,
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProtocolError::RemoteUnavailable | ProtocolError::Timeout(_) | ProtocolError::SchemaConflict
        )
    }
}

impl From<TextDecodeError> for ProtocolError {
    fn from(err: TextDecodeError) -> Self {
        ProtocolError::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ProtocolError {
    fn from(err: toml::de::Error) -> Self {
        ProtocolError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ProtocolError {
    fn from(err: toml::ser::Error) -> Self {
        ProtocolError::Serialization(err.to_string())
    }
}

// Helper functions for creating specific error types
impl ProtocolError {
    /// Wrong buffer width for a fixed-width type.
    pub fn marshal_width(type_label: &str, expected: usize, actual: usize) -> Self {
        match type_label {
            "double" => ProtocolError::Marshal(format!(
                "A double is exactly {expected} bytes : {actual}"
            )),
            _ => ProtocolError::Marshal(format!(
                "A {type_label} is exactly {expected} bytes: {actual}"
            )),
        }
    }

    /// A stored value cannot be read as the requested host type.
    pub fn not_translatable(stored: &str, requested: &str) -> Self {
        ProtocolError::Syntax(format!(
            "column was stored in {stored} format which is not translatable to {requested}"
        ))
    }

    /// A bound object kind is not accepted for a JDBC target.
    pub fn bad_mapping(object_kind: &str, accepted: &str, target: &str) -> Self {
        ProtocolError::TypeMismatch(format!(
            "encountered object of class: {object_kind}, but only '{accepted}' is supported to map to {target}"
        ))
    }

    /// JDBC target category with no coercion at all.
    pub fn unsupported_jdbc_type(code: i32) -> Self {
        ProtocolError::Unsupported(format!("Unsupported transformation to Jdbc Type: {code}"))
    }

    /// Feature that the store does not offer.
    pub fn not_supported(feature: &str) -> Self {
        ProtocolError::Unsupported(format!(
            "the Cassandra implementation does not currently support {feature}"
        ))
    }
}
