//! CQL marshal type catalog and registry
//!
//! Every column name and value arriving from the store is interpreted through
//! one of these types. Schema definitions name them with either the short form
//! (`UTF8Type`) or a fully-qualified class-style form
//! (`org.apache.cassandra.db.marshal.UTF8Type`).

use super::jdbc::JdbcType;
use super::value::CqlValue;
use crate::config::ROW_TYPE_NAME;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Marshal types understood by the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CqlType {
    Ascii,
    Utf8,
    Bytes,
    Boolean,
    Int32,
    Long,
    /// Arbitrary-precision integer (varint)
    Integer,
    Decimal,
    Float,
    Double,
    /// Milliseconds since epoch
    Date,
    Counter,
    Uuid,
    TimeUuid,
    LexicalUuid,
    /// Composite of other columns; never on the wire
    Row,
}

impl CqlType {
    /// Canonical short name.
    pub fn name(self) -> &'static str {
        match self {
            CqlType::Ascii => "AsciiType",
            CqlType::Utf8 => "UTF8Type",
            CqlType::Bytes => "BytesType",
            CqlType::Boolean => "BooleanType",
            CqlType::Int32 => "Int32Type",
            CqlType::Long => "LongType",
            CqlType::Integer => "IntegerType",
            CqlType::Decimal => "DecimalType",
            CqlType::Float => "FloatType",
            CqlType::Double => "DoubleType",
            CqlType::Date => "DateType",
            CqlType::Counter => "CounterColumnType",
            CqlType::Uuid => "UUIDType",
            CqlType::TimeUuid => "TimeUUIDType",
            CqlType::LexicalUuid => "LexicalUUIDType",
            CqlType::Row => ROW_TYPE_NAME,
        }
    }

    /// Name of the host value kind produced by `compose`.
    pub fn native_kind(self) -> &'static str {
        match self {
            CqlType::Ascii | CqlType::Utf8 => "String",
            CqlType::Bytes => "ByteBuffer",
            CqlType::Boolean => "Boolean",
            CqlType::Int32 => "Integer",
            CqlType::Long | CqlType::Counter => "Long",
            CqlType::Integer => "BigInteger",
            CqlType::Decimal => "BigDecimal",
            CqlType::Float => "Float",
            CqlType::Double => "Double",
            CqlType::Date => "Date",
            CqlType::Uuid | CqlType::TimeUuid | CqlType::LexicalUuid => "UUID",
            CqlType::Row => "CassandraStruct",
        }
    }

    /// Type code reported in result metadata.
    pub fn jdbc_type(self) -> JdbcType {
        match self {
            CqlType::Ascii | CqlType::Utf8 => JdbcType::VarChar,
            CqlType::Bytes => JdbcType::Binary,
            CqlType::Boolean => JdbcType::Boolean,
            CqlType::Int32 => JdbcType::Integer,
            CqlType::Long | CqlType::Counter | CqlType::Integer => JdbcType::BigInt,
            CqlType::Decimal => JdbcType::Decimal,
            CqlType::Float => JdbcType::Float,
            CqlType::Double => JdbcType::Double,
            CqlType::Date => JdbcType::Timestamp,
            CqlType::Uuid | CqlType::TimeUuid | CqlType::LexicalUuid => JdbcType::Char,
            CqlType::Row => JdbcType::Struct,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            CqlType::Int32
                | CqlType::Long
                | CqlType::Integer
                | CqlType::Decimal
                | CqlType::Float
                | CqlType::Double
                | CqlType::Counter
        )
    }

    pub fn is_case_sensitive(self) -> bool {
        matches!(self, CqlType::Ascii | CqlType::Utf8)
    }

    pub fn is_currency(self) -> bool {
        false
    }

    /// Display width or digit count for a value; `-1` when not applicable.
    pub fn precision(self, value: Option<&CqlValue>) -> i32 {
        match self {
            CqlType::Int32 | CqlType::Long | CqlType::Counter | CqlType::Integer | CqlType::Boolean => {
                value.map_or(-1, |v| v.to_string().len() as i32)
            }
            CqlType::Decimal => match value {
                Some(CqlValue::Decimal(d)) => {
                    d.as_bigint_and_exponent().0.magnitude().to_string().len() as i32
                }
                _ => -1,
            },
            CqlType::Float => 7,
            CqlType::Double => 15,
            CqlType::Uuid | CqlType::TimeUuid | CqlType::LexicalUuid => 36,
            CqlType::Ascii | CqlType::Utf8 | CqlType::Bytes | CqlType::Date | CqlType::Row => -1,
        }
    }

    /// Digits right of the decimal point; `-1` when not applicable.
    pub fn scale(self, value: Option<&CqlValue>) -> i32 {
        match self {
            CqlType::Int32
            | CqlType::Long
            | CqlType::Counter
            | CqlType::Integer
            | CqlType::Boolean
            | CqlType::Uuid
            | CqlType::TimeUuid
            | CqlType::LexicalUuid => 0,
            CqlType::Decimal => match value {
                Some(CqlValue::Decimal(d)) => {
                    let scale = d.as_bigint_and_exponent().1;
                    scale.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
                }
                _ => 0,
            },
            CqlType::Float => 40,
            CqlType::Double => 300,
            CqlType::Ascii | CqlType::Utf8 | CqlType::Bytes | CqlType::Date | CqlType::Row => -1,
        }
    }

    /// Required wire width for fixed-width types.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            CqlType::Boolean => Some(1),
            CqlType::Int32 | CqlType::Float => Some(4),
            CqlType::Long | CqlType::Double | CqlType::Date | CqlType::Counter => Some(8),
            CqlType::Uuid | CqlType::TimeUuid | CqlType::LexicalUuid => Some(16),
            _ => None,
        }
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Process-wide lookup from type name to [`CqlType`]
pub struct TypeRegistry {
    types: HashMap<&'static str, CqlType>,
}

static REGISTRY: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::build);

impl TypeRegistry {
    fn build() -> Self {
        let mut types = HashMap::new();
        for t in [
            CqlType::Ascii,
            CqlType::Utf8,
            CqlType::Bytes,
            CqlType::Boolean,
            CqlType::Int32,
            CqlType::Long,
            CqlType::Integer,
            CqlType::Decimal,
            CqlType::Float,
            CqlType::Double,
            CqlType::Date,
            CqlType::Counter,
            CqlType::Uuid,
            CqlType::TimeUuid,
            CqlType::LexicalUuid,
            CqlType::Row,
        ] {
            types.insert(t.name(), t);
        }
        types.insert("TimestampType", CqlType::Date);
        Self { types }
    }

    /// Shared registry instance.
    pub fn global() -> &'static TypeRegistry {
        &REGISTRY
    }

    /// Resolve a type by name.
    ///
    /// Anything up to and including the last `.` is ignored. The remaining
    /// suffix must match exactly, case included. Unknown names yield `None`.
    pub fn lookup(&self, type_name: &str) -> Option<CqlType> {
        let short = match type_name.rfind('.') {
            Some(idx) => &type_name[idx + 1..],
            None => type_name,
        };
        self.types.get(short).copied()
    }

    /// Resolve a type by name, substituting raw bytes for unknown names.
    pub fn lookup_or_bytes(&self, type_name: &str) -> CqlType {
        self.lookup(type_name).unwrap_or(CqlType::Bytes)
    }

    /// Number of registered names, aliases included.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
