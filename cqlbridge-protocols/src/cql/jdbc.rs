//! Relational type codes reported to and accepted from callers

use std::fmt;

/// Generic SQL type codes, numerically identical to `java.sql.Types`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JdbcType {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    Date,
    Time,
    Timestamp,
    Binary,
    VarBinary,
    LongVarBinary,
    Null,
    Other,
    JavaObject,
    Distinct,
    Struct,
    Array,
    Blob,
    Clob,
    Ref,
    DataLink,
    Boolean,
    RowId,
    NChar,
    NVarChar,
    LongNVarChar,
    NClob,
    SqlXml,
}

const ALL_TYPES: [JdbcType; 36] = [
    JdbcType::Bit,
    JdbcType::TinyInt,
    JdbcType::SmallInt,
    JdbcType::Integer,
    JdbcType::BigInt,
    JdbcType::Float,
    JdbcType::Real,
    JdbcType::Double,
    JdbcType::Numeric,
    JdbcType::Decimal,
    JdbcType::Char,
    JdbcType::VarChar,
    JdbcType::LongVarChar,
    JdbcType::Date,
    JdbcType::Time,
    JdbcType::Timestamp,
    JdbcType::Binary,
    JdbcType::VarBinary,
    JdbcType::LongVarBinary,
    JdbcType::Null,
    JdbcType::Other,
    JdbcType::JavaObject,
    JdbcType::Distinct,
    JdbcType::Struct,
    JdbcType::Array,
    JdbcType::Blob,
    JdbcType::Clob,
    JdbcType::Ref,
    JdbcType::DataLink,
    JdbcType::Boolean,
    JdbcType::RowId,
    JdbcType::NChar,
    JdbcType::NVarChar,
    JdbcType::LongNVarChar,
    JdbcType::NClob,
    JdbcType::SqlXml,
];

impl JdbcType {
    /// Numeric code as used on the relational API.
    pub fn code(self) -> i32 {
        match self {
            JdbcType::Bit => -7,
            JdbcType::TinyInt => -6,
            JdbcType::SmallInt => 5,
            JdbcType::Integer => 4,
            JdbcType::BigInt => -5,
            JdbcType::Float => 6,
            JdbcType::Real => 7,
            JdbcType::Double => 8,
            JdbcType::Numeric => 2,
            JdbcType::Decimal => 3,
            JdbcType::Char => 1,
            JdbcType::VarChar => 12,
            JdbcType::LongVarChar => -1,
            JdbcType::Date => 91,
            JdbcType::Time => 92,
            JdbcType::Timestamp => 93,
            JdbcType::Binary => -2,
            JdbcType::VarBinary => -3,
            JdbcType::LongVarBinary => -4,
            JdbcType::Null => 0,
            JdbcType::Other => 1111,
            JdbcType::JavaObject => 2000,
            JdbcType::Distinct => 2001,
            JdbcType::Struct => 2002,
            JdbcType::Array => 2003,
            JdbcType::Blob => 2004,
            JdbcType::Clob => 2005,
            JdbcType::Ref => 2006,
            JdbcType::DataLink => 70,
            JdbcType::Boolean => 16,
            JdbcType::RowId => -8,
            JdbcType::NChar => -15,
            JdbcType::NVarChar => -9,
            JdbcType::LongNVarChar => -16,
            JdbcType::NClob => 2011,
            JdbcType::SqlXml => 2009,
        }
    }

    /// Reverse of [`JdbcType::code`].
    pub fn from_code(code: i32) -> Option<Self> {
        ALL_TYPES.iter().copied().find(|t| t.code() == code)
    }

    /// Upper-case name as in `java.sql.Types`.
    pub fn name(self) -> &'static str {
        match self {
            JdbcType::Bit => "BIT",
            JdbcType::TinyInt => "TINYINT",
            JdbcType::SmallInt => "SMALLINT",
            JdbcType::Integer => "INTEGER",
            JdbcType::BigInt => "BIGINT",
            JdbcType::Float => "FLOAT",
            JdbcType::Real => "REAL",
            JdbcType::Double => "DOUBLE",
            JdbcType::Numeric => "NUMERIC",
            JdbcType::Decimal => "DECIMAL",
            JdbcType::Char => "CHAR",
            JdbcType::VarChar => "VARCHAR",
            JdbcType::LongVarChar => "LONGVARCHAR",
            JdbcType::Date => "DATE",
            JdbcType::Time => "TIME",
            JdbcType::Timestamp => "TIMESTAMP",
            JdbcType::Binary => "BINARY",
            JdbcType::VarBinary => "VARBINARY",
            JdbcType::LongVarBinary => "LONGVARBINARY",
            JdbcType::Null => "NULL",
            JdbcType::Other => "OTHER",
            JdbcType::JavaObject => "JAVA_OBJECT",
            JdbcType::Distinct => "DISTINCT",
            JdbcType::Struct => "STRUCT",
            JdbcType::Array => "ARRAY",
            JdbcType::Blob => "BLOB",
            JdbcType::Clob => "CLOB",
            JdbcType::Ref => "REF",
            JdbcType::DataLink => "DATALINK",
            JdbcType::Boolean => "BOOLEAN",
            JdbcType::RowId => "ROWID",
            JdbcType::NChar => "NCHAR",
            JdbcType::NVarChar => "NVARCHAR",
            JdbcType::LongNVarChar => "LONGNVARCHAR",
            JdbcType::NClob => "NCLOB",
            JdbcType::SqlXml => "SQLXML",
        }
    }
}

impl fmt::Display for JdbcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique_and_reversible() {
        let codes: HashSet<i32> = ALL_TYPES.iter().map(|t| t.code()).collect();
        assert_eq!(codes.len(), ALL_TYPES.len());
        for t in ALL_TYPES {
            assert_eq!(JdbcType::from_code(t.code()), Some(t));
        }
        assert_eq!(JdbcType::from_code(424242), None);
    }

    #[test]
    fn test_well_known_codes() {
        assert_eq!(JdbcType::VarChar.code(), 12);
        assert_eq!(JdbcType::Binary.code(), -2);
        assert_eq!(JdbcType::Struct.code(), 2002);
        assert_eq!(JdbcType::Timestamp.to_string(), "TIMESTAMP");
    }
}
