//! Typed columns: the unit a result row is made of

use super::schema::{ColumnDef, RawColumn};
use super::types::{CqlType, TypeRegistry};
use super::value::CqlValue;
use crate::config::{ROW_COLUMN_NAME, ROW_TYPE_NAME};
use crate::error::{ProtocolError, ProtocolResult};
use cqlbridge_util::ByteUtils;
use std::fmt;

/// Why a wire column could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnFailure {
    Marshal(String),
    Encoding(String),
}

impl ColumnFailure {
    fn from_error(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Encoding(msg) => ColumnFailure::Encoding(msg),
            other => ColumnFailure::Marshal(other.to_string()),
        }
    }

    pub fn to_error(&self) -> ProtocolError {
        match self {
            ColumnFailure::Marshal(msg) => ProtocolError::Marshal(msg.clone()),
            ColumnFailure::Encoding(msg) => ProtocolError::Encoding(msg.clone()),
        }
    }
}

/// A column with its name and value decoded by their marshal types.
///
/// Decoding happens once, at construction. A column whose bytes do not fit
/// its types is still constructed so that sibling columns stay readable;
/// the failure is kept and reported by [`TypedColumn::check`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypedColumn {
    raw: Option<RawColumn>,
    name: String,
    value: Option<CqlValue>,
    display: String,
    name_type: CqlType,
    value_type: CqlType,
    failure: Option<ColumnFailure>,
}

impl TypedColumn {
    /// Decode a wire column.
    pub fn new(raw: RawColumn, name_type: CqlType, value_type: CqlType) -> Self {
        let mut failure = None;

        let name = match name_type.display_string(&raw.name) {
            Ok(name) => name,
            Err(err) => {
                failure = Some(ColumnFailure::from_error(err));
                ByteUtils::to_hex(&raw.name)
            }
        };

        let (value, display) = if raw.value.is_empty() {
            (None, String::new())
        } else {
            match value_type
                .compose(&raw.value)
                .and_then(|v| value_type.display_string(&raw.value).map(|d| (v, d)))
            {
                Ok((value, display)) => (Some(value), display),
                Err(err) => {
                    failure.get_or_insert(ColumnFailure::from_error(err));
                    (None, String::new())
                }
            }
        };

        Self {
            raw: Some(raw),
            name,
            value,
            display,
            name_type,
            value_type,
            failure,
        }
    }

    /// Decode a wire column, failing on the first bad name or value.
    pub fn try_new(raw: RawColumn, name_type: CqlType, value_type: CqlType) -> ProtocolResult<Self> {
        let column = Self::new(raw, name_type, value_type);
        column.check()?;
        Ok(column)
    }

    /// Null placeholder for a declared column missing from the row.
    pub fn placeholder(def: &ColumnDef) -> Self {
        Self {
            raw: None,
            name: ByteUtils::best_effort_utf8(&def.name),
            value: None,
            display: String::new(),
            name_type: CqlType::Utf8,
            value_type: TypeRegistry::global().lookup_or_bytes(&def.validator),
            failure: None,
        }
    }

    /// Column built from bytes that did not arrive as a wire column.
    pub fn synthetic(name: &[u8], value: &[u8], name_type: CqlType, value_type: CqlType) -> Self {
        let mut column = Self::new(RawColumn::new(name.to_vec(), value.to_vec()), name_type, value_type);
        column.raw = None;
        column
    }

    /// The trailing composite column of a struct-mode row.
    pub fn row(row: CqlStruct) -> Self {
        let display = row.to_string();
        Self {
            raw: None,
            name: ROW_COLUMN_NAME.to_string(),
            value: Some(CqlValue::Struct(row)),
            display,
            name_type: CqlType::Ascii,
            value_type: CqlType::Row,
            failure: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded value; `None` for null, absent or undecodable values.
    pub fn value(&self) -> Option<&CqlValue> {
        self.value.as_ref()
    }

    /// Type-appropriate text form of the value.
    pub fn display_string(&self) -> &str {
        &self.display
    }

    pub fn raw_column(&self) -> Option<&RawColumn> {
        self.raw.as_ref()
    }

    pub fn name_type(&self) -> CqlType {
        self.name_type
    }

    pub fn value_type(&self) -> CqlType {
        self.value_type
    }

    pub fn ttl(&self) -> Option<i32> {
        self.raw.as_ref().and_then(|r| r.ttl)
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.raw.as_ref().and_then(|r| r.timestamp)
    }

    pub fn failure(&self) -> Option<&ColumnFailure> {
        self.failure.as_ref()
    }

    /// Error for a column whose bytes could not be decoded.
    pub fn check(&self) -> ProtocolResult<()> {
        match &self.failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

impl fmt::Display for TypedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.display)
    }
}

/// Row columns that matched no declared table column, in arrival order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CqlStruct {
    columns: Vec<TypedColumn>,
}

impl CqlStruct {
    pub fn new(columns: Vec<TypedColumn>) -> Self {
        Self { columns }
    }

    pub fn push(&mut self, column: TypedColumn) {
        self.columns.push(column);
    }

    pub fn columns(&self) -> &[TypedColumn] {
        &self.columns
    }

    /// Values of the nested columns, in order.
    pub fn attributes(&self) -> Vec<Option<&CqlValue>> {
        self.columns.iter().map(TypedColumn::value).collect()
    }

    pub fn sql_type_name(&self) -> &'static str {
        ROW_TYPE_NAME
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl fmt::Display for CqlStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, column) in self.columns.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{column}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn int_column(name: &str, value: i32) -> TypedColumn {
        TypedColumn::new(
            RawColumn::new(name.to_string(), value.to_be_bytes().to_vec())
                .with_ttl(60)
                .with_timestamp(1000),
            CqlType::Utf8,
            CqlType::Int32,
        )
    }

    #[test]
    fn test_wire_column() {
        let column = int_column("age", 42);
        assert_eq!(column.name(), "age");
        assert_eq!(column.value(), Some(&CqlValue::Int32(42)));
        assert_eq!(column.display_string(), "42");
        assert_eq!(column.ttl(), Some(60));
        assert_eq!(column.timestamp(), Some(1000));
        assert!(column.check().is_ok());
    }

    #[test]
    fn test_empty_value_is_null() {
        let column = TypedColumn::new(RawColumn::new("age", Bytes::new()), CqlType::Utf8, CqlType::Int32);
        assert_eq!(column.value(), None);
        assert_eq!(column.display_string(), "");
        assert!(column.raw_column().is_some());
    }

    #[test]
    fn test_bad_value_is_kept_as_failure() {
        let column = TypedColumn::new(RawColumn::new("age", vec![1u8, 2, 3]), CqlType::Utf8, CqlType::Int32);
        assert_eq!(column.name(), "age");
        assert_eq!(column.value(), None);
        assert_eq!(
            column.failure(),
            Some(&ColumnFailure::Marshal("A int is exactly 4 bytes: 3".to_string()))
        );
        assert!(TypedColumn::try_new(RawColumn::new("age", vec![1u8, 2, 3]), CqlType::Utf8, CqlType::Int32).is_err());
    }

    #[test]
    fn test_bad_name_is_encoding_failure() {
        let column = TypedColumn::new(RawColumn::new(vec![0xffu8], "v"), CqlType::Utf8, CqlType::Utf8);
        assert_eq!(column.name(), "ff");
        assert!(matches!(column.check(), Err(ProtocolError::Encoding(_))));
    }

    #[test]
    fn test_synthetic_columns_have_no_wire_metadata() {
        let column = TypedColumn::synthetic(b"KEY", b"row1", CqlType::Ascii, CqlType::Utf8);
        assert_eq!(column.name(), "KEY");
        assert_eq!(column.value(), Some(&CqlValue::Text("row1".to_string())));
        assert!(column.raw_column().is_none());
        assert_eq!(column.ttl(), None);
        assert_eq!(column.timestamp(), None);
    }

    #[test]
    fn test_placeholder_uses_declared_type() {
        let def = ColumnDef {
            name: Bytes::from_static(b"score"),
            validator: "org.apache.cassandra.db.marshal.DoubleType".to_string(),
        };
        let column = TypedColumn::placeholder(&def);
        assert_eq!(column.name(), "score");
        assert_eq!(column.value(), None);
        assert_eq!(column.value_type(), CqlType::Double);
    }

    #[test]
    fn test_row_struct_display() {
        let mut row = CqlStruct::default();
        row.push(int_column("a", 1));
        row.push(TypedColumn::new(RawColumn::new("b", "x"), CqlType::Utf8, CqlType::Utf8));
        let column = TypedColumn::row(row);

        assert_eq!(column.name(), ROW_COLUMN_NAME);
        assert_eq!(column.value_type(), CqlType::Row);
        assert_eq!(column.display_string(), "a:1,b:x");
        match column.value() {
            Some(CqlValue::Struct(s)) => {
                assert_eq!(s.len(), 2);
                assert_eq!(s.sql_type_name(), "ROW");
                assert_eq!(s.attributes()[0], Some(&CqlValue::Int32(1)));
            }
            other => panic!("Expected struct value, got {other:?}"),
        }
    }
}
