//! Schema definitions and wire row shapes consumed by the decoder

use crate::config::DEFAULT_KEY_ALIAS;
use bytes::Bytes;
use std::collections::HashMap;

/// One column as delivered by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    pub name: Bytes,
    pub value: Bytes,
    pub ttl: Option<i32>,
    pub timestamp: Option<i64>,
}

impl RawColumn {
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ttl: None,
            timestamp: None,
        }
    }

    pub fn with_ttl(mut self, ttl: i32) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A row key plus its columns in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub key: Bytes,
    pub columns: Vec<RawColumn>,
}

impl Row {
    pub fn new(key: impl Into<Bytes>, columns: Vec<RawColumn>) -> Self {
        Self {
            key: key.into(),
            columns,
        }
    }
}

/// Declared column of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: Bytes,
    pub validator: String,
}

/// Per-table type metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub keyspace: String,
    pub name: String,
    /// Type of column names
    pub comparator: String,
    /// Type of values without a column-specific validator
    pub default_validator: String,
    pub key_alias: Option<Bytes>,
    pub key_validator: String,
    /// Declared columns in declaration order
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            comparator: "BytesType".to_string(),
            default_validator: "BytesType".to_string(),
            key_alias: None,
            key_validator: "BytesType".to_string(),
            columns: Vec::new(),
        }
    }

    pub fn with_comparator(mut self, comparator: impl Into<String>) -> Self {
        self.comparator = comparator.into();
        self
    }

    pub fn with_default_validator(mut self, validator: impl Into<String>) -> Self {
        self.default_validator = validator.into();
        self
    }

    pub fn with_key(mut self, alias: impl Into<Bytes>, validator: impl Into<String>) -> Self {
        self.key_alias = Some(alias.into());
        self.key_validator = validator.into();
        self
    }

    pub fn with_column(mut self, name: impl Into<Bytes>, validator: impl Into<String>) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            validator: validator.into(),
        });
        self
    }

    /// Key alias bytes, `KEY` when none is declared.
    pub fn key_alias_bytes(&self) -> Bytes {
        self.key_alias
            .clone()
            .unwrap_or_else(|| Bytes::from_static(DEFAULT_KEY_ALIAS.as_bytes()))
    }

    /// Validator declared for exactly this column name.
    pub fn column_validator(&self, name: &[u8]) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name.as_ref() == name)
            .map(|c| c.validator.as_str())
    }

    /// `keyspace.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace, self.name)
    }
}

/// A keyspace and its tables, as described by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspaceDef {
    pub name: String,
    pub tables: Vec<TableSchema>,
}

impl KeyspaceDef {
    pub fn new(name: impl Into<String>, tables: Vec<TableSchema>) -> Self {
        Self {
            name: name.into(),
            tables,
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Type hints the store may attach to a single result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSchema {
    pub name_types: HashMap<Bytes, String>,
    pub value_types: HashMap<Bytes, String>,
    pub default_name_type: String,
    pub default_value_type: String,
}

impl ResultSchema {
    pub fn new(default_name_type: impl Into<String>, default_value_type: impl Into<String>) -> Self {
        Self {
            default_name_type: default_name_type.into(),
            default_value_type: default_value_type.into(),
            ..Default::default()
        }
    }

    pub fn with_value_type(mut self, name: impl Into<Bytes>, type_name: impl Into<String>) -> Self {
        self.value_types.insert(name.into(), type_name.into());
        self
    }

    pub fn with_name_type(mut self, name: impl Into<Bytes>, type_name: impl Into<String>) -> Self {
        self.name_types.insert(name.into(), type_name.into());
        self
    }

    pub fn name_type_for(&self, name: &[u8]) -> &str {
        self.name_types
            .get(name)
            .map_or(self.default_name_type.as_str(), String::as_str)
    }

    pub fn value_type_for(&self, name: &[u8]) -> &str {
        self.value_types
            .get(name)
            .map_or(self.default_value_type.as_str(), String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_schema_lookups() {
        let table = TableSchema::new("ks", "users")
            .with_comparator("UTF8Type")
            .with_column("age", "Int32Type")
            .with_column("name", "UTF8Type");

        assert_eq!(table.column_validator(b"age"), Some("Int32Type"));
        assert_eq!(table.column_validator(b"AGE"), None);
        assert_eq!(table.key_alias_bytes().as_ref(), b"KEY");
        assert_eq!(table.qualified_name(), "ks.users");
    }

    #[test]
    fn test_result_schema_defaults() {
        let schema = ResultSchema::new("UTF8Type", "BytesType").with_value_type("age", "Int32Type");
        assert_eq!(schema.value_type_for(b"age"), "Int32Type");
        assert_eq!(schema.value_type_for(b"other"), "BytesType");
        assert_eq!(schema.name_type_for(b"age"), "UTF8Type");
    }
}
