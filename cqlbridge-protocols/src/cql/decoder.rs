//! Schema-driven column decoding
//!
//! The decoder holds an immutable snapshot of every known table keyed by
//! `keyspace.table`. Readers load the current snapshot without locking;
//! [`ColumnDecoder::refresh`] installs a replacement atomically, so a decode
//! already in flight keeps using the snapshot it started with.

use super::column::{CqlStruct, TypedColumn};
use super::schema::{KeyspaceDef, RawColumn, ResultSchema, Row, TableSchema};
use super::types::{CqlType, TypeRegistry};
use crate::config::{COUNT_COLUMN_NAME, DEFAULT_KEY_ALIAS};
use crate::error::{ProtocolError, ProtocolResult};
use arc_swap::ArcSwap;
use bytes::Bytes;
use cqlbridge_util::ByteUtils;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// How a row is laid out into typed columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Exactly the wire columns, in arrival order
    Plain,
    /// Key, then every declared column, then a trailing `ROW` composite
    Struct,
}

/// Immutable view of the known tables
#[derive(Debug, Default)]
pub struct SchemaSnapshot {
    tables: HashMap<String, Arc<TableSchema>>,
    keyspaces: Vec<String>,
}

impl SchemaSnapshot {
    pub fn from_keyspaces(defs: &[KeyspaceDef]) -> Self {
        let mut tables = HashMap::new();
        for ks in defs {
            for table in &ks.tables {
                let mut table = table.clone();
                table.keyspace = ks.name.clone();
                tables.insert(format!("{}.{}", ks.name, table.name), Arc::new(table));
            }
        }
        Self {
            tables,
            keyspaces: defs.iter().map(|ks| ks.name.clone()).collect(),
        }
    }

    pub fn table(&self, keyspace: &str, table: &str) -> Option<&Arc<TableSchema>> {
        self.tables.get(&format!("{keyspace}.{table}"))
    }

    pub fn keyspaces(&self) -> &[String] {
        &self.keyspaces
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

/// Resolves marshal types for columns and lays rows out into typed columns
#[derive(Debug)]
pub struct ColumnDecoder {
    snapshot: ArcSwap<SchemaSnapshot>,
}

impl ColumnDecoder {
    /// Build from the keyspace catalog read at connect time.
    pub fn new(defs: &[KeyspaceDef]) -> Self {
        let snapshot = SchemaSnapshot::from_keyspaces(defs);
        debug!(
            keyspaces = snapshot.keyspaces.len(),
            tables = snapshot.table_count(),
            "Column decoder initialised"
        );
        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
        }
    }

    /// Replace the schema snapshot.
    pub fn refresh(&self, defs: &[KeyspaceDef]) {
        let snapshot = SchemaSnapshot::from_keyspaces(defs);
        debug!(tables = snapshot.table_count(), "Column decoder schema refreshed");
        self.snapshot.store(Arc::new(snapshot));
    }

    /// Current snapshot; stays valid across later refreshes.
    pub fn snapshot(&self) -> Arc<SchemaSnapshot> {
        self.snapshot.load_full()
    }

    pub fn table(&self, keyspace: &str, table: &str) -> Option<Arc<TableSchema>> {
        self.snapshot.load().table(keyspace, table).cloned()
    }

    pub fn has_keyspace(&self, keyspace: &str) -> bool {
        self.snapshot.load().keyspaces.iter().any(|k| k == keyspace)
    }

    pub fn comparator(&self, keyspace: &str, table: &str) -> Option<CqlType> {
        self.table(keyspace, table)
            .and_then(|t| TypeRegistry::global().lookup(&t.comparator))
    }

    pub fn default_validator(&self, keyspace: &str, table: &str) -> Option<CqlType> {
        self.table(keyspace, table)
            .and_then(|t| TypeRegistry::global().lookup(&t.default_validator))
    }

    pub fn key_validator(&self, keyspace: &str, table: &str) -> Option<CqlType> {
        self.table(keyspace, table)
            .and_then(|t| TypeRegistry::global().lookup(&t.key_validator))
    }

    /// Type governing a column's name.
    pub fn resolve_name_type(schema: &TableSchema, name: &[u8]) -> CqlType {
        if is_key_alias(schema, name) {
            CqlType::Ascii
        } else {
            TypeRegistry::global().lookup_or_bytes(&schema.comparator)
        }
    }

    /// Type governing a column's value.
    pub fn resolve_value_type(schema: &TableSchema, name: &[u8]) -> CqlType {
        let registry = TypeRegistry::global();
        if is_key_alias(schema, name) {
            return registry.lookup_or_bytes(&schema.key_validator);
        }
        schema
            .column_validator(name)
            .and_then(|v| registry.lookup(v))
            .unwrap_or_else(|| registry.lookup_or_bytes(&schema.default_validator))
    }

    /// Column name rendered through its name type.
    pub fn col_name_as_string(
        &self,
        keyspace: &str,
        table: &str,
        name: &[u8],
    ) -> ProtocolResult<String> {
        let schema = self.require_table(keyspace, table)?;
        Self::resolve_name_type(&schema, name).display_string(name)
    }

    /// Typed column for a wire column of `keyspace.table`.
    ///
    /// Unknown tables fall back to UTF-8 names and raw byte values.
    pub fn make_column(&self, keyspace: &str, table: &str, raw: RawColumn) -> TypedColumn {
        let schema = self.table(keyspace, table);
        create_column(schema.as_deref(), None, raw)
    }

    /// Typed column carrying a row key under the table's key alias.
    pub fn make_key_column(
        &self,
        keyspace: &str,
        table: &str,
        key: &[u8],
    ) -> ProtocolResult<TypedColumn> {
        let schema = self.require_table(keyspace, table)?;
        let alias = schema.key_alias_bytes();
        let raw = RawColumn::new(alias.clone(), key.to_vec()).with_timestamp(-1);
        Ok(TypedColumn::new(
            raw,
            Self::resolve_name_type(&schema, &alias),
            Self::resolve_value_type(&schema, &alias),
        ))
    }

    fn require_table(&self, keyspace: &str, table: &str) -> ProtocolResult<Arc<TableSchema>> {
        self.table(keyspace, table)
            .ok_or_else(|| ProtocolError::MissingMetadata {
                keyspace: keyspace.to_string(),
                table: table.to_string(),
            })
    }

    /// Lay a wire row out into typed columns.
    ///
    /// `Struct` mode only takes effect when `table` is known. A row that
    /// would otherwise produce no columns but has a key yields the key alone.
    pub fn decode_row(
        table: Option<&TableSchema>,
        result_schema: Option<&ResultSchema>,
        row: &Row,
        mode: DecodeMode,
    ) -> Vec<TypedColumn> {
        let mut out = match (mode, table) {
            (DecodeMode::Struct, Some(schema)) => decode_struct(schema, result_schema, row),
            _ => row
                .columns
                .iter()
                .map(|raw| create_column(table, result_schema, raw.clone()))
                .collect(),
        };

        if out.is_empty() && !row.key.is_empty() {
            let alias = table
                .map(TableSchema::key_alias_bytes)
                .unwrap_or_else(|| Bytes::from_static(DEFAULT_KEY_ALIAS.as_bytes()));
            let value_type = if ByteUtils::decode_utf8(&row.key).is_ok() {
                CqlType::Utf8
            } else {
                CqlType::Bytes
            };
            trace!("Row has no columns, emitting key column only");
            out.push(TypedColumn::synthetic(&alias, &row.key, CqlType::Ascii, value_type));
        }

        for column in &out {
            if let Some(failure) = column.failure() {
                warn!(column = column.name(), ?failure, "Column could not be decoded");
            }
        }
        out
    }
}

fn decode_struct(
    schema: &TableSchema,
    result_schema: Option<&ResultSchema>,
    row: &Row,
) -> Vec<TypedColumn> {
    let cols = &row.columns;
    let make = |raw: &RawColumn| create_column(Some(schema), result_schema, raw.clone());

    if cols.len() == 1 && cols[0].name.as_ref() == COUNT_COLUMN_NAME.as_bytes() {
        return vec![make(&cols[0])];
    }

    let mut out = Vec::with_capacity(schema.columns.len() + 2);
    let mut used = vec![false; cols.len()];

    let alias = schema.key_alias_bytes();
    if let Some(idx) = cols.iter().position(|c| c.name == alias) {
        out.push(make(&cols[idx]));
        used[idx] = true;
    }

    for def in &schema.columns {
        match cols.iter().position(|c| c.name == def.name) {
            Some(idx) => {
                out.push(make(&cols[idx]));
                used[idx] = true;
            }
            None => out.push(TypedColumn::placeholder(def)),
        }
    }

    let rest = cols
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(raw, _)| make(raw))
        .collect();
    out.push(TypedColumn::row(CqlStruct::new(rest)));
    out
}

/// Result hints win over table metadata; with neither, names are UTF-8 and values raw bytes.
fn create_column(
    table: Option<&TableSchema>,
    result_schema: Option<&ResultSchema>,
    raw: RawColumn,
) -> TypedColumn {
    let registry = TypeRegistry::global();
    let (name_type, value_type) = match (result_schema, table) {
        (Some(hints), _) => (
            registry.lookup_or_bytes(hints.name_type_for(&raw.name)),
            registry.lookup_or_bytes(hints.value_type_for(&raw.name)),
        ),
        (None, Some(schema)) => (
            ColumnDecoder::resolve_name_type(schema, &raw.name),
            ColumnDecoder::resolve_value_type(schema, &raw.name),
        ),
        (None, None) => (CqlType::Utf8, CqlType::Bytes),
    };
    TypedColumn::new(raw, name_type, value_type)
}

/// Case-insensitive comparison of UTF-8 renderings; undecodable means "not the key".
fn is_key_alias(schema: &TableSchema, name: &[u8]) -> bool {
    let alias = schema.key_alias_bytes();
    match (ByteUtils::decode_utf8(name), ByteUtils::decode_utf8(&alias)) {
        (Ok(name), Ok(alias)) => name
            .chars()
            .flat_map(char::to_lowercase)
            .eq(alias.chars().flat_map(char::to_lowercase)),
        _ => false,
    }
}
