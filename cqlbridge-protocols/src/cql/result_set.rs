//! Forward-only result cursor over decoded rows
//!
//! Rows are pulled from the executor's stream one at a time and laid out by
//! [`ColumnDecoder::decode_row`]. Accessors take either a 1-based column
//! index or a column label, and record whether the value read was null.

use super::column::TypedColumn;
use super::decoder::{ColumnDecoder, DecodeMode};
use super::schema::{ResultSchema, Row, TableSchema};
use super::session::RowStream;
use super::types::CqlType;
use super::value::CqlValue;
use crate::error::{ProtocolError, ProtocolResult};
use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use cqlbridge_util::ByteUtils;
use num_bigint::BigInt;
use std::collections::HashMap;
use std::fmt;
use std::iter::Peekable;
use std::sync::Arc;
use tracing::{trace, warn};

/// Opaque row identifier built from a column's raw value bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowId(Bytes);

impl RowId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ByteUtils::to_hex(&self.0))
    }
}

/// A column reference: 1-based position or label.
pub trait ColumnIndex {
    fn resolve(&self, rs: &ResultSet) -> ProtocolResult<usize>;
}

impl ColumnIndex for usize {
    fn resolve(&self, rs: &ResultSet) -> ProtocolResult<usize> {
        rs.check_index(*self)?;
        Ok(*self)
    }
}

impl ColumnIndex for i32 {
    fn resolve(&self, rs: &ResultSet) -> ProtocolResult<usize> {
        match usize::try_from(*self) {
            Ok(index) => index.resolve(rs),
            Err(_) => Err(index_error(i64::from(*self), rs.values.len())),
        }
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, rs: &ResultSet) -> ProtocolResult<usize> {
        rs.find_column(self)
    }
}

fn index_error(index: i64, count: usize) -> ProtocolError {
    ProtocolError::InvalidColumn(format!(
        "Column index must be a positive number less or equal the count of returned columns: {index} {count}"
    ))
}

/// Rows of one executed statement.
pub struct ResultSet {
    rows: Peekable<RowStream>,
    result_schema: Option<ResultSchema>,
    keyspace: String,
    table: Option<String>,
    table_schema: Option<Arc<TableSchema>>,
    mode: DecodeMode,
    values: Vec<TypedColumn>,
    labels: HashMap<String, usize>,
    current_key: Option<Bytes>,
    row_number: usize,
    after_last: bool,
    was_null: bool,
    closed: bool,
}

impl fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("keyspace", &self.keyspace)
            .field("table", &self.table)
            .field("mode", &self.mode)
            .field("row_number", &self.row_number)
            .field("columns", &self.values.len())
            .finish_non_exhaustive()
    }
}

impl ResultSet {
    /// Cursor positioned before the first row.
    ///
    /// `table_schema` drives type resolution when the result carries no
    /// hints, and is required for `Struct` mode to take effect.
    pub fn new(
        rows: RowStream,
        result_schema: Option<ResultSchema>,
        keyspace: impl Into<String>,
        table: Option<String>,
        table_schema: Option<Arc<TableSchema>>,
        mode: DecodeMode,
    ) -> Self {
        Self {
            rows: rows.peekable(),
            result_schema,
            keyspace: keyspace.into(),
            table,
            table_schema,
            mode,
            values: Vec::new(),
            labels: HashMap::new(),
            current_key: None,
            row_number: 0,
            after_last: false,
            was_null: false,
            closed: false,
        }
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Advance to the next row. Returns `false` once the rows are exhausted.
    pub fn next(&mut self) -> ProtocolResult<bool> {
        self.check_open()?;
        match self.rows.next() {
            Some(Ok(row)) => {
                self.populate(&row);
                self.row_number += 1;
                trace!(row = self.row_number, columns = self.values.len(), "Advanced result set");
                Ok(true)
            }
            Some(Err(err)) => {
                self.clear_row();
                Err(err)
            }
            None => {
                self.after_last = true;
                self.clear_row();
                Ok(false)
            }
        }
    }

    fn clear_row(&mut self) {
        self.values.clear();
        self.labels.clear();
        self.current_key = None;
    }

    fn populate(&mut self, row: &Row) {
        let values = ColumnDecoder::decode_row(
            self.table_schema.as_deref(),
            self.result_schema.as_ref(),
            row,
            self.mode,
        );
        self.set_values(values);
        self.current_key = Some(row.key.clone());
    }

    fn set_values(&mut self, values: Vec<TypedColumn>) {
        self.labels.clear();
        for (idx, column) in values.iter().enumerate() {
            self.labels.insert(column.name().to_string(), idx + 1);
        }
        self.values = values;
    }

    /// 1-based number of the current row; 0 before the first.
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn is_before_first(&self) -> bool {
        self.row_number == 0 && !self.after_last
    }

    pub fn is_after_last(&self) -> bool {
        self.after_last
    }

    pub fn is_first(&self) -> bool {
        self.row_number == 1 && !self.after_last
    }

    pub fn is_last(&mut self) -> bool {
        !self.after_last && self.row_number > 0 && self.rows.peek().is_none()
    }

    /// Raw key of the current row.
    pub fn key(&self) -> Option<&Bytes> {
        self.current_key.as_ref()
    }

    /// Whether the last value read was null.
    pub fn was_null(&self) -> bool {
        self.was_null
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.values.clear();
        self.labels.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> ProtocolResult<()> {
        if self.closed {
            return Err(ProtocolError::Closed(
                "method was called on a closed ResultSet".to_string(),
            ));
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> ProtocolResult<()> {
        if index < 1 || index > self.values.len() {
            return Err(index_error(index as i64, self.values.len()));
        }
        Ok(())
    }

    /// 1-based position of a label; duplicate labels resolve to the last one.
    pub fn find_column(&self, label: &str) -> ProtocolResult<usize> {
        self.check_open()?;
        self.labels.get(label).copied().ok_or_else(|| {
            ProtocolError::InvalidColumn(format!(
                "name provided was not in the list of valid column labels: {label}"
            ))
        })
    }

    /// Number of columns in the current row.
    pub fn column_count(&self) -> usize {
        self.values.len()
    }

    pub fn columns(&self) -> &[TypedColumn] {
        &self.values
    }

    pub fn get_column<I: ColumnIndex>(&self, column: I) -> ProtocolResult<&TypedColumn> {
        self.check_open()?;
        let idx = column.resolve(self)?;
        Ok(&self.values[idx - 1])
    }

    /// Convert the value at `column`, substituting `default` for null.
    fn read<I, T, F>(&mut self, column: I, default: T, convert: F) -> ProtocolResult<T>
    where
        I: ColumnIndex,
        F: FnOnce(&CqlValue) -> ProtocolResult<T>,
    {
        self.check_open()?;
        let idx = column.resolve(self)?;
        let column = &self.values[idx - 1];
        column.check()?;
        let is_null = column.value().is_none();
        let converted = column.value().map(convert).transpose()?;
        self.was_null = is_null;
        Ok(converted.unwrap_or(default))
    }

    pub fn get_string<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<Option<String>> {
        self.check_open()?;
        let idx = column.resolve(self)?;
        let column = &self.values[idx - 1];
        column.check()?;
        let text = column
            .value()
            .map(|_| column.display_string().to_string());
        self.was_null = text.is_none();
        Ok(text)
    }

    pub fn get_int<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<i32> {
        self.read(column, 0, CqlValue::to_i32)
    }

    pub fn get_long<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<i64> {
        self.read(column, 0, CqlValue::to_i64)
    }

    pub fn get_short<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<i16> {
        self.read(column, 0, CqlValue::to_i16)
    }

    pub fn get_byte<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<i8> {
        self.read(column, 0, CqlValue::to_i8)
    }

    pub fn get_double<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<f64> {
        self.read(column, 0.0, CqlValue::to_f64)
    }

    pub fn get_float<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<f32> {
        self.read(column, 0.0, CqlValue::to_f32)
    }

    pub fn get_boolean<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<bool> {
        self.read(column, false, CqlValue::to_bool)
    }

    pub fn get_big_integer<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<BigInt> {
        self.read(column, BigInt::default(), CqlValue::to_big_integer)
    }

    pub fn get_decimal<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<BigDecimal> {
        self.read(column, BigDecimal::default(), CqlValue::to_decimal)
    }

    pub fn get_date<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<Option<NaiveDate>> {
        self.read(column, None, |v| v.to_date().map(Some))
    }

    pub fn get_time<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<Option<NaiveTime>> {
        self.read(column, None, |v| v.to_time().map(Some))
    }

    pub fn get_timestamp<I: ColumnIndex>(
        &mut self,
        column: I,
    ) -> ProtocolResult<Option<DateTime<Utc>>> {
        self.read(column, None, |v| v.to_timestamp().map(Some))
    }

    pub fn get_object<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<Option<CqlValue>> {
        self.read(column, None, |v| Ok(Some(v.clone())))
    }

    /// Raw value bytes; `None` for columns that did not arrive on the wire.
    pub fn get_bytes<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<Option<Bytes>> {
        self.raw_value(column, "bytes")
    }

    pub fn get_row_id<I: ColumnIndex>(&mut self, column: I) -> ProtocolResult<Option<RowId>> {
        Ok(self.raw_value(column, "ROWID")?.map(RowId))
    }

    fn raw_value<I: ColumnIndex>(&mut self, column: I, target: &str) -> ProtocolResult<Option<Bytes>> {
        self.check_open()?;
        let idx = column.resolve(self)?;
        let column = &self.values[idx - 1];
        let Some(raw) = column.raw_column() else {
            warn!(column = column.name(), "Can't convert column to {target}");
            return Ok(None);
        };
        let value = (!raw.value.is_empty()).then(|| raw.value.clone());
        self.was_null = value.is_none();
        Ok(value)
    }

    /// Column metadata for the current row.
    ///
    /// Before the first call to [`ResultSet::next`] this decodes the first
    /// row without consuming it.
    pub fn metadata(&mut self) -> ProtocolResult<ResultSetMetadata<'_>> {
        self.check_open()?;
        if self.values.is_empty() && self.row_number == 0 {
            let peeked = match self.rows.peek() {
                Some(Ok(row)) => Some(ColumnDecoder::decode_row(
                    self.table_schema.as_deref(),
                    self.result_schema.as_ref(),
                    row,
                    self.mode,
                )),
                _ => None,
            };
            if let Some(values) = peeked {
                self.set_values(values);
            }
        }
        Ok(ResultSetMetadata {
            columns: &self.values,
            keyspace: &self.keyspace,
            table: self.table.as_deref(),
        })
    }
}

/// Per-column description of a result row
#[derive(Debug, Clone, Copy)]
pub struct ResultSetMetadata<'a> {
    columns: &'a [TypedColumn],
    keyspace: &'a str,
    table: Option<&'a str>,
}

impl<'a> ResultSetMetadata<'a> {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column(&self, index: usize) -> ProtocolResult<&'a TypedColumn> {
        if index < 1 || index > self.columns.len() {
            return Err(index_error(index as i64, self.columns.len()));
        }
        Ok(&self.columns[index - 1])
    }

    fn value_type(&self, index: usize) -> ProtocolResult<CqlType> {
        Ok(self.column(index)?.value_type())
    }

    pub fn column_name(&self, index: usize) -> ProtocolResult<&'a str> {
        Ok(self.column(index)?.name())
    }

    pub fn column_label(&self, index: usize) -> ProtocolResult<&'a str> {
        self.column_name(index)
    }

    /// Numeric JDBC type code of the value type.
    pub fn column_type(&self, index: usize) -> ProtocolResult<i32> {
        Ok(self.value_type(index)?.jdbc_type().code())
    }

    pub fn column_type_name(&self, index: usize) -> ProtocolResult<&'static str> {
        Ok(self.value_type(index)?.name())
    }

    pub fn column_class_name(&self, index: usize) -> ProtocolResult<&'static str> {
        Ok(self.value_type(index)?.native_kind())
    }

    pub fn display_size(&self, index: usize) -> ProtocolResult<usize> {
        Ok(self.column(index)?.display_string().chars().count())
    }

    pub fn precision(&self, index: usize) -> ProtocolResult<i32> {
        let column = self.column(index)?;
        Ok(column.value_type().precision(column.value()))
    }

    pub fn scale(&self, index: usize) -> ProtocolResult<i32> {
        let column = self.column(index)?;
        Ok(column.value_type().scale(column.value()))
    }

    pub fn is_signed(&self, index: usize) -> ProtocolResult<bool> {
        Ok(self.value_type(index)?.is_signed())
    }

    pub fn is_case_sensitive(&self, index: usize) -> ProtocolResult<bool> {
        Ok(self.value_type(index)?.is_case_sensitive())
    }

    pub fn is_currency(&self, index: usize) -> ProtocolResult<bool> {
        Ok(self.value_type(index)?.is_currency())
    }

    pub fn is_auto_increment(&self, index: usize) -> ProtocolResult<bool> {
        Ok(self.value_type(index)? == CqlType::Counter)
    }

    pub fn is_nullable(&self, index: usize) -> ProtocolResult<bool> {
        self.column(index).map(|_| true)
    }

    pub fn schema_name(&self, index: usize) -> ProtocolResult<&'a str> {
        self.column(index).map(|_| self.keyspace)
    }

    pub fn table_name(&self) -> Option<&'a str> {
        self.table
    }

    pub fn ttl(&self, index: usize) -> ProtocolResult<Option<i32>> {
        Ok(self.column(index)?.ttl())
    }

    pub fn timestamp(&self, index: usize) -> ProtocolResult<Option<i64>> {
        Ok(self.column(index)?.timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cql::schema::RawColumn;

    fn stream(rows: Vec<Row>) -> RowStream {
        Box::new(rows.into_iter().map(Ok))
    }

    fn typed_rows() -> Vec<Row> {
        vec![
            Row::new(
                "k1",
                vec![
                    RawColumn::new("name", "alice").with_ttl(30).with_timestamp(99),
                    RawColumn::new("age", 31i32.to_be_bytes().to_vec()),
                    RawColumn::new("flag", "maybe"),
                ],
            ),
            Row::new("k2", vec![RawColumn::new("name", ""), RawColumn::new("age", Vec::new())]),
        ]
    }

    fn hinted() -> ResultSchema {
        ResultSchema::new("UTF8Type", "UTF8Type").with_value_type("age", "Int32Type")
    }

    fn result_set() -> ResultSet {
        ResultSet::new(stream(typed_rows()), Some(hinted()), "ks", Some("users".into()), None, DecodeMode::Plain)
    }

    #[test]
    fn test_cursor_positions() {
        let mut rs = result_set();
        assert!(rs.is_before_first());
        assert!(rs.next().unwrap());
        assert!(rs.is_first());
        assert_eq!(rs.row_number(), 1);
        assert_eq!(rs.key().map(|k| &k[..]), Some(&b"k1"[..]));
        assert!(rs.next().unwrap());
        assert!(rs.is_last());
        assert!(!rs.next().unwrap());
        assert!(rs.is_after_last());
        assert!(!rs.is_before_first());
    }

    #[test]
    fn test_accessors_by_index_and_label() {
        let mut rs = result_set();
        rs.next().unwrap();
        assert_eq!(rs.get_string(1).unwrap().as_deref(), Some("alice"));
        assert_eq!(rs.get_int("age").unwrap(), 31);
        assert_eq!(rs.get_long(2usize).unwrap(), 31);
        assert_eq!(rs.get_double("age").unwrap(), 31.0);
        assert!(!rs.was_null());
        assert_eq!(rs.find_column("flag").unwrap(), 3);

        let err = rs.get_boolean("flag").unwrap_err();
        assert_eq!(err.to_string(), "string value was neither 'true' nor 'false' :  maybe");
    }

    #[test]
    fn test_null_values_set_was_null() {
        let mut rs = result_set();
        rs.next().unwrap();
        rs.next().unwrap();
        assert_eq!(rs.get_int("age").unwrap(), 0);
        assert!(rs.was_null());
        assert_eq!(rs.get_string("name").unwrap(), None);
        assert!(rs.was_null());
        assert_eq!(rs.get_timestamp("age").unwrap(), None);
        assert_eq!(rs.get_decimal("age").unwrap(), BigDecimal::default());
    }

    #[test]
    fn test_bad_index_and_label() {
        let mut rs = result_set();
        rs.next().unwrap();
        assert_eq!(
            rs.get_int(0).unwrap_err().to_string(),
            "Column index must be a positive number less or equal the count of returned columns: 0 3"
        );
        assert_eq!(
            rs.get_int(-1).unwrap_err().to_string(),
            "Column index must be a positive number less or equal the count of returned columns: -1 3"
        );
        assert!(rs.get_int(4).is_err());
        assert_eq!(
            rs.get_string("nope").unwrap_err().to_string(),
            "name provided was not in the list of valid column labels: nope"
        );
    }

    #[test]
    fn test_raw_bytes_and_row_id() {
        let mut rs = result_set();
        rs.next().unwrap();
        assert_eq!(rs.get_bytes("name").unwrap().as_deref(), Some(&b"alice"[..]));
        let id = rs.get_row_id(2).unwrap().unwrap();
        assert_eq!(id.to_string(), "0000001f");
    }

    #[test]
    fn test_synthetic_columns_have_no_bytes() {
        let rows = vec![Row::new("only-key", vec![])];
        let mut rs = ResultSet::new(stream(rows), None, "ks", None, None, DecodeMode::Plain);
        rs.next().unwrap();
        assert_eq!(rs.column_count(), 1);
        assert_eq!(rs.get_string("KEY").unwrap().as_deref(), Some("only-key"));
        assert_eq!(rs.get_bytes("KEY").unwrap(), None);
        assert_eq!(rs.get_row_id(1).unwrap(), None);
    }

    #[test]
    fn test_metadata_peeks_first_row() {
        let mut rs = result_set();
        {
            let meta = rs.metadata().unwrap();
            assert_eq!(meta.column_count(), 3);
            assert_eq!(meta.column_name(1).unwrap(), "name");
            assert_eq!(meta.column_type(2).unwrap(), 4);
            assert_eq!(meta.column_type_name(2).unwrap(), "Int32Type");
            assert_eq!(meta.column_class_name(1).unwrap(), "String");
            assert!(meta.is_signed(2).unwrap());
            assert!(meta.is_case_sensitive(1).unwrap());
            assert_eq!(meta.precision(2).unwrap(), 2);
            assert_eq!(meta.scale(2).unwrap(), 0);
            assert_eq!(meta.ttl(1).unwrap(), Some(30));
            assert_eq!(meta.timestamp(1).unwrap(), Some(99));
            assert_eq!(meta.schema_name(1).unwrap(), "ks");
            assert_eq!(meta.table_name(), Some("users"));
            assert!(meta.column_name(9).is_err());
        }
        assert!(rs.is_before_first());
        assert!(rs.next().unwrap());
        assert_eq!(rs.get_string("name").unwrap().as_deref(), Some("alice"));
    }

    #[test]
    fn test_stream_errors_propagate() {
        let rows: RowStream = Box::new(
            vec![
                Ok(Row::new("k", vec![RawColumn::new("name", "alice")])),
                Err(ProtocolError::Timeout("read".into())),
            ]
            .into_iter(),
        );
        let mut rs = ResultSet::new(rows, Some(hinted()), "ks", None, None, DecodeMode::Plain);
        assert!(rs.next().unwrap());
        assert_eq!(rs.get_string("name").unwrap().as_deref(), Some("alice"));

        assert!(matches!(rs.next().unwrap_err(), ProtocolError::Timeout(_)));
        assert_eq!(rs.column_count(), 0);
        assert!(matches!(
            rs.get_string("name").unwrap_err(),
            ProtocolError::InvalidColumn(_)
        ));
        assert!(rs.get_int(1).is_err());
    }

    #[test]
    fn test_closed_result_set() {
        let mut rs = result_set();
        rs.close();
        assert!(rs.is_closed());
        assert!(matches!(rs.next().unwrap_err(), ProtocolError::Closed(_)));
    }
}
