//! Coercion of bound host values into wire bytes for a declared JDBC type
//!
//! Binding runs in two steps. First the value's kind is checked against the
//! kinds the target category accepts. Then the value is converted and
//! encoded with the codec for that category. Dates, times and timestamps
//! all encode as 8-byte epoch milliseconds.

use super::jdbc::JdbcType;
use super::types::CqlType;
use super::value::{bigint_low_bits, decimal_text, decimal_to_f64, decimal_trunc_i64, CqlValue};
use crate::error::{ProtocolError, ProtocolResult};
use bigdecimal::{BigDecimal, RoundingMode};
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use cqlbridge_util::{ByteUtils, TimeUtils};
use num_bigint::{BigInt, Sign};
use serde_json::json;
use tracing::debug;

const STR_BOOL_NUMERIC: &str = "String, Boolean, or a Numeric class";

/// A value supplied by the caller for parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Str(String),
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    BigInt(BigInt),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    /// Shared byte buffer
    Buffer(Bytes),
    ByteArray(Vec<u8>),
    /// Calendar date (`java.sql.Date`)
    Date(NaiveDate),
    /// Time of day on the epoch date (`java.sql.Time`)
    Time(NaiveTime),
    /// Precise instant (`java.sql.Timestamp`)
    Timestamp(DateTime<Utc>),
    /// Plain instant (`java.util.Date`)
    Instant(DateTime<Utc>),
    Url(String),
    RowId(Vec<u8>),
    /// Any other structured object
    Object(serde_json::Value),
}

impl HostValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Str(_) => "String",
            HostValue::Bool(_) => "Boolean",
            HostValue::Byte(_) => "Byte",
            HostValue::Short(_) => "Short",
            HostValue::Int(_) => "Integer",
            HostValue::Long(_) => "Long",
            HostValue::BigInt(_) => "BigInteger",
            HostValue::Float(_) => "Float",
            HostValue::Double(_) => "Double",
            HostValue::Decimal(_) => "BigDecimal",
            HostValue::Buffer(_) => "ByteBuffer",
            HostValue::ByteArray(_) => "byte[]",
            HostValue::Date(_) => "java.sql.Date",
            HostValue::Time(_) => "java.sql.Time",
            HostValue::Timestamp(_) => "java.sql.Timestamp",
            HostValue::Instant(_) => "java.util.Date",
            HostValue::Url(_) => "URL",
            HostValue::RowId(_) => "RowId",
            HostValue::Object(_) => "Object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            HostValue::Byte(_)
                | HostValue::Short(_)
                | HostValue::Int(_)
                | HostValue::Long(_)
                | HostValue::BigInt(_)
                | HostValue::Float(_)
                | HostValue::Double(_)
                | HostValue::Decimal(_)
        )
    }

    fn is_str_bool_or_numeric(&self) -> bool {
        matches!(self, HostValue::Str(_) | HostValue::Bool(_)) || self.is_numeric()
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            HostValue::Str(s) | HostValue::Url(s) => json!(s),
            HostValue::Bool(b) => json!(b),
            HostValue::Byte(v) => json!(v),
            HostValue::Short(v) => json!(v),
            HostValue::Int(v) => json!(v),
            HostValue::Long(v) => json!(v),
            HostValue::BigInt(v) => json!(v.to_string()),
            HostValue::Float(v) => json!(v),
            HostValue::Double(v) => json!(v),
            HostValue::Decimal(v) => json!(decimal_text(v)),
            HostValue::Buffer(b) => json!(b.to_vec()),
            HostValue::ByteArray(b) | HostValue::RowId(b) => json!(b),
            HostValue::Date(d) => json!(d.to_string()),
            HostValue::Time(t) => json!(t.to_string()),
            HostValue::Timestamp(ts) | HostValue::Instant(ts) => json!(ts.to_rfc3339()),
            HostValue::Object(v) => v.clone(),
        }
    }
}

/// Encode `value` for a target given by its numeric JDBC code.
pub fn to_bytes_for_code(value: &HostValue, target_code: i32, scale_hint: i32) -> ProtocolResult<Bytes> {
    let target = JdbcType::from_code(target_code)
        .ok_or_else(|| ProtocolError::unsupported_jdbc_type(target_code))?;
    to_bytes(value, target, scale_hint)
}

/// Encode `value` as the wire form of the `target` category.
///
/// `scale_hint` rescales values bound to DECIMAL when positive and is
/// otherwise ignored.
pub fn to_bytes(value: &HostValue, target: JdbcType, scale_hint: i32) -> ProtocolResult<Bytes> {
    check_mapping(value, target)?;
    let bytes = encode(value, target, scale_hint)?;
    debug!(
        kind = value.kind_name(),
        %target,
        encoded = %describe_encoding(&bytes),
        "Coerced bound value"
    );
    Ok(bytes)
}

fn encode(value: &HostValue, target: JdbcType, scale_hint: i32) -> ProtocolResult<Bytes> {
    match target {
        JdbcType::Bit => {
            let bit = if to_varint(value)?.sign() == Sign::NoSign { 0 } else { 1 };
            CqlType::Integer.decompose(&CqlValue::BigInt(BigInt::from(bit)))
        }
        JdbcType::TinyInt | JdbcType::SmallInt | JdbcType::Numeric => {
            CqlType::Integer.decompose(&CqlValue::BigInt(to_varint(value)?))
        }
        JdbcType::Integer => CqlType::Int32.decompose(&CqlValue::Int32(to_int32(value)?)),
        JdbcType::BigInt => CqlType::Long.decompose(&CqlValue::Int64(to_int64(value)?)),
        JdbcType::Real | JdbcType::Float => {
            CqlType::Float.decompose(&CqlValue::Float(to_double(value)? as f32))
        }
        JdbcType::Double => CqlType::Double.decompose(&CqlValue::Double(to_double(value)?)),
        JdbcType::Decimal => {
            let mut decimal = to_decimal(value)?;
            if scale_hint > 0 {
                decimal = decimal.with_scale_round(i64::from(scale_hint), RoundingMode::HalfEven);
            }
            CqlType::Decimal.decompose(&CqlValue::Decimal(decimal))
        }
        JdbcType::Boolean => CqlType::Boolean.decompose(&CqlValue::Bool(to_boolean(value)?)),
        JdbcType::Char
        | JdbcType::VarChar
        | JdbcType::LongVarChar
        | JdbcType::NVarChar
        | JdbcType::LongNVarChar => match value {
            HostValue::Str(s) => Ok(Bytes::copy_from_slice(s.as_bytes())),
            other => Err(bad_mapping(other, "String", "the various VARCHAR types")),
        },
        JdbcType::Binary | JdbcType::VarBinary | JdbcType::LongVarBinary => match value {
            HostValue::Buffer(b) => Ok(b.clone()),
            HostValue::ByteArray(b) => Ok(Bytes::copy_from_slice(b)),
            other => Err(bad_mapping(other, "ByteBuffer or byte[]", "the BINARY Types")),
        },
        JdbcType::Date | JdbcType::Time | JdbcType::Timestamp => {
            CqlType::Long.decompose(&CqlValue::Int64(to_epoch_millis(value)?))
        }
        JdbcType::DataLink => match value {
            HostValue::Url(url) => CqlType::Utf8.decompose(&CqlValue::Text(url.clone())),
            other => Err(bad_mapping(other, "a URL type", "DATALINK")),
        },
        JdbcType::JavaObject => Ok(Bytes::from(serde_json::to_vec(&value.to_json())?)),
        JdbcType::RowId => match value {
            HostValue::RowId(id) => Ok(Bytes::copy_from_slice(id)),
            other => Err(bad_mapping(other, "a RowId type", "ROWID")),
        },
        other => Err(ProtocolError::unsupported_jdbc_type(other.code())),
    }
}

fn bad_mapping(value: &HostValue, accepted: &str, target: &str) -> ProtocolError {
    ProtocolError::bad_mapping(value.kind_name(), accepted, target)
}

/// Reject value kinds the target category does not accept.
fn check_mapping(value: &HostValue, target: JdbcType) -> ProtocolResult<()> {
    use HostValue as H;

    let accepted = match target {
        JdbcType::TinyInt
        | JdbcType::SmallInt
        | JdbcType::Integer
        | JdbcType::BigInt
        | JdbcType::Real
        | JdbcType::Float
        | JdbcType::Double
        | JdbcType::Decimal
        | JdbcType::Numeric
        | JdbcType::Bit
        | JdbcType::Boolean => {
            if value.is_str_bool_or_numeric() {
                return Ok(());
            }
            STR_BOOL_NUMERIC
        }
        JdbcType::Char
        | JdbcType::VarChar
        | JdbcType::LongVarChar
        | JdbcType::NVarChar
        | JdbcType::LongNVarChar => {
            if matches!(value, H::Str(_)) {
                return Ok(());
            }
            return Err(bad_mapping(value, "String", "the various VARCHAR types"));
        }
        JdbcType::Binary | JdbcType::VarBinary | JdbcType::LongVarBinary => {
            if matches!(value, H::Buffer(_) | H::ByteArray(_)) {
                return Ok(());
            }
            return Err(bad_mapping(value, "ByteBuffer or byte[]", "the BINARY Types"));
        }
        JdbcType::Date | JdbcType::Timestamp => {
            if matches!(value, H::Str(_) | H::Instant(_) | H::Date(_) | H::Timestamp(_)) {
                return Ok(());
            }
            "String, Date(java and sql) or Timestamp types"
        }
        JdbcType::Time => {
            if matches!(value, H::Str(_) | H::Instant(_) | H::Time(_) | H::Timestamp(_)) {
                return Ok(());
            }
            "String, Date (java), Time or Timestamp types"
        }
        JdbcType::DataLink => {
            if matches!(value, H::Url(_)) {
                return Ok(());
            }
            "a URL type"
        }
        JdbcType::JavaObject => return Ok(()),
        JdbcType::RowId => {
            if matches!(value, H::RowId(_)) {
                return Ok(());
            }
            "a RowId type"
        }
        other => return Err(ProtocolError::unsupported_jdbc_type(other.code())),
    };
    Err(bad_mapping(value, accepted, target.name()))
}

fn parse_failure(text: &str, target: &str) -> ProtocolError {
    ProtocolError::Syntax(format!("unable to convert '{text}' to {target}"))
}

fn to_int32(value: &HostValue) -> ProtocolResult<i32> {
    Ok(match value {
        HostValue::Str(s) => s.parse().map_err(|_| parse_failure(s, "INTEGER"))?,
        HostValue::Bool(b) => i32::from(*b),
        HostValue::Byte(v) => i32::from(*v),
        HostValue::Short(v) => i32::from(*v),
        HostValue::Int(v) => *v,
        HostValue::Long(v) => *v as i32,
        HostValue::BigInt(v) => bigint_low_bits(v) as i32,
        HostValue::Float(v) => *v as i32,
        HostValue::Double(v) => *v as i32,
        HostValue::Decimal(v) => decimal_trunc_i64(v) as i32,
        other => return Err(bad_mapping(other, STR_BOOL_NUMERIC, "INTEGER")),
    })
}

fn to_int64(value: &HostValue) -> ProtocolResult<i64> {
    Ok(match value {
        HostValue::Str(s) => s.parse().map_err(|_| parse_failure(s, "BIGINT"))?,
        HostValue::Bool(b) => i64::from(*b),
        HostValue::Byte(v) => i64::from(*v),
        HostValue::Short(v) => i64::from(*v),
        HostValue::Int(v) => i64::from(*v),
        HostValue::Long(v) => *v,
        HostValue::BigInt(v) => bigint_low_bits(v),
        HostValue::Float(v) => *v as i64,
        HostValue::Double(v) => *v as i64,
        HostValue::Decimal(v) => decimal_trunc_i64(v),
        other => return Err(bad_mapping(other, STR_BOOL_NUMERIC, "BIGINT")),
    })
}

fn to_varint(value: &HostValue) -> ProtocolResult<BigInt> {
    Ok(match value {
        HostValue::Str(s) => s.parse().map_err(|_| parse_failure(s, "NUMERIC"))?,
        HostValue::BigInt(v) => v.clone(),
        other => BigInt::from(to_int64(other)?),
    })
}

fn to_double(value: &HostValue) -> ProtocolResult<f64> {
    Ok(match value {
        HostValue::Str(s) => s.parse().map_err(|_| parse_failure(s, "DOUBLE"))?,
        HostValue::Bool(b) => f64::from(u8::from(*b)),
        HostValue::Float(v) => f64::from(*v),
        HostValue::Double(v) => *v,
        HostValue::Decimal(v) => decimal_to_f64(v),
        HostValue::BigInt(v) => v.to_string().parse().unwrap_or(f64::NAN),
        other => to_int64(other)? as f64,
    })
}

fn decimal_from_float(text: &str) -> ProtocolResult<BigDecimal> {
    text.parse().map_err(|_| parse_failure(text, "DECIMAL"))
}

fn to_decimal(value: &HostValue) -> ProtocolResult<BigDecimal> {
    Ok(match value {
        HostValue::Str(s) => s.parse().map_err(|_| parse_failure(s, "DECIMAL"))?,
        HostValue::Decimal(v) => v.clone(),
        HostValue::Float(v) => decimal_from_float(&v.to_string())?,
        HostValue::Double(v) => decimal_from_float(&v.to_string())?,
        HostValue::BigInt(v) => BigDecimal::new(v.clone(), 0),
        other => BigDecimal::new(BigInt::from(to_int64(other)?), 0),
    })
}

/// Strings follow the lenient parse: only `true` (any case) is true.
fn to_boolean(value: &HostValue) -> ProtocolResult<bool> {
    Ok(match value {
        HostValue::Str(s) => s.eq_ignore_ascii_case("true"),
        HostValue::Bool(b) => *b,
        HostValue::BigInt(v) => v.sign() != Sign::NoSign,
        HostValue::Float(v) => (*v as i64) != 0,
        HostValue::Double(v) => (*v as i64) != 0,
        HostValue::Decimal(v) => decimal_trunc_i64(v) != 0,
        other => to_int64(other)? != 0,
    })
}

fn to_epoch_millis(value: &HostValue) -> ProtocolResult<i64> {
    match value {
        HostValue::Str(s) => millis_from_string(s),
        HostValue::Instant(ts) | HostValue::Timestamp(ts) => Ok(ts.timestamp_millis()),
        HostValue::Date(d) => Ok(d
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc().timestamp_millis())
            .unwrap_or_default()),
        HostValue::Time(t) => Ok(NaiveDate::default()
            .and_time(*t)
            .and_utc()
            .timestamp_millis()),
        other => Err(bad_mapping(other, "String, Date, Time or Timestamp types", "DATE/TIME/TIMESTAMP")),
    }
}

/// Empty or `now` is the current time; all digits is epoch millis; else ISO-8601.
fn millis_from_string(text: &str) -> ProtocolResult<i64> {
    if text.is_empty() || text.eq_ignore_ascii_case("now") {
        return Ok(TimeUtils::timestamp_millis());
    }
    if text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse::<i64>().map_err(|_| {
            ProtocolError::Syntax(format!("unable to make long (for date) from:  '{text}'"))
        });
    }
    TimeUtils::parse_iso8601_millis(text).ok_or_else(|| {
        ProtocolError::Syntax(format!(
            "unable to coerce '{text}' to a  formatted date (long)"
        ))
    })
}

fn describe_encoding(bytes: &[u8]) -> String {
    format!("0x{}", ByteUtils::to_hex(bytes))
}
