//! Byte codecs for every [`CqlType`]
//!
//! Fixed-width numbers are big-endian. Varints are minimal two's complement,
//! big-endian. Decimals are a 4-byte scale followed by the unscaled varint.
//! A zero-length buffer composes to the type's zero value and displays as `""`.

use super::types::CqlType;
use super::value::CqlValue;
use crate::error::{ProtocolError, ProtocolResult};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use cqlbridge_util::{ByteUtils, TimeUtils};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use uuid::Uuid;

impl CqlType {
    /// Short label used in width errors.
    fn width_label(self) -> &'static str {
        match self {
            CqlType::Int32 => "int",
            CqlType::Long | CqlType::Counter => "long",
            CqlType::Float => "float",
            CqlType::Double => "double",
            CqlType::Date => "date",
            CqlType::Boolean => "boolean",
            _ => "UUID",
        }
    }

    fn check_width(self, bytes: &[u8]) -> ProtocolResult<()> {
        match self.fixed_width() {
            Some(width) if width != bytes.len() => Err(ProtocolError::marshal_width(
                self.width_label(),
                width,
                bytes.len(),
            )),
            _ => Ok(()),
        }
    }

    fn zero_value(self) -> ProtocolResult<CqlValue> {
        Ok(match self {
            CqlType::Ascii | CqlType::Utf8 => CqlValue::Text(String::new()),
            CqlType::Bytes => CqlValue::Bytes(Bytes::new()),
            CqlType::Boolean => CqlValue::Bool(false),
            CqlType::Int32 => CqlValue::Int32(0),
            CqlType::Long | CqlType::Counter => CqlValue::Int64(0),
            CqlType::Integer => CqlValue::BigInt(BigInt::default()),
            CqlType::Decimal => CqlValue::Decimal(BigDecimal::default()),
            CqlType::Float => CqlValue::Float(0.0),
            CqlType::Double => CqlValue::Double(0.0),
            CqlType::Date => CqlValue::Timestamp(DateTime::<Utc>::UNIX_EPOCH),
            CqlType::Uuid | CqlType::TimeUuid | CqlType::LexicalUuid => {
                CqlValue::Uuid(Uuid::nil())
            }
            CqlType::Row => return Err(row_unsupported("compose")),
        })
    }

    /// Decode wire bytes into a value.
    pub fn compose(self, bytes: &[u8]) -> ProtocolResult<CqlValue> {
        if bytes.is_empty() {
            return self.zero_value();
        }
        self.check_width(bytes)?;

        let mut buf = bytes;
        match self {
            CqlType::Ascii => Ok(CqlValue::Text(ByteUtils::decode_ascii(bytes)?.to_string())),
            CqlType::Utf8 => Ok(CqlValue::Text(ByteUtils::decode_utf8(bytes)?.to_string())),
            CqlType::Bytes => Ok(CqlValue::Bytes(Bytes::copy_from_slice(bytes))),
            CqlType::Boolean => Ok(CqlValue::Bool(buf.get_u8() != 0)),
            CqlType::Int32 => Ok(CqlValue::Int32(buf.get_i32())),
            CqlType::Long | CqlType::Counter => Ok(CqlValue::Int64(buf.get_i64())),
            CqlType::Float => Ok(CqlValue::Float(buf.get_f32())),
            CqlType::Double => Ok(CqlValue::Double(buf.get_f64())),
            CqlType::Date => {
                let millis = buf.get_i64();
                TimeUtils::from_millis(millis)
                    .map(CqlValue::Timestamp)
                    .ok_or_else(|| {
                        ProtocolError::Marshal(format!("date out of range: {millis}"))
                    })
            }
            CqlType::Uuid | CqlType::TimeUuid | CqlType::LexicalUuid => Uuid::from_slice(bytes)
                .map(CqlValue::Uuid)
                .map_err(|e| ProtocolError::Marshal(e.to_string())),
            CqlType::Integer => Ok(CqlValue::BigInt(BigInt::from_signed_bytes_be(bytes))),
            CqlType::Decimal => compose_decimal(bytes).map(CqlValue::Decimal),
            CqlType::Row => Err(row_unsupported("compose")),
        }
    }

    /// Encode a value into wire bytes.
    pub fn decompose(self, value: &CqlValue) -> ProtocolResult<Bytes> {
        let mut out = BytesMut::new();
        match (self, value) {
            (CqlType::Ascii, CqlValue::Text(s)) => {
                if !s.is_ascii() {
                    return Err(ProtocolError::Encoding(format!(
                        "cannot encode '{s}' as ASCII"
                    )));
                }
                out.put_slice(s.as_bytes());
            }
            (CqlType::Utf8, CqlValue::Text(s)) => out.put_slice(s.as_bytes()),
            (CqlType::Bytes, CqlValue::Bytes(b)) => return Ok(b.clone()),
            (CqlType::Boolean, CqlValue::Bool(b)) => out.put_u8(u8::from(*b)),
            (CqlType::Int32, CqlValue::Int32(v)) => out.put_i32(*v),
            (CqlType::Long | CqlType::Counter, CqlValue::Int64(v)) => out.put_i64(*v),
            (CqlType::Float, CqlValue::Float(v)) => out.put_f32(*v),
            (CqlType::Double, CqlValue::Double(v)) => out.put_f64(*v),
            (CqlType::Date, CqlValue::Timestamp(ts)) => out.put_i64(ts.timestamp_millis()),
            (CqlType::Uuid | CqlType::TimeUuid | CqlType::LexicalUuid, CqlValue::Uuid(u)) => {
                out.put_slice(u.as_bytes())
            }
            (CqlType::Integer, CqlValue::BigInt(v)) => out.put_slice(&v.to_signed_bytes_be()),
            (CqlType::Decimal, CqlValue::Decimal(d)) => {
                let (unscaled, scale) = d.as_bigint_and_exponent();
                let scale = i32::try_from(scale).map_err(|_| {
                    ProtocolError::Encoding(format!("decimal scale {scale} does not fit in 4 bytes"))
                })?;
                out.put_i32(scale);
                out.put_slice(&unscaled.to_signed_bytes_be());
            }
            (CqlType::Row, _) => return Err(row_unsupported("decompose")),
            (t, v) => {
                return Err(ProtocolError::TypeMismatch(format!(
                    "cannot decompose a {} value as {}",
                    v.kind_name(),
                    t.name()
                )))
            }
        }
        Ok(out.freeze())
    }

    /// Human-readable form of wire bytes.
    pub fn display_string(self, bytes: &[u8]) -> ProtocolResult<String> {
        if self == CqlType::Row {
            return Err(row_unsupported("display"));
        }
        if bytes.is_empty() {
            return Ok(String::new());
        }
        match self {
            CqlType::Bytes => Ok(ByteUtils::best_effort_utf8(bytes)),
            other => other.compose(bytes).map(|value| value.to_string()),
        }
    }
}

fn compose_decimal(bytes: &[u8]) -> ProtocolResult<BigDecimal> {
    if bytes.len() < 4 {
        return Err(ProtocolError::Marshal(format!(
            "A decimal is at least 4 bytes: {}",
            bytes.len()
        )));
    }
    let mut buf = bytes;
    let scale = buf.get_i32();
    Ok(BigDecimal::new(BigInt::from_signed_bytes_be(buf), i64::from(scale)))
}

fn row_unsupported(operation: &str) -> ProtocolError {
    ProtocolError::Unsupported(format!("the ROW pseudo-type does not support {operation}"))
}
