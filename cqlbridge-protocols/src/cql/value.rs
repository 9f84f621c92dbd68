//! Decoded column values and the accessor conversion cascade
//!
//! Each accessor tries, in order: the exact kind, numeric widening or
//! narrowing from the other integer kinds, and finally parsing a string.
//! Anything else is reported as not translatable.

use super::column::CqlStruct;
use crate::error::{ProtocolError, ProtocolResult};
use bytes::Bytes;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use cqlbridge_util::{ByteUtils, TimeUtils};
use num_bigint::{BigInt, Sign};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A column value after composition by its marshal type
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Bytes(Bytes),
    Text(String),
    Bool(bool),
    BigInt(BigInt),
    Decimal(BigDecimal),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Struct(CqlStruct),
}

impl CqlValue {
    /// Host kind name used in conversion error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CqlValue::Int32(_) => "Integer",
            CqlValue::Int64(_) => "Long",
            CqlValue::Float(_) => "Float",
            CqlValue::Double(_) => "Double",
            CqlValue::Bytes(_) => "ByteBuffer",
            CqlValue::Text(_) => "String",
            CqlValue::Bool(_) => "Boolean",
            CqlValue::BigInt(_) => "BigInteger",
            CqlValue::Decimal(_) => "BigDecimal",
            CqlValue::Timestamp(_) => "Date",
            CqlValue::Uuid(_) => "UUID",
            CqlValue::Struct(_) => "CassandraStruct",
        }
    }

    fn not_translatable(&self, requested: &str) -> ProtocolError {
        ProtocolError::not_translatable(self.kind_name(), requested)
    }

    pub fn to_i32(&self) -> ProtocolResult<i32> {
        match self {
            CqlValue::Int32(v) => Ok(*v),
            CqlValue::Int64(v) => Ok(*v as i32),
            CqlValue::BigInt(v) => Ok(bigint_low_bits(v) as i32),
            CqlValue::Text(s) => parse_number(s),
            other => Err(other.not_translatable("int")),
        }
    }

    pub fn to_i64(&self) -> ProtocolResult<i64> {
        match self {
            CqlValue::Int64(v) => Ok(*v),
            CqlValue::Int32(v) => Ok(i64::from(*v)),
            CqlValue::BigInt(v) => Ok(bigint_low_bits(v)),
            CqlValue::Text(s) => parse_number(s),
            other => Err(other.not_translatable("Long")),
        }
    }

    pub fn to_i16(&self) -> ProtocolResult<i16> {
        match self {
            CqlValue::Int32(v) => Ok(*v as i16),
            CqlValue::Int64(v) => Ok(*v as i16),
            CqlValue::BigInt(v) => Ok(bigint_low_bits(v) as i16),
            CqlValue::Text(s) => parse_number(s),
            other => Err(other.not_translatable("Short")),
        }
    }

    pub fn to_i8(&self) -> ProtocolResult<i8> {
        match self {
            CqlValue::Int32(v) => Ok(*v as i8),
            CqlValue::Int64(v) => Ok(*v as i8),
            CqlValue::BigInt(v) => Ok(bigint_low_bits(v) as i8),
            CqlValue::Text(s) => parse_number(s),
            other => Err(other.not_translatable("Byte")),
        }
    }

    pub fn to_f64(&self) -> ProtocolResult<f64> {
        match self {
            CqlValue::Double(v) => Ok(*v),
            CqlValue::Float(v) => Ok(f64::from(*v)),
            CqlValue::Int32(v) => Ok(f64::from(*v)),
            CqlValue::Int64(v) => Ok(*v as f64),
            CqlValue::BigInt(v) => Ok(bigint_to_f64(v)),
            CqlValue::Text(s) => parse_number(s),
            other => Err(other.not_translatable("Double")),
        }
    }

    pub fn to_f32(&self) -> ProtocolResult<f32> {
        match self {
            CqlValue::Float(v) => Ok(*v),
            CqlValue::Double(v) => Ok(*v as f32),
            CqlValue::Int32(v) => Ok(*v as f32),
            CqlValue::Int64(v) => Ok(*v as f32),
            CqlValue::BigInt(v) => Ok(bigint_to_f64(v) as f32),
            CqlValue::Text(s) => parse_number(s),
            other => Err(other.not_translatable("Float")),
        }
    }

    /// Integers are true when nonzero; strings must be `true` or `false`.
    pub fn to_bool(&self) -> ProtocolResult<bool> {
        match self {
            CqlValue::Bool(v) => Ok(*v),
            CqlValue::Int32(v) => Ok(*v != 0),
            CqlValue::Int64(v) => Ok(*v != 0),
            CqlValue::BigInt(v) => Ok(v.sign() != Sign::NoSign),
            CqlValue::Text(s) => {
                if s.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(ProtocolError::Syntax(format!(
                        "string value was neither 'true' nor 'false' :  {s}"
                    )))
                }
            }
            other => Err(other.not_translatable("Boolean")),
        }
    }

    pub fn to_big_integer(&self) -> ProtocolResult<BigInt> {
        match self {
            CqlValue::BigInt(v) => Ok(v.clone()),
            CqlValue::Int32(v) => Ok(BigInt::from(*v)),
            CqlValue::Int64(v) => Ok(BigInt::from(*v)),
            CqlValue::Text(s) => parse_number(s),
            other => Err(other.not_translatable("BigInteger")),
        }
    }

    pub fn to_decimal(&self) -> ProtocolResult<BigDecimal> {
        match self {
            CqlValue::Decimal(v) => Ok(v.clone()),
            CqlValue::Int32(v) => Ok(BigDecimal::new(BigInt::from(*v), 0)),
            CqlValue::Int64(v) => Ok(BigDecimal::new(BigInt::from(*v), 0)),
            CqlValue::BigInt(v) => Ok(BigDecimal::new(v.clone(), 0)),
            CqlValue::Double(v) => parse_number(&v.to_string()),
            CqlValue::Text(s) => parse_number(s),
            other => Err(other.not_translatable("BigDecimal")),
        }
    }

    /// Instant for longs (epoch millis) and dates; strings use `yyyy-mm-dd hh:mm:ss[.f]`.
    pub fn to_timestamp(&self) -> ProtocolResult<DateTime<Utc>> {
        match self {
            CqlValue::Timestamp(v) => Ok(*v),
            CqlValue::Int64(millis) => millis_to_instant(*millis),
            CqlValue::Text(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|e| ProtocolError::Syntax(format!("{e}: {s}"))),
            other => Err(other.not_translatable("SQL Timestamp")),
        }
    }

    /// Calendar date; strings use `yyyy-mm-dd`.
    pub fn to_date(&self) -> ProtocolResult<NaiveDate> {
        match self {
            CqlValue::Timestamp(v) => Ok(v.date_naive()),
            CqlValue::Int64(millis) => Ok(millis_to_instant(*millis)?.date_naive()),
            CqlValue::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| ProtocolError::Syntax(format!("{e}: {s}"))),
            other => Err(other.not_translatable("SQL Date")),
        }
    }

    /// Time of day; strings use `hh:mm:ss`.
    pub fn to_time(&self) -> ProtocolResult<NaiveTime> {
        match self {
            CqlValue::Timestamp(v) => Ok(v.time()),
            CqlValue::Int64(millis) => Ok(millis_to_instant(*millis)?.time()),
            CqlValue::Text(s) => NaiveTime::parse_from_str(s, "%H:%M:%S")
                .map_err(|e| ProtocolError::Syntax(format!("{e}: {s}"))),
            other => Err(other.not_translatable("SQL Time")),
        }
    }
}

impl fmt::Display for CqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlValue::Int32(v) => write!(f, "{v}"),
            CqlValue::Int64(v) => write!(f, "{v}"),
            CqlValue::Float(v) => write!(f, "{v:?}"),
            CqlValue::Double(v) => write!(f, "{v:?}"),
            CqlValue::Bytes(v) => f.write_str(&ByteUtils::to_hex(v)),
            CqlValue::Text(v) => f.write_str(v),
            CqlValue::Bool(v) => write!(f, "{v}"),
            CqlValue::BigInt(v) => write!(f, "{v}"),
            CqlValue::Decimal(v) => f.write_str(&decimal_text(v)),
            CqlValue::Timestamp(v) => {
                f.write_str(&TimeUtils::format_millis(v.timestamp_millis()))
            }
            CqlValue::Uuid(v) => write!(f, "{}", v.hyphenated()),
            CqlValue::Struct(v) => write!(f, "{v}"),
        }
    }
}

fn parse_number<T>(text: &str) -> ProtocolResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.parse::<T>()
        .map_err(|e| ProtocolError::Syntax(format!("For input string: \"{text}\": {e}")))
}

fn millis_to_instant(millis: i64) -> ProtocolResult<DateTime<Utc>> {
    TimeUtils::from_millis(millis)
        .ok_or_else(|| ProtocolError::Syntax(format!("{millis} is out of the supported date range")))
}

/// Low 64 bits in two's complement, as a narrowing cast would keep them.
pub(crate) fn bigint_low_bits(value: &BigInt) -> i64 {
    let (sign, digits) = value.to_u64_digits();
    let low = digits.first().copied().unwrap_or(0);
    match sign {
        Sign::Minus => low.wrapping_neg() as i64,
        _ => low as i64,
    }
}

fn bigint_to_f64(value: &BigInt) -> f64 {
    value
        .to_string()
        .parse::<f64>()
        .unwrap_or(f64::NAN)
}

/// Integral part of a decimal, saturating at the i64 bounds.
pub(crate) fn decimal_trunc_i64(value: &BigDecimal) -> i64 {
    let (unscaled, scale) = value.as_bigint_and_exponent();
    let saturated = if unscaled.sign() == Sign::Minus { i64::MIN } else { i64::MAX };
    let digits = unscaled.magnitude().to_string().len() as i64;
    let integral = if scale >= digits {
        BigInt::default()
    } else if scale > 0 {
        unscaled / BigInt::from(10u8).pow(scale as u32)
    } else if scale < -19 && unscaled.sign() != Sign::NoSign {
        return saturated;
    } else {
        unscaled * BigInt::from(10u8).pow(scale.unsigned_abs() as u32)
    };
    i64::try_from(&integral).unwrap_or(saturated)
}

pub(crate) fn decimal_to_f64(value: &BigDecimal) -> f64 {
    decimal_text(value).parse().unwrap_or(f64::NAN)
}

/// Plain notation when the scale is non-negative and the adjusted exponent is
/// at least -6, scientific notation (`1E-30`, `7E+2`) otherwise.
pub(crate) fn decimal_text(value: &BigDecimal) -> String {
    let (unscaled, scale) = value.as_bigint_and_exponent();
    let sign = if unscaled.sign() == Sign::Minus { "-" } else { "" };
    let digits = unscaled.magnitude().to_string();
    let adjusted = digits.len() as i64 - 1 - scale;

    if scale >= 0 && adjusted >= -6 {
        let scale = scale as usize;
        return if scale == 0 {
            format!("{sign}{digits}")
        } else if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            format!("{sign}{int_part}.{frac_part}")
        } else {
            format!("{sign}0.{}{digits}", "0".repeat(scale - digits.len()))
        };
    }

    let (lead, rest) = digits.split_at(1);
    let exp_sign = if adjusted >= 0 { "+" } else { "" };
    if rest.is_empty() {
        format!("{sign}{lead}E{exp_sign}{adjusted}")
    } else {
        format!("{sign}{lead}.{rest}E{exp_sign}{adjusted}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_cascade() {
        assert_eq!(CqlValue::Int32(7).to_i32().unwrap(), 7);
        assert_eq!(CqlValue::Int64(1 << 33 | 5).to_i32().unwrap(), 5);
        assert_eq!(CqlValue::BigInt(BigInt::from(-2)).to_i32().unwrap(), -2);
        assert_eq!(CqlValue::Text("42".into()).to_i32().unwrap(), 42);

        let err = CqlValue::Text("4x2".into()).to_i32().unwrap_err();
        assert!(matches!(err, ProtocolError::Syntax(_)));

        let err = CqlValue::Double(1.5).to_i32().unwrap_err();
        assert_eq!(
            err.to_string(),
            "column was stored in Double format which is not translatable to int"
        );
    }

    #[test]
    fn test_bigint_narrowing_keeps_low_bits() {
        let big = BigInt::from(u64::MAX) + BigInt::from(3u8); // 2^64 + 2
        assert_eq!(bigint_low_bits(&big), 2);
        assert_eq!(bigint_low_bits(&BigInt::from(-1)), -1);
        assert_eq!(bigint_low_bits(&BigInt::from(i64::MIN)), i64::MIN);
    }

    #[test]
    fn test_long_and_small_cascades() {
        assert_eq!(CqlValue::Int32(-9).to_i64().unwrap(), -9);
        assert_eq!(CqlValue::Int32(300).to_i8().unwrap(), 44);
        assert_eq!(CqlValue::Int64(70_000).to_i16().unwrap(), 4464);
        assert_eq!(CqlValue::Text("-12".into()).to_i16().unwrap(), -12);
        assert!(CqlValue::Bool(true).to_i64().is_err());
    }

    #[test]
    fn test_floating_cascades() {
        assert_eq!(CqlValue::Float(1.5).to_f64().unwrap(), 1.5);
        assert_eq!(CqlValue::Int64(3).to_f64().unwrap(), 3.0);
        assert_eq!(CqlValue::BigInt(BigInt::from(10)).to_f32().unwrap(), 10.0);
        assert_eq!(CqlValue::Text("2.25".into()).to_f64().unwrap(), 2.25);
        assert!(CqlValue::Text("abc".into()).to_f32().is_err());
    }

    #[test]
    fn test_bool_cascade() {
        assert!(CqlValue::Bool(true).to_bool().unwrap());
        assert!(CqlValue::Int32(5).to_bool().unwrap());
        assert!(!CqlValue::Int64(0).to_bool().unwrap());
        assert!(!CqlValue::BigInt(BigInt::from(0)).to_bool().unwrap());
        assert!(CqlValue::Text("TRUE".into()).to_bool().unwrap());
        assert!(!CqlValue::Text("False".into()).to_bool().unwrap());

        let err = CqlValue::Text("0".into()).to_bool().unwrap_err();
        assert_eq!(err.to_string(), "string value was neither 'true' nor 'false' :  0");
    }

    fn decimal(unscaled: i64, scale: i64) -> BigDecimal {
        BigDecimal::new(BigInt::from(unscaled), scale)
    }

    #[test]
    fn test_decimal_and_big_integer_cascades() {
        assert_eq!(
            CqlValue::Text("12.50".into()).to_decimal().unwrap(),
            decimal(1250, 2)
        );
        assert_eq!(CqlValue::Int64(4).to_decimal().unwrap(), decimal(4, 0));
        assert_eq!(
            CqlValue::BigInt(BigInt::from(99)).to_decimal().unwrap(),
            decimal(99, 0)
        );
        assert_eq!(CqlValue::Double(0.25).to_decimal().unwrap(), decimal(25, 2));
        assert_eq!(
            CqlValue::Text("1E-30".into()).to_decimal().unwrap(),
            decimal(1, 30)
        );
        assert!(CqlValue::Text("1.2.3".into()).to_decimal().is_err());
        assert_eq!(
            CqlValue::Text("123456789012345678901234567890".into())
                .to_big_integer()
                .unwrap()
                .to_string(),
            "123456789012345678901234567890"
        );
        assert!(CqlValue::Float(1.0).to_big_integer().is_err());
    }

    #[test]
    fn test_temporal_cascades() {
        let instant = CqlValue::Int64(1_296_705_906_000).to_timestamp().unwrap();
        assert_eq!(instant.timestamp_millis(), 1_296_705_906_000);

        let date = CqlValue::Timestamp(instant).to_date().unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2011, 2, 3).unwrap());

        let time = CqlValue::Int64(1_296_705_906_000).to_time().unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(4, 5, 6).unwrap());

        assert_eq!(
            CqlValue::Text("2011-02-03".into()).to_date().unwrap(),
            NaiveDate::from_ymd_opt(2011, 2, 3).unwrap()
        );
        assert_eq!(
            CqlValue::Text("2011-02-03 04:05:06.5".into())
                .to_timestamp()
                .unwrap()
                .timestamp_millis(),
            1_296_705_906_500
        );
        assert!(CqlValue::Text("not a date".into()).to_date().is_err());
        assert!(CqlValue::Double(1.0).to_timestamp().is_err());
    }

    #[test]
    fn test_decimal_text_layout() {
        assert_eq!(decimal_text(&decimal(-12345, 2)), "-123.45");
        assert_eq!(decimal_text(&decimal(5, 3)), "0.005");
        assert_eq!(decimal_text(&decimal(1, 6)), "0.000001");
        assert_eq!(decimal_text(&decimal(1, 7)), "1E-7");
        assert_eq!(decimal_text(&decimal(-123, 10)), "-1.23E-8");
        assert_eq!(decimal_text(&decimal(7, -2)), "7E+2");
        assert_eq!(decimal_text(&decimal(0, 0)), "0");
        assert_eq!(decimal_text(&decimal(42, 0)), "42");
    }

    #[test]
    fn test_decimal_truncation() {
        assert_eq!(decimal_trunc_i64(&decimal(-799, 2)), -7);
        assert_eq!(decimal_trunc_i64(&decimal(5, 3)), 0);
        assert_eq!(decimal_trunc_i64(&decimal(3, -2)), 300);
        assert_eq!(decimal_trunc_i64(&decimal(1, -40)), i64::MAX);
        assert_eq!(decimal_trunc_i64(&decimal(-1, -40)), i64::MIN);
        assert_eq!(decimal_to_f64(&decimal(15, 1)), 1.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(CqlValue::Double(1.0).to_string(), "1.0");
        assert_eq!(CqlValue::Bytes(Bytes::from_static(&[0xca, 0xfe])).to_string(), "cafe");
        assert_eq!(CqlValue::Text("x".into()).to_string(), "x");
        assert_eq!(
            CqlValue::Timestamp(TimeUtils::from_millis(0).unwrap()).to_string(),
            "1970-01-01 00:00:00+0000"
        );
    }
}
