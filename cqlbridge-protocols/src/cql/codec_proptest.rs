//! Property-based tests for the byte codecs
//!
//! Every encodable type must survive a decompose/compose round trip, every
//! scalar type must accept a zero-length buffer, and fixed-width types must
//! reject buffers of any other width.

#[cfg(test)]
mod proptests {
    use crate::cql::types::CqlType;
    use crate::cql::value::CqlValue;
    use bigdecimal::BigDecimal;
    use crate::error::ProtocolError;
    use cqlbridge_util::TimeUtils;
    use num_bigint::BigInt;
    use proptest::prelude::*;
    use uuid::Uuid;

    const SCALAR_TYPES: [CqlType; 15] = [
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
    ];

    /// Epoch millis well inside chrono's representable range
    fn arb_millis() -> impl Strategy<Value = i64> {
        -8_000_000_000_000i64..8_000_000_000_000i64
    }

    fn round_trip(cql_type: CqlType, value: CqlValue) -> Result<(), TestCaseError> {
        let bytes = cql_type
            .decompose(&value)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let back = cql_type
            .compose(&bytes)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(back, value);
        Ok(())
    }

    proptest! {
        #[test]
        fn test_int32_round_trip(v in any::<i32>()) {
            round_trip(CqlType::Int32, CqlValue::Int32(v))?;
        }

        #[test]
        fn test_long_and_counter_round_trip(v in any::<i64>()) {
            round_trip(CqlType::Long, CqlValue::Int64(v))?;
            round_trip(CqlType::Counter, CqlValue::Int64(v))?;
        }

        #[test]
        fn test_float_round_trip(v in any::<f32>().prop_filter("finite", |x| x.is_finite())) {
            round_trip(CqlType::Float, CqlValue::Float(v))?;
        }

        #[test]
        fn test_double_round_trip(v in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
            round_trip(CqlType::Double, CqlValue::Double(v))?;
        }

        #[test]
        fn test_boolean_round_trip(v in any::<bool>()) {
            round_trip(CqlType::Boolean, CqlValue::Bool(v))?;
        }

        #[test]
        fn test_date_round_trip(millis in arb_millis()) {
            let instant = TimeUtils::from_millis(millis).unwrap();
            round_trip(CqlType::Date, CqlValue::Timestamp(instant))?;
        }

        #[test]
        fn test_uuid_round_trip(v in any::<u128>()) {
            round_trip(CqlType::Uuid, CqlValue::Uuid(Uuid::from_u128(v)))?;
        }

        #[test]
        fn test_varint_round_trip(v in any::<i128>()) {
            round_trip(CqlType::Integer, CqlValue::BigInt(BigInt::from(v)))?;
        }

        #[test]
        fn test_decimal_round_trip(unscaled in any::<i128>(), scale in any::<i32>()) {
            let value = BigDecimal::new(BigInt::from(unscaled), i64::from(scale));
            round_trip(CqlType::Decimal, CqlValue::Decimal(value))?;
        }

        #[test]
        fn test_text_round_trip(s in "\\PC*", ascii in "[ -~]*") {
            round_trip(CqlType::Utf8, CqlValue::Text(s))?;
            round_trip(CqlType::Ascii, CqlValue::Text(ascii))?;
        }

        /// Zero-length buffers never fail and display as the empty string
        #[test]
        fn test_zero_length_leniency(idx in 0usize..SCALAR_TYPES.len()) {
            let cql_type = SCALAR_TYPES[idx];
            prop_assert_eq!(cql_type.display_string(&[]).unwrap(), "");
            prop_assert!(cql_type.compose(&[]).is_ok());
        }

        /// Fixed-width types reject every other non-empty width
        #[test]
        fn test_wrong_width_is_marshal_error(
            idx in 0usize..SCALAR_TYPES.len(),
            bytes in prop::collection::vec(any::<u8>(), 1..24)
        ) {
            let cql_type = SCALAR_TYPES[idx];
            let width = cql_type.fixed_width();
            prop_assume!(width.is_some() && width != Some(bytes.len()));

            let err = cql_type.compose(&bytes).unwrap_err();
            prop_assert!(matches!(err, ProtocolError::Marshal(_)), "unexpected error: {}", err);
        }
    }
}
