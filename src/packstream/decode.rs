use std::collections::HashMap;

use super::error::{PackStreamError, PackStreamErrorKind, PackStreamResult};
use super::marker::{self, take, take_array};
use super::value::{Structure, Value};

/// Deepest container nesting accepted from the wire.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Decode one value from the front of `bytes`.
///
/// Returns the value and the number of bytes it occupied; trailing bytes are
/// left for the caller.
pub fn decode(bytes: &[u8]) -> PackStreamResult<(Value, usize)> {
    let mut src = bytes;
    let value = read_value(&mut src, 0)?;
    Ok((value, bytes.len() - src.len()))
}

/// Decode a value that must occupy all of `bytes`.
pub fn decode_exact(bytes: &[u8]) -> PackStreamResult<Value> {
    let (value, consumed) = decode(bytes)?;
    if consumed != bytes.len() {
        return Err(PackStreamError::with_detail(
            PackStreamErrorKind::IncorrectValue,
            format!("{} trailing bytes after value", bytes.len() - consumed),
        ));
    }
    Ok(value)
}

fn read_value(src: &mut &[u8], depth: usize) -> PackStreamResult<Value> {
    if depth > MAX_NESTING_DEPTH {
        return Err(PackStreamError::with_detail(
            PackStreamErrorKind::IncorrectValue,
            format!("Nesting deeper than {} levels", MAX_NESTING_DEPTH),
        ));
    }
    let [m] = take_array::<1>(src)?;

    match m {
        marker::NULL => return Ok(Value::Null),
        marker::TRUE => return Ok(Value::Boolean(true)),
        marker::FALSE => return Ok(Value::Boolean(false)),
        marker::FLOAT => return Ok(Value::Float(f64::from_be_bytes(take_array(src)?))),
        marker::INT_8 => return Ok(Value::Integer(i8::from_be_bytes(take_array(src)?) as i64)),
        marker::INT_16 => {
            return Ok(Value::Integer(i16::from_be_bytes(take_array(src)?) as i64))
        }
        marker::INT_32 => {
            return Ok(Value::Integer(i32::from_be_bytes(take_array(src)?) as i64))
        }
        marker::INT_64 => return Ok(Value::Integer(i64::from_be_bytes(take_array(src)?))),
        _ => {}
    }

    // Tiny ints occupy 0x00..=0x7F and 0xF0..=0xFF.
    if m <= 0x7F || m >= 0xF0 {
        return Ok(Value::Integer(m as i8 as i64));
    }

    if let Some(len) = marker::BYTES.read_size(m, src)? {
        return Ok(Value::Bytes(take(src, len)?.to_vec()));
    }

    if let Some(len) = marker::STRING.read_size(m, src)? {
        return read_string_body(src, len).map(Value::String);
    }

    if let Some(len) = marker::LIST.read_size(m, src)? {
        let mut items = Vec::with_capacity(len.min(src.len()));
        for _ in 0..len {
            items.push(read_value(src, depth + 1)?);
        }
        return Ok(Value::List(items));
    }

    if let Some(len) = marker::MAP.read_size(m, src)? {
        let mut map = HashMap::with_capacity(len.min(src.len()));
        for _ in 0..len {
            let key = match read_value(src, depth + 1)? {
                Value::String(key) => key,
                other => {
                    return Err(PackStreamError::expectation(
                        PackStreamErrorKind::TypeMismatch,
                        "string map key",
                        other.type_name(),
                    ))
                }
            };
            let value = read_value(src, depth + 1)?;
            map.insert(key, value);
        }
        return Ok(Value::Map(map));
    }

    if let Some(len) = marker::STRUCTURE.read_size(m, src)? {
        let [signature] = take_array::<1>(src)?;
        let mut fields = Vec::with_capacity(len.min(src.len()));
        for _ in 0..len {
            fields.push(read_value(src, depth + 1)?);
        }
        return Ok(Value::Structure(Structure { signature, fields }));
    }

    Err(PackStreamError::with_detail(
        PackStreamErrorKind::UnexpectedByteMarker,
        format!("Unknown marker 0x{:02X}", m),
    ))
}

fn read_string_body(src: &mut &[u8], len: usize) -> PackStreamResult<String> {
    let raw = take(src, len)?;
    String::from_utf8(raw.to_vec()).map_err(|e| {
        PackStreamError::with_detail(PackStreamErrorKind::IncorrectValue, e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::encode;

    fn round_trip(value: Value) {
        let bytes = encode(&value).unwrap();
        let (decoded, consumed) = decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_round_trip_integer_boundaries() {
        for i in [
            0,
            -1,
            -16,
            -17,
            127,
            128,
            i8::MIN as i64,
            i8::MIN as i64 - 1,
            i16::MIN as i64,
            i16::MAX as i64,
            i16::MAX as i64 + 1,
            i32::MIN as i64,
            i32::MAX as i64,
            i32::MAX as i64 + 1,
            i64::MIN,
            i64::MAX,
        ] {
            round_trip(Value::Integer(i));
        }
    }

    #[test]
    fn test_round_trip_collection_sizes() {
        for size in [0usize, 15, 16, 255, 256, 65535, 65536] {
            round_trip(Value::String("x".repeat(size)));
            round_trip(Value::Bytes(vec![7u8; size]));
            round_trip(Value::List(vec![Value::Null; size]));
        }
        for size in [0usize, 15, 16, 255, 256] {
            let map: HashMap<String, Value> =
                (0..size).map(|i| (format!("k{}", i), Value::from(i as i64))).collect();
            round_trip(Value::Map(map));
        }
    }

    #[test]
    fn test_round_trip_nested() {
        let inner: Value = vec![("n", Value::Float(-0.5)), ("b", Value::Bytes(vec![1, 2]))]
            .into_iter()
            .collect();
        let value = Value::Structure(Structure::new(
            0x4E,
            vec![
                Value::Integer(1),
                Value::List(vec![Value::from("Person"), Value::Null]),
                inner,
            ],
        ));
        round_trip(value);
    }

    #[test]
    fn test_round_trip_wide_structure() {
        let fields = (0..20).map(Value::from).collect::<Vec<_>>();
        round_trip(Value::Structure(Structure::new(0x01, fields)));
    }

    #[test]
    fn test_decode_reports_consumed_bytes() {
        let (value, consumed) = decode(&[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(value, Value::Integer(1));
        assert_eq!(consumed, 1);
        assert!(decode_exact(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn test_decode_truncated() {
        let err = decode(&[0xC9, 0x01]).unwrap_err();
        assert_eq!(err.kind(), PackStreamErrorKind::NotEnoughBytes);

        let err = decode(&[0x93, 0x01]).unwrap_err();
        assert_eq!(err.kind(), PackStreamErrorKind::NotEnoughBytes);

        let err = decode(&[]).unwrap_err();
        assert_eq!(err.kind(), PackStreamErrorKind::NotEnoughBytes);
    }

    #[test]
    fn test_decode_unknown_marker() {
        let err = decode(&[0xE0]).unwrap_err();
        assert_eq!(err.kind(), PackStreamErrorKind::UnexpectedByteMarker);
    }

    #[test]
    fn test_decode_rejects_non_string_key() {
        let err = decode(&[0xA1, 0x01, 0x02]).unwrap_err();
        assert_eq!(err.kind(), PackStreamErrorKind::TypeMismatch);
    }

    #[test]
    fn test_decode_rejects_deep_nesting() {
        let mut bytes = vec![0x91; 1_000_000];
        bytes.push(0xC0);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err.kind(), PackStreamErrorKind::IncorrectValue);

        let mut bytes = vec![0x91; MAX_NESTING_DEPTH];
        bytes.push(0xC0);
        let (value, consumed) = decode(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert!(matches!(value, Value::List(_)));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode(&[0x82, 0xFF, 0xFE]).unwrap_err();
        assert_eq!(err.kind(), PackStreamErrorKind::IncorrectValue);
    }
}
