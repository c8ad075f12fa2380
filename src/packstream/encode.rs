use super::error::{PackStreamError, PackStreamErrorKind, PackStreamResult};
use super::marker::{self, TINY_INT_MAX, TINY_INT_MIN};
use super::value::Value;

/// Encode a value into a fresh buffer.
pub fn encode(value: &Value) -> PackStreamResult<Vec<u8>> {
    let mut buf = Vec::new();
    encode_into(value, &mut buf)?;
    Ok(buf)
}

/// Append the encoding of `value` to `dst`.
///
/// On error `dst` may hold a partially written value.
pub fn encode_into(value: &Value, dst: &mut Vec<u8>) -> PackStreamResult<()> {
    match value {
        Value::Null => dst.push(marker::NULL),
        Value::Boolean(true) => dst.push(marker::TRUE),
        Value::Boolean(false) => dst.push(marker::FALSE),
        Value::Integer(i) => write_integer(*i, dst),
        Value::Float(f) => {
            dst.push(marker::FLOAT);
            dst.extend_from_slice(&f.to_be_bytes());
        }
        Value::Bytes(bytes) => {
            marker::BYTES.write_header(bytes.len(), dst)?;
            dst.extend_from_slice(bytes);
        }
        Value::String(s) => write_string(s, dst)?,
        Value::List(items) => {
            marker::LIST.write_header(items.len(), dst)?;
            for item in items {
                encode_into(item, dst)?;
            }
        }
        Value::Map(map) => {
            marker::MAP.write_header(map.len(), dst)?;
            for (key, item) in map {
                write_string(key, dst)?;
                encode_into(item, dst)?;
            }
        }
        Value::Structure(structure) => {
            marker::STRUCTURE
                .write_header(structure.fields.len(), dst)
                .map_err(|e| {
                    PackStreamError::with_detail(
                        PackStreamErrorKind::NotPackable,
                        format!(
                            "Structure 0x{:02X} has too many fields: {}",
                            structure.signature,
                            e.detail().unwrap_or_default()
                        ),
                    )
                })?;
            dst.push(structure.signature);
            for field in &structure.fields {
                encode_into(field, dst)?;
            }
        }
    }
    Ok(())
}

fn write_string(s: &str, dst: &mut Vec<u8>) -> PackStreamResult<()> {
    marker::STRING.write_header(s.len(), dst)?;
    dst.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_integer(i: i64, dst: &mut Vec<u8>) {
    if (TINY_INT_MIN..=TINY_INT_MAX).contains(&i) {
        dst.push(i as i8 as u8);
    } else if i >= i8::MIN as i64 && i <= i8::MAX as i64 {
        dst.push(marker::INT_8);
        dst.push(i as i8 as u8);
    } else if i >= i16::MIN as i64 && i <= i16::MAX as i64 {
        dst.push(marker::INT_16);
        dst.extend_from_slice(&(i as i16).to_be_bytes());
    } else if i >= i32::MIN as i64 && i <= i32::MAX as i64 {
        dst.push(marker::INT_32);
        dst.extend_from_slice(&(i as i32).to_be_bytes());
    } else {
        dst.push(marker::INT_64);
        dst.extend_from_slice(&i.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::Structure;

    fn bytes(value: impl Into<Value>) -> Vec<u8> {
        encode(&value.into()).unwrap()
    }

    #[test]
    fn test_encode_constants() {
        assert_eq!(bytes(Value::Null), vec![0xC0]);
        assert_eq!(bytes(true), vec![0xC3]);
        assert_eq!(bytes(false), vec![0xC2]);
    }

    #[test]
    fn test_encode_integer_widths() {
        assert_eq!(bytes(0i64), vec![0x00]);
        assert_eq!(bytes(127i64), vec![0x7F]);
        assert_eq!(bytes(-16i64), vec![0xF0]);
        assert_eq!(bytes(-17i64), vec![0xC8, 0xEF]);
        assert_eq!(bytes(-128i64), vec![0xC8, 0x80]);
        assert_eq!(bytes(128i64), vec![0xC9, 0x00, 0x80]);
        assert_eq!(bytes(-129i64), vec![0xC9, 0xFF, 0x7F]);
        assert_eq!(bytes(32768i64), vec![0xCA, 0x00, 0x00, 0x80, 0x00]);
        assert_eq!(
            bytes(2147483648i64),
            vec![0xCB, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_encode_float() {
        assert_eq!(
            bytes(1.1f64),
            vec![0xC1, 0x3F, 0xF1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9A]
        );
    }

    #[test]
    fn test_encode_string() {
        assert_eq!(bytes("A"), vec![0x81, 0x41]);
        assert_eq!(bytes(""), vec![0x80]);
        let long = "a".repeat(16);
        let encoded = bytes(long.as_str());
        assert_eq!(&encoded[..2], &[0xD0, 16]);
        assert_eq!(encoded.len(), 18);
    }

    #[test]
    fn test_encode_bytes() {
        assert_eq!(bytes(vec![1u8, 2, 3]), vec![0xCC, 0x03, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_encode_list_and_map() {
        let list = Value::List(vec![Value::from(1), Value::from(2), Value::from(3)]);
        assert_eq!(bytes(list), vec![0x93, 0x01, 0x02, 0x03]);

        let map: Value = vec![("a", 1i64)].into_iter().collect();
        assert_eq!(bytes(map), vec![0xA1, 0x81, 0x61, 0x01]);
    }

    #[test]
    fn test_encode_structure() {
        let s = Structure::new(0x4E, vec![Value::from(1), Value::List(vec![])]);
        assert_eq!(bytes(s), vec![0xB2, 0x4E, 0x01, 0x90]);
    }
}
