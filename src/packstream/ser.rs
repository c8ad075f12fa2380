//! serde `Serializer` producing [`Value`]s.
//!
//! Keyed containers (structs, maps) become string-keyed maps and unkeyed
//! containers (sequences, tuples) become lists, recursively.

use std::collections::HashMap;

use serde::ser::{self, Serialize};

use super::error::{PackStreamError, PackStreamErrorKind, PackStreamResult};
use super::value::{Structure, Value};

/// Name under which a [`Value::Structure`] serializes itself, so that this
/// serializer can rebuild the structure instead of a plain map.
pub(crate) const STRUCTURE_TOKEN: &str = "$__packstream_private_Structure";
pub(crate) const SIGNATURE_FIELD: &str = "$__packstream_private_signature";
pub(crate) const FIELDS_FIELD: &str = "$__packstream_private_fields";

/// Convert any serializable value into a [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> PackStreamResult<Value> {
    value.serialize(ValueSerializer)
}

impl Serialize for Value {
    fn serialize<S: ser::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use ser::SerializeStruct;

        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
            Value::Structure(s) => {
                let mut state = serializer.serialize_struct(STRUCTURE_TOKEN, 2)?;
                state.serialize_field(SIGNATURE_FIELD, &s.signature)?;
                state.serialize_field(FIELDS_FIELD, &s.fields)?;
                state.end()
            }
        }
    }
}

pub struct ValueSerializer;

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = PackStreamError;

    type SerializeSeq = SerializeList;
    type SerializeTuple = SerializeList;
    type SerializeTupleStruct = SerializeList;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> PackStreamResult<Value> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> PackStreamResult<Value> {
        Ok(Value::Integer(v as i64))
    }

    fn serialize_i16(self, v: i16) -> PackStreamResult<Value> {
        Ok(Value::Integer(v as i64))
    }

    fn serialize_i32(self, v: i32) -> PackStreamResult<Value> {
        Ok(Value::Integer(v as i64))
    }

    fn serialize_i64(self, v: i64) -> PackStreamResult<Value> {
        Ok(Value::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> PackStreamResult<Value> {
        Ok(Value::Integer(v as i64))
    }

    fn serialize_u16(self, v: u16) -> PackStreamResult<Value> {
        Ok(Value::Integer(v as i64))
    }

    fn serialize_u32(self, v: u32) -> PackStreamResult<Value> {
        Ok(Value::Integer(v as i64))
    }

    fn serialize_u64(self, v: u64) -> PackStreamResult<Value> {
        i64::try_from(v).map(Value::Integer).map_err(|_| {
            PackStreamError::with_detail(
                PackStreamErrorKind::NotPackable,
                format!("{} does not fit in a signed 64-bit integer", v),
            )
        })
    }

    fn serialize_f32(self, v: f32) -> PackStreamResult<Value> {
        Ok(Value::Float(v as f64))
    }

    fn serialize_f64(self, v: f64) -> PackStreamResult<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> PackStreamResult<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> PackStreamResult<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> PackStreamResult<Value> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> PackStreamResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> PackStreamResult<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> PackStreamResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> PackStreamResult<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> PackStreamResult<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> PackStreamResult<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> PackStreamResult<Value> {
        let mut map = HashMap::with_capacity(1);
        map.insert(variant.to_string(), to_value(value)?);
        Ok(Value::Map(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> PackStreamResult<SerializeList> {
        Ok(SerializeList {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> PackStreamResult<SerializeList> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> PackStreamResult<SerializeList> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> PackStreamResult<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> PackStreamResult<SerializeMap> {
        Ok(SerializeMap {
            map: HashMap::with_capacity(len.unwrap_or(0)),
            next_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> PackStreamResult<SerializeStruct> {
        if name == STRUCTURE_TOKEN {
            Ok(SerializeStruct::Structure {
                signature: None,
                fields: None,
            })
        } else {
            Ok(SerializeStruct::Map(HashMap::with_capacity(len)))
        }
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> PackStreamResult<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant,
            map: HashMap::with_capacity(len),
        })
    }
}

pub struct SerializeList {
    items: Vec<Value>,
}

impl ser::SerializeSeq for SerializeList {
    type Ok = Value;
    type Error = PackStreamError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> PackStreamResult<()> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> PackStreamResult<Value> {
        Ok(Value::List(self.items))
    }
}

impl ser::SerializeTuple for SerializeList {
    type Ok = Value;
    type Error = PackStreamError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> PackStreamResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> PackStreamResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeList {
    type Ok = Value;
    type Error = PackStreamError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> PackStreamResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> PackStreamResult<Value> {
        ser::SerializeSeq::end(self)
    }
}

pub struct SerializeTupleVariant {
    variant: &'static str,
    items: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = PackStreamError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> PackStreamResult<()> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn end(self) -> PackStreamResult<Value> {
        let mut map = HashMap::with_capacity(1);
        map.insert(self.variant.to_string(), Value::List(self.items));
        Ok(Value::Map(map))
    }
}

pub struct SerializeMap {
    map: HashMap<String, Value>,
    next_key: Option<String>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = PackStreamError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> PackStreamResult<()> {
        self.next_key = Some(map_key(to_value(key)?)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> PackStreamResult<()> {
        let key = self.next_key.take().ok_or_else(|| {
            PackStreamError::with_detail(
                PackStreamErrorKind::Generic,
                "serialize_value called before serialize_key",
            )
        })?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> PackStreamResult<Value> {
        Ok(Value::Map(self.map))
    }
}

/// Map keys must be strings; integer and char keys are rendered as text.
fn map_key(key: Value) -> PackStreamResult<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Integer(i) => Ok(i.to_string()),
        other => Err(PackStreamError::expectation(
            PackStreamErrorKind::TypeMismatch,
            "string map key",
            other.type_name(),
        )),
    }
}

pub enum SerializeStruct {
    Map(HashMap<String, Value>),
    Structure {
        signature: Option<u8>,
        fields: Option<Vec<Value>>,
    },
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Value;
    type Error = PackStreamError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> PackStreamResult<()> {
        match self {
            SerializeStruct::Map(map) => {
                map.insert(key.to_string(), to_value(value)?);
            }
            SerializeStruct::Structure { signature, fields } => match key {
                SIGNATURE_FIELD => {
                    let raw = to_value(value)?.require_int()?;
                    let byte = u8::try_from(raw).map_err(|_| {
                        PackStreamError::with_detail(
                            PackStreamErrorKind::OutOfBoundary,
                            format!("Structure signature {} does not fit in a byte", raw),
                        )
                    })?;
                    *signature = Some(byte);
                }
                FIELDS_FIELD => {
                    *fields = Some(to_value(value)?.into_list()?);
                }
                other => {
                    return Err(PackStreamError::with_detail(
                        PackStreamErrorKind::IncorrectValue,
                        format!("Unexpected structure entry '{}'", other),
                    ))
                }
            },
        }
        Ok(())
    }

    fn end(self) -> PackStreamResult<Value> {
        match self {
            SerializeStruct::Map(map) => Ok(Value::Map(map)),
            SerializeStruct::Structure {
                signature: Some(signature),
                fields,
            } => Ok(Value::Structure(Structure {
                signature,
                fields: fields.unwrap_or_default(),
            })),
            SerializeStruct::Structure { signature: None, .. } => Err(PackStreamError::with_detail(
                PackStreamErrorKind::IncorrectValue,
                "Structure serialized without a signature",
            )),
        }
    }
}

pub struct SerializeStructVariant {
    variant: &'static str,
    map: HashMap<String, Value>,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = PackStreamError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> PackStreamResult<()> {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> PackStreamResult<Value> {
        let mut outer = HashMap::with_capacity(1);
        outer.insert(self.variant.to_string(), Value::Map(self.map));
        Ok(Value::Map(outer))
    }
}
