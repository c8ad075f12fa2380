//! serde `Deserializer` reading from [`Value`]s.

use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use serde::forward_to_deserialize_any;

use super::error::{PackStreamError, PackStreamErrorKind, PackStreamResult};
use super::ser::{FIELDS_FIELD, SIGNATURE_FIELD};
use super::value::{Structure, Value};

/// Convert a [`Value`] into any deserializable type.
pub fn from_value<T: DeserializeOwned>(value: Value) -> PackStreamResult<T> {
    T::deserialize(ValueDeserializer::new(value))
}

// ==================== Value as a deserialization target ====================

impl<'de> de::Deserialize<'de> for Value {
    fn deserialize<D: de::Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any PackStream value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Boolean(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        i64::try_from(v)
            .map(Value::Integer)
            .map_err(|_| E::custom(format!("{} does not fit in a signed 64-bit integer", v)))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Value, E> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Value, E> {
        Ok(Value::Bytes(v))
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        de::Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let first: Option<String> = access.next_key()?;
        match first.as_deref() {
            None => Ok(Value::Map(HashMap::new())),
            Some(SIGNATURE_FIELD) => {
                let signature: u8 = access.next_value()?;
                let fields = match access.next_key::<String>()?.as_deref() {
                    Some(FIELDS_FIELD) => access.next_value::<Vec<Value>>()?,
                    _ => Vec::new(),
                };
                Ok(Value::Structure(Structure { signature, fields }))
            }
            Some(_) => {
                let mut map = HashMap::with_capacity(access.size_hint().unwrap_or(0) + 1);
                let mut key = first;
                while let Some(k) = key {
                    let value = access.next_value()?;
                    map.insert(k, value);
                    key = access.next_key()?;
                }
                Ok(Value::Map(map))
            }
        }
    }
}

// ==================== Deserializer over an owned Value ====================

pub struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl IntoDeserializer<'_, PackStreamError> for Value {
    type Deserializer = ValueDeserializer;

    fn into_deserializer(self) -> ValueDeserializer {
        ValueDeserializer::new(self)
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = PackStreamError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> PackStreamResult<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Integer(i) => visitor.visit_i64(i),
            Value::Float(f) => visitor.visit_f64(f),
            Value::Bytes(b) => visitor.visit_byte_buf(b),
            Value::String(s) => visitor.visit_string(s),
            Value::List(items) => visit_list(items, visitor),
            Value::Map(map) => visitor.visit_map(MapDeserializer::new(map)),
            Value::Structure(s) => visitor.visit_map(StructureDeserializer::new(s)),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> PackStreamResult<V::Value> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> PackStreamResult<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> PackStreamResult<V::Value> {
        match self.value {
            Value::List(items) => visit_list(items, visitor),
            Value::Bytes(bytes) => visit_list(bytes.into_iter().map(Value::from).collect(), visitor),
            Value::Structure(s) => visit_list(s.fields, visitor),
            other => Err(PackStreamError::expectation(
                PackStreamErrorKind::TypeMismatch,
                "list",
                other.type_name(),
            )),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> PackStreamResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> PackStreamResult<V::Value> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> PackStreamResult<V::Value> {
        match self.value {
            Value::Bytes(b) => visitor.visit_byte_buf(b),
            Value::String(s) => visitor.visit_string(s),
            Value::List(items) => visit_list(items, visitor),
            other => Err(PackStreamError::expectation(
                PackStreamErrorKind::TypeMismatch,
                "bytes",
                other.type_name(),
            )),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> PackStreamResult<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> PackStreamResult<V::Value> {
        match self.value {
            Value::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            Value::Map(map) if map.len() == 1 => {
                let mut iter = map.into_iter();
                match iter.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    None => Err(PackStreamError::new(PackStreamErrorKind::IncorrectValue)),
                }
            }
            other => Err(PackStreamError::expectation(
                PackStreamErrorKind::TypeMismatch,
                "string or single-entry map for enum",
                other.type_name(),
            )),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> PackStreamResult<V::Value> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            other => Err(PackStreamError::expectation(
                PackStreamErrorKind::TypeMismatch,
                "null",
                other.type_name(),
            )),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> PackStreamResult<V::Value> {
        visitor.visit_unit()
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        unit_struct map struct identifier
    }
}

fn visit_list<'de, V: Visitor<'de>>(items: Vec<Value>, visitor: V) -> PackStreamResult<V::Value> {
    let len = items.len();
    let mut seq = SeqDeserializer {
        iter: items.into_iter(),
    };
    let result = visitor.visit_seq(&mut seq)?;
    if seq.iter.len() == 0 {
        Ok(result)
    } else {
        Err(PackStreamError::with_detail(
            PackStreamErrorKind::IncorrectNumberOfFields,
            format!("{} elements, {} left unread", len, seq.iter.len()),
        ))
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = PackStreamError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> PackStreamResult<Option<T::Value>> {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: hash_map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: HashMap<String, Value>) -> Self {
        Self {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = PackStreamError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> PackStreamResult<Option<K::Value>> {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ValueDeserializer::new(Value::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> PackStreamResult<V::Value> {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(PackStreamError::with_detail(
                PackStreamErrorKind::Generic,
                "next_value called before next_key",
            )),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

/// Presents a structure as a two-entry map (signature, fields) so that
/// [`Value`]'s own visitor can rebuild it.
struct StructureDeserializer {
    signature: Option<u8>,
    fields: Option<Vec<Value>>,
    pending: Option<Value>,
}

impl StructureDeserializer {
    fn new(structure: Structure) -> Self {
        Self {
            signature: Some(structure.signature),
            fields: Some(structure.fields),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for StructureDeserializer {
    type Error = PackStreamError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> PackStreamResult<Option<K::Value>> {
        let key = if let Some(signature) = self.signature.take() {
            self.pending = Some(Value::Integer(signature as i64));
            SIGNATURE_FIELD
        } else if let Some(fields) = self.fields.take() {
            self.pending = Some(Value::List(fields));
            FIELDS_FIELD
        } else {
            return Ok(None);
        };
        seed.deserialize(ValueDeserializer::new(Value::from(key)))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> PackStreamResult<V::Value> {
        match self.pending.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(PackStreamError::with_detail(
                PackStreamErrorKind::Generic,
                "next_value called before next_key",
            )),
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = PackStreamError;
    type Variant = VariantDeserializer;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> PackStreamResult<(V::Value, VariantDeserializer)> {
        let variant = seed.deserialize(ValueDeserializer::new(Value::String(self.variant)))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = PackStreamError;

    fn unit_variant(self) -> PackStreamResult<()> {
        match self.value {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(PackStreamError::expectation(
                PackStreamErrorKind::TypeMismatch,
                "unit variant",
                other.type_name(),
            )),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> PackStreamResult<T::Value> {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(PackStreamError::expectation(
                PackStreamErrorKind::TypeMismatch,
                "newtype variant",
                "unit variant",
            )),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> PackStreamResult<V::Value> {
        match self.value {
            Some(Value::List(items)) => visit_list(items, visitor),
            Some(other) => Err(PackStreamError::expectation(
                PackStreamErrorKind::TypeMismatch,
                "list for tuple variant",
                other.type_name(),
            )),
            None => Err(PackStreamError::expectation(
                PackStreamErrorKind::TypeMismatch,
                "tuple variant",
                "unit variant",
            )),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> PackStreamResult<V::Value> {
        match self.value {
            Some(Value::Map(map)) => visitor.visit_map(MapDeserializer::new(map)),
            Some(other) => Err(PackStreamError::expectation(
                PackStreamErrorKind::TypeMismatch,
                "map for struct variant",
                other.type_name(),
            )),
            None => Err(PackStreamError::expectation(
                PackStreamErrorKind::TypeMismatch,
                "struct variant",
                "unit variant",
            )),
        }
    }
}
