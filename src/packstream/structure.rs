//! Positional encode/decode of tagged structures.
//!
//! Message and entity types declare a signature and read or write their
//! fields in order; the field values themselves go through the serde bridge,
//! so nested maps and lists work recursively.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::de::from_value;
use super::error::{PackStreamError, PackStreamErrorKind, PackStreamResult};
use super::ser::to_value;
use super::value::{Structure, Value};

/// A type carried on the wire as a tagged structure.
pub trait PackStreamStructure {
    const SIGNATURE: u8;
}

pub trait StructureEncode: PackStreamStructure {
    fn encode_fields(&self, fields: &mut FieldWriter) -> PackStreamResult<()>;

    fn to_structure(&self) -> PackStreamResult<Structure> {
        let mut writer = FieldWriter::default();
        self.encode_fields(&mut writer)?;
        Ok(Structure::new(Self::SIGNATURE, writer.into_fields()))
    }
}

pub trait StructureDecode: PackStreamStructure + Sized {
    /// Exact number of fields the structure must carry.
    const FIELD_COUNT: usize;

    fn decode_fields(fields: &mut FieldReader) -> PackStreamResult<Self>;

    fn from_structure(structure: Structure) -> PackStreamResult<Self> {
        if structure.signature != Self::SIGNATURE {
            return Err(PackStreamError::expectation(
                PackStreamErrorKind::SignatureMismatch,
                format!("0x{:02X}", Self::SIGNATURE),
                format!("0x{:02X}", structure.signature),
            ));
        }
        if structure.fields.len() != Self::FIELD_COUNT {
            return Err(PackStreamError::expectation(
                PackStreamErrorKind::IncorrectNumberOfFields,
                format!("{} fields", Self::FIELD_COUNT),
                format!("{} fields", structure.fields.len()),
            ));
        }
        let mut reader = FieldReader::new(structure.fields);
        Self::decode_fields(&mut reader)
    }

    fn from_value(value: Value) -> PackStreamResult<Self> {
        Self::from_structure(value.into_structure()?)
    }
}

/// Unkeyed sink for structure fields.
#[derive(Debug, Default)]
pub struct FieldWriter {
    fields: Vec<Value>,
}

impl FieldWriter {
    pub fn write<T: Serialize + ?Sized>(&mut self, field: &T) -> PackStreamResult<()> {
        self.fields.push(to_value(field)?);
        Ok(())
    }

    pub fn write_value(&mut self, field: Value) {
        self.fields.push(field);
    }

    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }
}

/// Unkeyed source of structure fields, consumed front to back.
#[derive(Debug)]
pub struct FieldReader {
    fields: std::vec::IntoIter<Value>,
    index: usize,
}

impl FieldReader {
    pub fn new(fields: Vec<Value>) -> Self {
        Self {
            fields: fields.into_iter(),
            index: 0,
        }
    }

    pub fn read<T: DeserializeOwned>(&mut self) -> PackStreamResult<T> {
        let index = self.index;
        let value = self.read_value()?;
        from_value(value).map_err(|e| {
            PackStreamError::with_detail(
                e.kind(),
                format!("field {}: {}", index, e.detail().unwrap_or_default()),
            )
        })
    }

    pub fn read_value(&mut self) -> PackStreamResult<Value> {
        match self.fields.next() {
            Some(value) => {
                self.index += 1;
                Ok(value)
            }
            None => Err(PackStreamError::with_detail(
                PackStreamErrorKind::OutOfBoundary,
                format!("no field at index {}", self.index),
            )),
        }
    }

    pub fn remaining(&self) -> usize {
        self.fields.len()
    }
}

/// Implements `Serialize`/`Deserialize` for a structure type by going
/// through [`Value`], so it can sit inside any serde-decoded type.
macro_rules! impl_structure_serde {
    ($($ty:ty),* $(,)?) => {
        $(
            impl serde::Serialize for $ty {
                fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    use $crate::packstream::StructureEncode;
                    let structure = self.to_structure().map_err(serde::ser::Error::custom)?;
                    serde::Serialize::serialize(&$crate::packstream::Value::Structure(structure), serializer)
                }
            }

            impl<'de> serde::Deserialize<'de> for $ty {
                fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    use $crate::packstream::StructureDecode;
                    let value = <$crate::packstream::Value as serde::Deserialize>::deserialize(deserializer)?;
                    Self::from_value(value).map_err(serde::de::Error::custom)
                }
            }
        )*
    };
}

pub(crate) use impl_structure_serde;
