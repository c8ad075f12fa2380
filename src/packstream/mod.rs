//! PackStream binary serialization
//!
//! The value model shared by every message and record, its byte-level codec,
//! and a serde bridge plus structure traits used by typed messages.

mod de;
mod decode;
mod encode;
pub mod error;
pub mod marker;
mod ser;
pub mod structure;
mod value;

pub use de::{from_value, ValueDeserializer};
pub use decode::{decode, decode_exact};
pub use encode::{encode, encode_into};
pub use error::{ErrorLocation, PackStreamError, PackStreamErrorKind, PackStreamResult};
pub use ser::{to_value, ValueSerializer};
pub(crate) use structure::impl_structure_serde;
pub use structure::{FieldReader, FieldWriter, PackStreamStructure, StructureDecode, StructureEncode};
pub use value::{Structure, Value};
