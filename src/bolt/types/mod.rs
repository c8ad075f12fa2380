//! Graph, spatial and temporal values carried as structures inside records.
//!
//! Every type here implements the structure traits and serde, so records can
//! be decoded straight into user types that contain them.

/// Declares a structure type whose fields are read and written in order.
macro_rules! bolt_structure {
    (
        $(#[$meta:meta])*
        $name:ident = $signature:expr => { $($(#[$field_meta:meta])* $field:ident : $ty:ty),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $($(#[$field_meta])* pub $field: $ty),+
        }

        impl $crate::packstream::PackStreamStructure for $name {
            const SIGNATURE: u8 = $signature;
        }

        impl $crate::packstream::StructureEncode for $name {
            fn encode_fields(
                &self,
                fields: &mut $crate::packstream::FieldWriter,
            ) -> $crate::packstream::PackStreamResult<()> {
                $(fields.write(&self.$field)?;)+
                Ok(())
            }
        }

        impl $crate::packstream::StructureDecode for $name {
            const FIELD_COUNT: usize = [$(stringify!($field)),+].len();

            fn decode_fields(
                fields: &mut $crate::packstream::FieldReader,
            ) -> $crate::packstream::PackStreamResult<Self> {
                Ok(Self {
                    $($field: fields.read()?),+
                })
            }
        }

        $crate::packstream::impl_structure_serde!($name);
    };
}

pub mod node;
pub mod path;
pub mod point;
pub mod relationship;
pub mod temporal;

pub use node::Node;
pub use path::Path;
pub use point::{Point2D, Point3D};
pub use relationship::{Relationship, UnboundRelationship};
pub use temporal::{Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Time};
