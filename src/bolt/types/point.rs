bolt_structure! {
    Point2D = 0x58 => {
        srid: i64,
        x: f64,
        y: f64,
    }
}

bolt_structure! {
    Point3D = 0x59 => {
        srid: i64,
        x: f64,
        y: f64,
        z: f64,
    }
}

impl Point2D {
    /// WGS-84 geographic coordinates.
    pub const SRID_WGS84: i64 = 4326;
    /// Cartesian coordinates.
    pub const SRID_CARTESIAN: i64 = 7203;

    pub fn cartesian(x: f64, y: f64) -> Self {
        Self {
            srid: Self::SRID_CARTESIAN,
            x,
            y,
        }
    }
}

impl Point3D {
    pub const SRID_WGS84: i64 = 4979;
    pub const SRID_CARTESIAN: i64 = 9157;

    pub fn cartesian(x: f64, y: f64, z: f64) -> Self {
        Self {
            srid: Self::SRID_CARTESIAN,
            x,
            y,
            z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packstream::{encode, StructureEncode, Value};

    #[test]
    fn test_point_bytes() {
        let point = Point2D::cartesian(1.0, 2.0);
        let bytes = encode(&Value::Structure(point.to_structure().unwrap())).unwrap();
        assert_eq!(&bytes[..2], &[0xB3, 0x58]);
        // srid 7203 needs INT_16
        assert_eq!(&bytes[2..5], &[0xC9, 0x1C, 0x23]);
        assert_eq!(bytes[5], 0xC1);
    }

    #[test]
    fn test_point3d_field_count() {
        let structure = Point3D::cartesian(1.0, 2.0, 3.0).to_structure().unwrap();
        assert_eq!(structure.signature, 0x59);
        assert_eq!(structure.fields.len(), 4);
    }
}
