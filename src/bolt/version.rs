use std::fmt;

/// A Bolt protocol version.
///
/// On the wire a version is a big-endian `u32` whose low byte is the major
/// version and whose next byte is the minor version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const ZERO: Version = Version::new(0, 0);
    pub const V5_4: Version = Version::new(5, 4);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub fn to_raw(self) -> u32 {
        ((self.minor as u32) << 8) | self.major as u32
    }

    pub fn from_raw(raw: u32) -> Self {
        Self {
            major: (raw & 0xFF) as u8,
            minor: ((raw >> 8) & 0xFF) as u8,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Version::ZERO
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
