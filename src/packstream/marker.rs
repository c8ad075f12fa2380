//! Marker bytes and the shared compact/long header scheme.

use super::error::{PackStreamError, PackStreamErrorKind, PackStreamResult};

pub const NULL: u8 = 0xC0;
pub const FLOAT: u8 = 0xC1;
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

pub const INT_8: u8 = 0xC8;
pub const INT_16: u8 = 0xC9;
pub const INT_32: u8 = 0xCA;
pub const INT_64: u8 = 0xCB;

/// Inclusive range of integers encoded as a single marker byte.
pub const TINY_INT_MIN: i64 = -16;
pub const TINY_INT_MAX: i64 = 127;

/// Largest length any long header may carry.
pub const MAX_LENGTH: usize = i32::MAX as usize;

/// Header layout for a sized value: an optional compact nibble range and
/// optional 8/16/32-bit long markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeMarker {
    compact: Option<u8>,
    long: [Option<u8>; 3],
}

pub const BYTES: CompositeMarker = CompositeMarker {
    compact: None,
    long: [Some(0xCC), Some(0xCD), Some(0xCE)],
};

pub const STRING: CompositeMarker = CompositeMarker {
    compact: Some(0x80),
    long: [Some(0xD0), Some(0xD1), Some(0xD2)],
};

pub const LIST: CompositeMarker = CompositeMarker {
    compact: Some(0x90),
    long: [Some(0xD4), Some(0xD5), Some(0xD6)],
};

pub const MAP: CompositeMarker = CompositeMarker {
    compact: Some(0xA0),
    long: [Some(0xD8), Some(0xD9), Some(0xDA)],
};

pub const STRUCTURE: CompositeMarker = CompositeMarker {
    compact: Some(0xB0),
    long: [Some(0xDC), Some(0xDD), None],
};

impl CompositeMarker {
    /// Writes the smallest header able to carry `count`.
    pub fn write_header(&self, count: usize, dst: &mut Vec<u8>) -> PackStreamResult<()> {
        if let Some(base) = self.compact {
            if count <= 15 {
                dst.push(base + count as u8);
                return Ok(());
            }
        }

        match (count, self.long) {
            (0..=0xFF, [Some(m8), _, _]) => {
                dst.push(m8);
                dst.push(count as u8);
            }
            (0..=0xFFFF, [_, Some(m16), _]) => {
                dst.push(m16);
                dst.extend_from_slice(&(count as u16).to_be_bytes());
            }
            (0..=MAX_LENGTH, [_, _, Some(m32)]) => {
                dst.push(m32);
                dst.extend_from_slice(&(count as u32).to_be_bytes());
            }
            _ => {
                return Err(PackStreamError::with_detail(
                    PackStreamErrorKind::NotPackable,
                    format!("Too big to be packed: {} elements.", count),
                ))
            }
        }
        Ok(())
    }

    /// Returns the length announced by `marker`, reading the long length from
    /// `src` when needed. `None` means the marker does not belong to this kind.
    pub fn read_size(&self, marker: u8, src: &mut &[u8]) -> PackStreamResult<Option<usize>> {
        if let Some(base) = self.compact {
            if (base..=base + 0x0F).contains(&marker) {
                return Ok(Some((marker - base) as usize));
            }
        }

        let [m8, m16, m32] = self.long;
        if Some(marker) == m8 {
            Ok(Some(take_array::<1>(src)?[0] as usize))
        } else if Some(marker) == m16 {
            Ok(Some(u16::from_be_bytes(take_array(src)?) as usize))
        } else if Some(marker) == m32 {
            let size = u32::from_be_bytes(take_array(src)?);
            if size as usize > MAX_LENGTH {
                return Err(PackStreamError::with_detail(
                    PackStreamErrorKind::OutOfBoundary,
                    format!("Length {} exceeds the signed 32-bit maximum.", size),
                ));
            }
            Ok(Some(size as usize))
        } else {
            Ok(None)
        }
    }
}

/// Splits `N` bytes off the front of `src`.
pub(crate) fn take_array<const N: usize>(src: &mut &[u8]) -> PackStreamResult<[u8; N]> {
    let bytes = take(src, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Splits `len` bytes off the front of `src`.
pub(crate) fn take<'a>(src: &mut &'a [u8], len: usize) -> PackStreamResult<&'a [u8]> {
    if src.len() < len {
        return Err(PackStreamError::expectation(
            PackStreamErrorKind::NotEnoughBytes,
            format!("{} bytes", len),
            format!("{} bytes", src.len()),
        ));
    }
    let (head, tail) = src.split_at(len);
    *src = tail;
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(marker: CompositeMarker, count: usize) -> Vec<u8> {
        let mut buf = Vec::new();
        marker.write_header(count, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_compact_header() {
        assert_eq!(header(STRING, 0), vec![0x80]);
        assert_eq!(header(LIST, 15), vec![0x9F]);
        assert_eq!(header(STRUCTURE, 3), vec![0xB3]);
    }

    #[test]
    fn test_long_headers_use_smallest_width() {
        assert_eq!(header(MAP, 16), vec![0xD8, 16]);
        assert_eq!(header(MAP, 255), vec![0xD8, 0xFF]);
        assert_eq!(header(MAP, 256), vec![0xD9, 0x01, 0x00]);
        assert_eq!(header(STRING, 65535), vec![0xD1, 0xFF, 0xFF]);
        assert_eq!(header(STRING, 65536), vec![0xD2, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_bytes_have_no_compact_form() {
        assert_eq!(header(BYTES, 0), vec![0xCC, 0x00]);
    }

    #[test]
    fn test_structure_long_form() {
        assert_eq!(header(STRUCTURE, 16), vec![0xDC, 16]);
        assert_eq!(header(STRUCTURE, 300), vec![0xDD, 0x01, 0x2C]);
        let err = STRUCTURE.write_header(70_000, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), PackStreamErrorKind::NotPackable);
    }

    #[test]
    fn test_read_size_rejects_oversized_length() {
        let mut src: &[u8] = &[0x80, 0x00, 0x00, 0x00];
        let err = STRING.read_size(0xD2, &mut src).unwrap_err();
        assert_eq!(err.kind(), PackStreamErrorKind::OutOfBoundary);
    }

    #[test]
    fn test_read_size_unknown_marker() {
        let mut src: &[u8] = &[];
        assert_eq!(LIST.read_size(0xC0, &mut src).unwrap(), None);
    }

    #[test]
    fn test_take_truncated() {
        let mut src: &[u8] = &[1, 2];
        let err = take(&mut src, 3).unwrap_err();
        assert_eq!(err.kind(), PackStreamErrorKind::NotEnoughBytes);
    }
}
