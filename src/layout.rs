//! On-wire layout of the FMAP header record.
//!
//! Every record is packed and little-endian. The header is immediately
//! followed by `nareas` area records (see [`crate::area`]) with no padding in
//! between.

use crate::{
    Error, FMAP_HEADER_LEN, FMAP_SIGNATURE, FMAP_SIGNATURE_LEN, FMAP_STRLEN, FMAP_VER_MAJOR,
    FMAP_VER_MINOR_MAX, FMAP_VER_MINOR_MIN,
};
use alloc::{borrow::Cow, string::String, vec::Vec};

/// Cursor over a record whose length has already been checked.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    idx: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, idx: 0 }
    }

    /// Borrow `len` bytes at `offset` in `blob` as a record.
    pub(crate) fn record(blob: &'a [u8], offset: usize, len: usize) -> Result<Self, Error> {
        let end = offset.checked_add(len).filter(|&end| end <= blob.len());

        match end {
            Some(end) => Ok(Self::new(&blob[offset..end])),
            None => Err(Error::TruncatedData {
                offset,
                needed: len,
                available: blob.len(),
            }),
        }
    }

    pub(crate) fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.idx..self.idx + N]);
        self.idx += N;
        out
    }

    pub(crate) fn u8(&mut self) -> u8 {
        u8::from_le_bytes(self.array())
    }

    pub(crate) fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.array())
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    pub(crate) fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.array())
    }
}

/// Pad `name` with NULs to the fixed on-wire width.
pub(crate) fn name_to_field(bytes: &[u8]) -> Result<[u8; FMAP_STRLEN], Error> {
    if bytes.len() > FMAP_STRLEN {
        return Err(Error::NameTooLong {
            len: bytes.len(),
            max: FMAP_STRLEN,
        });
    }

    let mut field = [0u8; FMAP_STRLEN];
    field[..bytes.len()].copy_from_slice(bytes);

    Ok(field)
}

/// Raw bytes of a fixed-width name, without the trailing NUL padding.
///
/// The bytes are kept as stored so that a decoded name always encodes back
/// to the same field, whatever its encoding.
pub(crate) fn name_from_field(field: &[u8; FMAP_STRLEN]) -> Vec<u8> {
    let len = field.iter().rposition(|&c| c != 0).map_or(0, |i| i + 1);

    field[..len].to_vec()
}

/// Validated FMAP header, without its area records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FmapHeader {
    ver_major: u8,
    ver_minor: u8,
    base: u64,
    size: u32,
    name: Vec<u8>,
    nareas: u16,
}

impl FmapHeader {
    pub(crate) fn create(
        ver_major: u8,
        ver_minor: u8,
        base: u64,
        size: u32,
        name: Vec<u8>,
        nareas: u16,
    ) -> Self {
        Self {
            ver_major,
            ver_minor,
            base,
            size,
            name,
            nareas,
        }
    }

    /// Decode and validate the header stored at `offset` in `blob`.
    pub fn from_bytes(blob: &[u8], offset: usize) -> Result<Self, Error> {
        let mut rd = Reader::record(blob, offset, FMAP_HEADER_LEN)?;

        let signature = rd.array::<FMAP_SIGNATURE_LEN>();
        if &signature != FMAP_SIGNATURE {
            return Err(Error::InvalidSignature { offset });
        }

        let ver_major = rd.u8();
        let ver_minor = rd.u8();
        if !version_supported(ver_major, ver_minor) {
            return Err(Error::IncompatibleVersion {
                major: ver_major,
                minor: ver_minor,
            });
        }

        let base = rd.u64();
        let size = rd.u32();
        let name = name_from_field(&rd.array());
        let nareas = rd.u16();

        Ok(Self {
            ver_major,
            ver_minor,
            base,
            size,
            name,
            nareas,
        })
    }

    /// Append the 56 byte wire form to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        let name = name_to_field(&self.name)?;

        out.extend_from_slice(FMAP_SIGNATURE);
        out.push(self.ver_major);
        out.push(self.ver_minor);
        out.extend_from_slice(&self.base.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(&name);
        out.extend_from_slice(&self.nareas.to_le_bytes());

        Ok(())
    }

    /// Fail with [`Error::NameMismatch`] unless the header is named `expected`.
    pub fn check_name(&self, expected: &str) -> Result<(), Error> {
        if self.name != expected.as_bytes() {
            return Err(Error::NameMismatch {
                found: self.name().into_owned(),
                expected: String::from(expected),
            });
        }

        Ok(())
    }

    pub fn version_major(&self) -> u8 {
        self.ver_major
    }

    pub fn version_minor(&self) -> u8 {
        self.ver_minor
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Name for display, with invalid UTF-8 replaced.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    pub fn area_count(&self) -> u16 {
        self.nareas
    }

    pub(crate) fn into_name(self) -> Vec<u8> {
        self.name
    }
}

/// Major must match exactly, minor is accepted within the supported range.
pub fn version_supported(major: u8, minor: u8) -> bool {
    major == FMAP_VER_MAJOR && (FMAP_VER_MINOR_MIN..=FMAP_VER_MINOR_MAX).contains(&minor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn header_bytes(major: u8, minor: u8, name: &str, nareas: u16) -> Vec<u8> {
        let mut out = Vec::new();
        FmapHeader::create(major, minor, 0xffe0_0000, 0x20_0000, name.into(), nareas)
            .write_to(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_header_layout() -> Result<(), Error> {
        let bytes = header_bytes(1, 0, "System BIOS", 7);
        assert_eq!(bytes.len(), FMAP_HEADER_LEN);

        assert_eq!(&bytes[..8], b"__FMAP__");
        assert_eq!(bytes[8], 1);
        assert_eq!(bytes[9], 0);
        assert_eq!(&bytes[10..18], &0xffe0_0000u64.to_le_bytes());
        assert_eq!(&bytes[18..22], &0x20_0000u32.to_le_bytes());
        assert_eq!(&bytes[22..33], b"System BIOS");
        assert!(bytes[33..54].iter().all(|&b| b == 0));
        assert_eq!(&bytes[54..56], &[7, 0]);

        let header = FmapHeader::from_bytes(&bytes, 0)?;
        assert_eq!(header.name(), "System BIOS");
        assert_eq!(header.base(), 0xffe0_0000);
        assert_eq!(header.size(), 0x20_0000);
        assert_eq!(header.area_count(), 7);

        Ok(())
    }

    #[test]
    fn test_header_errors() {
        let mut bytes = header_bytes(1, 1, "x", 0);

        assert!(matches!(
            FmapHeader::from_bytes(&bytes[..FMAP_HEADER_LEN - 1], 0),
            Err(Error::TruncatedData { needed: FMAP_HEADER_LEN, .. })
        ));
        assert!(matches!(
            FmapHeader::from_bytes(&bytes, usize::MAX),
            Err(Error::TruncatedData { .. })
        ));

        bytes[8] = 2;
        assert_eq!(
            FmapHeader::from_bytes(&bytes, 0),
            Err(Error::IncompatibleVersion { major: 2, minor: 1 })
        );

        bytes[8] = 1;
        bytes[9] = 2;
        assert_eq!(
            FmapHeader::from_bytes(&bytes, 0),
            Err(Error::IncompatibleVersion { major: 1, minor: 2 })
        );

        bytes[0] = b'X';
        assert_eq!(
            FmapHeader::from_bytes(&bytes, 0),
            Err(Error::InvalidSignature { offset: 0 })
        );
    }

    #[test]
    fn test_name_field() -> Result<(), Error> {
        let field = name_to_field(b"bootblock")?;
        assert_eq!(&field[..9], b"bootblock");
        assert_eq!(name_from_field(&field), b"bootblock");

        // exactly 32 bytes fits without a terminator
        let full = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ012345";
        assert_eq!(name_from_field(&name_to_field(full)?), full);

        assert_eq!(
            name_to_field(b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456"),
            Err(Error::NameTooLong { len: 33, max: FMAP_STRLEN })
        );

        // only trailing padding is dropped
        let mut field = [0u8; FMAP_STRLEN];
        field[..7].copy_from_slice(b"ab\0cd\0\0");
        assert_eq!(name_from_field(&field), b"ab\0cd");

        assert_eq!(name_from_field(&[0u8; FMAP_STRLEN]), b"");

        Ok(())
    }

    #[test]
    fn test_non_utf8_name() -> Result<(), Error> {
        // 20 printable bytes then 0xff filling the rest of the field
        let mut name = vec![b'A'; 20];
        name.extend([0xff; 12]);

        let mut bytes = Vec::new();
        FmapHeader::create(1, 1, 0, 0x1000, name.clone(), 0).write_to(&mut bytes)?;

        let header = FmapHeader::from_bytes(&bytes, 0)?;
        assert_eq!(header.name_bytes(), name.as_slice());
        assert!(header.name().starts_with("AAAA"));
        assert!(header.name().ends_with('\u{fffd}'));

        let mut again = Vec::new();
        header.write_to(&mut again)?;
        assert_eq!(again, bytes);

        assert!(matches!(
            header.check_name("AAAAAAAAAAAAAAAAAAAA"),
            Err(Error::NameMismatch { .. })
        ));

        Ok(())
    }

    #[test]
    fn test_reader_bounds() {
        let blob = vec![0u8; 16];
        assert!(Reader::record(&blob, 8, 8).is_ok());
        assert_eq!(
            Reader::record(&blob, 9, 8).err(),
            Some(Error::TruncatedData {
                offset: 9,
                needed: 8,
                available: 16
            })
        );
    }
}
