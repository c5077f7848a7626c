use crate::layout::{name_from_field, name_to_field, Reader};
use crate::valstr::{val2str, ValStr};
use crate::{Error, FMAP_AREA_LEN};
use alloc::{borrow::Cow, collections::BTreeSet, string::String, vec::Vec};
use bitflags::bitflags;

bitflags! {
    /// Known area property bits. Other bits are kept in the raw value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AreaFlags: u16 {
        const STATIC = 1 << 0;
        const COMPRESSED = 1 << 1;
    }
}

pub const FLAG_LUT: [ValStr<'static>; 2] = [
    ValStr::create(AreaFlags::STATIC.bits(), "static"),
    ValStr::create(AreaFlags::COMPRESSED.bits(), "compressed"),
];

/// Named region of the flash described by an FMAP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FmapArea {
    /// Offset relative to base
    offset: u32,
    /// Size in bytes
    size: u32,
    /// Descriptive name, raw bytes without padding
    name: Vec<u8>,
    /// Raw flags, including bits without a name
    flags: u16,
}

impl FmapArea {
    /// Build an area for encoding. Unnamed areas are rejected.
    pub fn create(
        offset: u32,
        size: u32,
        name: impl AsRef<[u8]>,
        flags: u16,
    ) -> Result<Self, Error> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        name_to_field(name)?;

        Ok(Self {
            offset,
            size,
            name: name.to_vec(),
            flags,
        })
    }

    /// Decode the area record stored at `offset` in `blob`.
    pub fn from_bytes(blob: &[u8], offset: usize) -> Result<Self, Error> {
        let mut rd = Reader::record(blob, offset, FMAP_AREA_LEN)?;

        Ok(Self {
            offset: rd.u32(),
            size: rd.u32(),
            name: name_from_field(&rd.array()),
            flags: rd.u16(),
        })
    }

    /// Append the 42 byte wire form to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        let name = name_to_field(&self.name)?;

        out.extend_from_slice(&self.offset.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(&name);
        out.extend_from_slice(&self.flags.to_le_bytes());

        Ok(())
    }

    /// Symbolic names of the known flags set on this area.
    pub fn flag_names(&self) -> BTreeSet<&'static str> {
        FLAG_LUT
            .iter()
            .filter(|lut| self.flags & lut.value() != 0)
            .map(|lut| lut.string())
            .collect()
    }

    /// Comma separated flag names in bit order, unknown bits as "Unknown".
    pub fn flags_to_string(&self) -> String {
        let mut string = String::new();
        let mut flags = self.flags;

        for i in 0..u16::BITS {
            if flags == 0 {
                break;
            }

            let bit = 1u16 << i;
            if flags & bit != 0 {
                string.push_str(val2str(bit, &FLAG_LUT));

                flags &= !bit;
                if flags != 0 {
                    string.push(',');
                }
            }
        }

        string
    }

    pub fn offset(&self) -> u32 {
        self.offset
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

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn area_flags(&self) -> AreaFlags {
        AreaFlags::from_bits_truncate(self.flags)
    }

    pub fn is_static(&self) -> bool {
        self.area_flags().contains(AreaFlags::STATIC)
    }

    pub fn set_offset(&mut self, offset: u32) {
        self.offset = offset;
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    pub fn set_flags(&mut self, flags: u16) {
        self.flags = flags;
    }

    /// Exclusive end of the area relative to base.
    pub(crate) fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }
}
