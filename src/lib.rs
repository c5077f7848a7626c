//! Decoder and encoder for FMAP, the flash map descriptor embedded in
//! firmware images.
//!
//! An FMAP is a 56 byte header followed by `nareas` packed 42 byte area
//! records, all little-endian. [`decode`] reads one from a blob, either at a
//! known offset or by searching for it, and [`encode`] produces the exact
//! wire bytes of a structure.

#![no_std]

extern crate alloc;

pub mod area;
pub mod csum;
pub mod input_interactive;
pub mod input_kv_pair;
pub mod kv_list;
pub mod layout;
pub mod search;
pub mod valstr;

mod error;
#[cfg(test)]
mod test_images;

pub use area::{AreaFlags, FmapArea, FLAG_LUT};
pub use csum::get_csum;
pub use error::Error;
pub use layout::FmapHeader;
pub use search::Search;

use alloc::{borrow::Cow, string::String, vec::Vec};
use layout::{name_to_field, version_supported};
use log::debug;

pub const FMAP_SIGNATURE_LEN: usize = 8;
pub const FMAP_SIGNATURE: &[u8; FMAP_SIGNATURE_LEN] = b"__FMAP__";
pub const FMAP_VER_MAJOR: u8 = 1;
pub const FMAP_VER_MINOR_MIN: u8 = 0;
pub const FMAP_VER_MINOR_MAX: u8 = 1;
pub const FMAP_STRLEN: usize = 32;
pub const FMAP_HEADER_LEN: usize = 56;
pub const FMAP_AREA_LEN: usize = 42;
pub const FMAP_SEARCH_STRIDE: usize = 4;

/// Decoded flash map: header fields plus the areas in wire order.
///
/// The area count is not stored; it is always the length of `areas`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fmap {
    /// Major version
    ver_major: u8,
    /// Minor version
    ver_minor: u8,
    /// Address of the firmware binary
    base: u64,
    /// Size of the firmware binary in bytes
    size: u32,
    /// Name of this firmware binary, raw bytes without padding
    name: Vec<u8>,
    /// Fmap areas
    areas: Vec<FmapArea>,
}

impl Fmap {
    /// Create an empty map at the newest supported version.
    pub fn create(base: u64, size: u32, name: impl AsRef<[u8]>) -> Result<Self, Error> {
        let name = name.as_ref();
        name_to_field(name)?;

        Ok(Self {
            ver_major: FMAP_VER_MAJOR,
            ver_minor: FMAP_VER_MINOR_MAX,
            base,
            size,
            name: name.to_vec(),
            areas: Vec::new(),
        })
    }

    /// Decode the FMAP in `blob`.
    ///
    /// With `offset` the header must start exactly there, otherwise it is
    /// located with the aligned [`Search`]. With `expected_name` only a map of
    /// that name is accepted.
    pub fn decode(
        blob: &[u8],
        offset: Option<usize>,
        expected_name: Option<&str>,
    ) -> Result<Self, Error> {
        Self::decode_with(blob, offset, expected_name, Search::default())
    }

    /// [`Fmap::decode`] with an explicit search strategy for the offset-less case.
    pub fn decode_with(
        blob: &[u8],
        offset: Option<usize>,
        expected_name: Option<&str>,
        search: Search,
    ) -> Result<Self, Error> {
        let (offset, header) = match offset {
            Some(offset) => {
                let header = FmapHeader::from_bytes(blob, offset)?;
                if let Some(name) = expected_name {
                    header.check_name(name)?;
                }
                (offset, header)
            }
            None => search.find(blob, expected_name)?,
        };

        Self::read_areas(blob, offset, header)
    }

    fn read_areas(blob: &[u8], offset: usize, header: FmapHeader) -> Result<Self, Error> {
        let nareas = header.area_count() as usize;
        let mut areas = Vec::with_capacity(nareas);
        let mut idx = offset + FMAP_HEADER_LEN;

        for _ in 0..nareas {
            areas.push(FmapArea::from_bytes(blob, idx)?);
            idx += FMAP_AREA_LEN;
        }

        debug!(
            "decoded FMAP \"{}\" at {offset:#x} with {nareas} areas",
            header.name()
        );

        Ok(Self {
            ver_major: header.version_major(),
            ver_minor: header.version_minor(),
            base: header.base(),
            size: header.size(),
            name: header.into_name(),
            areas,
        })
    }

    /// Decode a map that starts at the first byte of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::decode(bytes, Some(0), None)
    }

    /// Search `image` for its FMAP, including a map at the very start.
    pub fn find(image: &[u8]) -> Result<Self, Error> {
        Self::decode_with(image, None, None, Search::AlignedOrStart)
    }

    /// Header record as it would be written, with the area count taken from
    /// the areas.
    pub fn header(&self) -> Result<FmapHeader, Error> {
        let nareas = u16::try_from(self.areas.len()).map_err(|_| Error::TooManyAreas {
            max: u16::MAX as usize,
        })?;

        Ok(FmapHeader::create(
            self.ver_major,
            self.ver_minor,
            self.base,
            self.size,
            self.name.clone(),
            nareas,
        ))
    }

    /// Serialize to the packed wire form: header followed by every area.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut ret = Vec::with_capacity(self.encoded_len());

        self.header()?.write_to(&mut ret)?;
        for area in self.areas.iter() {
            area.write_to(&mut ret)?;
        }

        Ok(ret)
    }

    /// Number of bytes [`Fmap::to_bytes`] produces.
    pub fn encoded_len(&self) -> usize {
        FMAP_HEADER_LEN + self.areas.len() * FMAP_AREA_LEN
    }

    pub fn signature(&self) -> &'static [u8; FMAP_SIGNATURE_LEN] {
        FMAP_SIGNATURE
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

    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    pub fn areas(&self) -> &[FmapArea] {
        &self.areas
    }

    /// Areas for in-place editing before re-encoding.
    pub fn areas_mut(&mut self) -> &mut [FmapArea] {
        &mut self.areas
    }

    pub fn set_base(&mut self, base: u64) {
        self.base = base;
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    pub fn set_version_minor(&mut self, minor: u8) -> Result<(), Error> {
        if !version_supported(self.ver_major, minor) {
            return Err(Error::IncompatibleVersion {
                major: self.ver_major,
                minor,
            });
        }

        self.ver_minor = minor;
        Ok(())
    }

    pub(crate) fn push_area(&mut self, area: FmapArea) -> Result<(), Error> {
        if self.areas.len() >= u16::MAX as usize {
            return Err(Error::TooManyAreas {
                max: u16::MAX as usize,
            });
        }

        self.areas.push(area);
        Ok(())
    }

    /// Append a named area, returning the new encoded length.
    pub fn append_area(
        &mut self,
        offset: u32,
        size: u32,
        name: impl AsRef<[u8]>,
        flags: u16,
    ) -> Result<usize, Error> {
        self.push_area(FmapArea::create(offset, size, name, flags)?)?;
        Ok(self.encoded_len())
    }

    /// First area called `name`.
    pub fn find_area(&self, name: &str) -> Option<&FmapArea> {
        if name.is_empty() {
            return None;
        }

        self.areas
            .iter()
            .find(|area| area.name_bytes() == name.as_bytes())
    }
}

/// Decode the FMAP in `blob`, see [`Fmap::decode`].
pub fn decode(
    blob: &[u8],
    offset: Option<usize>,
    expected_name: Option<&str>,
) -> Result<Fmap, Error> {
    Fmap::decode(blob, offset, expected_name)
}

/// Encode `fmap` to its wire form, see [`Fmap::to_bytes`].
pub fn encode(fmap: &Fmap) -> Result<Vec<u8>, Error> {
    fmap.to_bytes()
}
