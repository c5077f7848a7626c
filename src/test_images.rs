//! Hand-assembled images shared by the unit tests.

use crate::{Error, Fmap, FMAP_STRLEN};
use alloc::vec::Vec;

pub const EXAMPLE_FMAP_OFFSET: usize = 512;

fn name_field(name: &[u8]) -> [u8; FMAP_STRLEN] {
    let mut field = [0u8; FMAP_STRLEN];
    field[..name.len()].copy_from_slice(name);
    field
}

pub fn raw_header(
    major: u8,
    minor: u8,
    base: u64,
    size: u32,
    name: impl AsRef<[u8]>,
    nareas: u16,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"__FMAP__");
    out.push(major);
    out.push(minor);
    out.extend_from_slice(&base.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&name_field(name.as_ref()));
    out.extend_from_slice(&nareas.to_le_bytes());
    out
}

pub fn raw_area(offset: u32, size: u32, name: impl AsRef<[u8]>, flags: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(&name_field(name.as_ref()));
    out.extend_from_slice(&flags.to_le_bytes());
    out
}

/// The FMAP bytes of the 1024 byte "example" image.
pub fn example_fmap_bytes() -> Vec<u8> {
    let mut out = raw_header(1, 0, 0, 1024, "example", 4);
    out.extend(raw_area(0, 128, "bootblock", 1));
    out.extend(raw_area(128, 128, "normal", 3));
    out.extend(raw_area(256, 256, "fallback", 3));
    out.extend(raw_area(512, 512, "data", 0));
    out
}

/// 1024 byte image with filler data and its FMAP at offset 512.
pub fn example_image() -> Vec<u8> {
    let mut image: Vec<u8> = (0..1024u32).map(|i| (i % 251) as u8).collect();
    let fmap = example_fmap_bytes();
    image[EXAMPLE_FMAP_OFFSET..EXAMPLE_FMAP_OFFSET + fmap.len()].copy_from_slice(&fmap);
    image
}

/// The structure every decode of [`example_image`] must produce.
pub fn example_fmap() -> Result<Fmap, Error> {
    let mut fmap = Fmap::create(0, 1024, "example")?;
    fmap.set_version_minor(0)?;
    fmap.append_area(0, 128, "bootblock", 1)?;
    fmap.append_area(128, 128, "normal", 3)?;
    fmap.append_area(256, 256, "fallback", 3)?;
    fmap.append_area(512, 512, "data", 0)?;
    Ok(fmap)
}
