use crate::{Error, Fmap};
use log::warn;
use sha2::{Digest, Sha256};

pub const CSUM_LEN: usize = 32;

/// get_csum - get the checksum of static regions of an image
///
/// The FMAP is located with [`Fmap::find`], then every area flagged
/// static is fed to the digest in map order. Area offsets are taken as
/// offsets into `image`.
///
/// Uses SHA256 rather than SHA1 because SHA1 is cryptographically broken.
pub fn get_csum(image: &[u8]) -> Result<[u8; CSUM_LEN], Error> {
    let fmap = Fmap::find(image)?;

    let mut hasher = Sha256::new();

    for (index, area) in fmap.areas().iter().enumerate() {
        // skip non-static areas
        if !area.is_static() {
            continue;
        }

        // sanity check the offset
        if area.end() > image.len() as u64 {
            warn!("invalid parameter detected in area {index} \"{}\"", area.name());
            return Err(Error::AreaOutOfBounds {
                index,
                offset: area.offset(),
                size: area.size(),
                image_len: image.len(),
            });
        }

        let offset = area.offset() as usize;
        let size = area.size() as usize;
        hasher.update(&image[offset..offset + size]);
    }

    let mut digest = [0u8; CSUM_LEN];
    digest.copy_from_slice(&hasher.finalize());

    Ok(digest)
}
