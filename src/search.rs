//! Locating an FMAP header at an unknown offset.
//!
//! Firmware images can carry the `__FMAP__` signature as incidental data, or
//! even hold more than one structurally valid header. Producers place the
//! real FMAP at a large power-of-two aligned offset, so [`find_header`]
//! tries coarse alignments before fine ones and accepts the first candidate
//! that validates. [`find_header_linear`] is the plain forward scan.
//!
//! The aligned offsets never include 0. Whole images that begin with their
//! FMAP are handled by [`find_header_or_start`], which tries offset 0 last.

use crate::{Error, FmapHeader, FMAP_HEADER_LEN, FMAP_SEARCH_STRIDE, FMAP_SIGNATURE};
use log::{debug, trace};

/// How to locate the header when no offset is given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Search {
    /// Stride-doubling search, coarse alignments first
    #[default]
    Aligned,
    /// First valid signature from the start of the blob
    Linear,
    /// Stride-doubling search, then offset 0
    AlignedOrStart,
}

impl Search {
    pub fn find(
        self,
        blob: &[u8],
        expected_name: Option<&str>,
    ) -> Result<(usize, FmapHeader), Error> {
        match self {
            Search::Aligned => find_header(blob, expected_name),
            Search::Linear => find_header_linear(blob, expected_name),
            Search::AlignedOrStart => find_header_or_start(blob, expected_name),
        }
    }
}

/// Candidate bookkeeping shared by both strategies.
struct Candidates<'a, 'b> {
    blob: &'a [u8],
    expected_name: Option<&'b str>,
    mismatch: Option<Error>,
}

impl<'a, 'b> Candidates<'a, 'b> {
    fn new(blob: &'a [u8], expected_name: Option<&'b str>) -> Self {
        Self {
            blob,
            expected_name,
            mismatch: None,
        }
    }

    fn check(&mut self, offset: usize) -> Option<FmapHeader> {
        if !self.blob[offset..].starts_with(FMAP_SIGNATURE) {
            return None;
        }

        let header = FmapHeader::from_bytes(self.blob, offset).and_then(|header| {
            if let Some(name) = self.expected_name {
                header.check_name(name)?;
            }
            Ok(header)
        });

        match header {
            Ok(header) => {
                debug!("found FMAP \"{}\" at {offset:#x}", header.name());
                Some(header)
            }
            Err(err) => {
                debug!("continue searching FMAP after {offset:#x}: {err}");
                if matches!(err, Error::NameMismatch { .. }) && self.mismatch.is_none() {
                    self.mismatch = Some(err);
                }
                None
            }
        }
    }

    /// A rejected name is reported over a bare "not found".
    fn exhausted(self) -> Error {
        self.mismatch.unwrap_or(Error::NoValidHeader)
    }
}

/// Largest power-of-two multiple of the search stride that is <= `lim`.
fn start_alignment(lim: usize) -> Option<usize> {
    if lim < FMAP_SEARCH_STRIDE {
        return None;
    }

    let mut align = FMAP_SEARCH_STRIDE;
    while align <= lim / 2 {
        align *= 2;
    }

    Some(align)
}

/// Stride-doubling search.
///
/// At each alignment only the odd multiples are tried, since the even ones
/// were already covered by the previous (coarser) level. Every candidate
/// offset is therefore visited at most once. Offset 0 is never tried.
pub fn find_header(
    blob: &[u8],
    expected_name: Option<&str>,
) -> Result<(usize, FmapHeader), Error> {
    aligned_search(blob, expected_name, false)
}

/// [`find_header`], falling back to offset 0 once every aligned candidate
/// has been rejected.
pub fn find_header_or_start(
    blob: &[u8],
    expected_name: Option<&str>,
) -> Result<(usize, FmapHeader), Error> {
    aligned_search(blob, expected_name, true)
}

fn aligned_search(
    blob: &[u8],
    expected_name: Option<&str>,
    with_start: bool,
) -> Result<(usize, FmapHeader), Error> {
    let mut candidates = Candidates::new(blob, expected_name);

    let Some(lim) = blob.len().checked_sub(FMAP_HEADER_LEN) else {
        return Err(candidates.exhausted());
    };
    let mut align = start_alignment(lim).unwrap_or(0);

    while align >= FMAP_SEARCH_STRIDE {
        trace!("searching FMAP at {align:#x} alignment");

        for offset in (align..=lim).step_by(align.saturating_mul(2)) {
            if let Some(header) = candidates.check(offset) {
                return Ok((offset, header));
            }
        }

        align /= 2;
    }

    if with_start {
        if let Some(header) = candidates.check(0) {
            return Ok((0, header));
        }
    }

    Err(candidates.exhausted())
}

/// Brute force linear search
pub fn find_header_linear(
    blob: &[u8],
    expected_name: Option<&str>,
) -> Result<(usize, FmapHeader), Error> {
    let mut candidates = Candidates::new(blob, expected_name);

    let Some(lim) = blob.len().checked_sub(FMAP_HEADER_LEN) else {
        return Err(candidates.exhausted());
    };

    for offset in 0..=lim {
        if let Some(header) = candidates.check(offset) {
            return Ok((offset, header));
        }
    }

    Err(candidates.exhausted())
}
