use alloc::string::String;
use thiserror::Error;

/// Errors produced while locating, decoding or encoding an FMAP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid FMAP signature at offset {offset:#x}")]
    InvalidSignature { offset: usize },
    #[error("incompatible FMAP version {major}.{minor}")]
    IncompatibleVersion { major: u8, minor: u8 },
    #[error("incorrect FMAP (found: \"{found}\", expected: \"{expected}\")")]
    NameMismatch { found: String, expected: String },
    #[error("truncated data: need {needed} bytes at offset {offset:#x}, blob is {available} bytes")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("no valid FMAP signatures")]
    NoValidHeader,
    #[error("name is {len} bytes, limit is {max}")]
    NameTooLong { len: usize, max: usize },
    #[error("area name must not be empty")]
    EmptyName,
    #[error("too many areas, limit is {max}")]
    TooManyAreas { max: usize },
    #[error("area {index} ({offset:#x}+{size:#x}) lies outside the {image_len:#x} byte image")]
    AreaOutOfBounds {
        index: usize,
        offset: u32,
        size: u32,
        image_len: usize,
    },
    #[error("malformed key/value text: \"{0}\"")]
    MalformedKv(String),
    #[error("missing key \"{0}\"")]
    MissingKey(&'static str),
    #[error("invalid value for \"{key}\": \"{value}\"")]
    InvalidValue { key: &'static str, value: String },
    #[error("expected {expected} area lines, found {found}")]
    AreaCountMismatch { expected: usize, found: usize },
}
