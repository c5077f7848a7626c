//! Build a flash map from its key/value text form.
//!
//! The first non-empty line holds the `fmap_*` header keys, every following
//! line the `area_*` keys of one area, as produced by [`Fmap::to_kv_lists`].

use crate::kv_list::{signature_hex, KvList};
use crate::layout::version_supported;
use crate::valstr::str2val;
use crate::{Error, Fmap, FmapArea, FLAG_LUT};
use alloc::{string::String, vec::Vec};

fn malformed(line: &str) -> Error {
    Error::MalformedKv(String::from(line))
}

/// Split the leading `key="value"` pair off `line`.
///
/// returns `(key, value, remainder)`, or `None` once only whitespace is left
pub fn next_pair(line: &str) -> Result<Option<(&str, &str, &str)>, Error> {
    let line = line.trim_start();
    if line.is_empty() {
        return Ok(None);
    }

    let (key, rest) = line.split_once('=').ok_or_else(|| malformed(line))?;
    if key.is_empty() || key.contains(char::is_whitespace) {
        return Err(malformed(line));
    }

    let rest = rest.strip_prefix('"').ok_or_else(|| malformed(line))?;
    let (value, rest) = rest.split_once('"').ok_or_else(|| malformed(line))?;

    Ok(Some((key, value, rest)))
}

/// Parse every pair on `line`.
pub fn parse_line(line: &str) -> Result<KvList, Error> {
    let mut kv = KvList::new();
    let mut rest = line;

    while let Some((key, value, tail)) = next_pair(rest)? {
        kv.add(key, value)?;
        rest = tail;
    }

    Ok(kv)
}

/// ASCII to unsigned integer, decimal or `0x` prefixed hexadecimal.
pub fn parse_number(key: &'static str, value: &str) -> Result<u64, Error> {
    let (digits, radix) = match value.get(..2) {
        Some("0x") | Some("0X") => (&value[2..], 16),
        _ => (value, 10),
    };

    u64::from_str_radix(digits, radix).map_err(|_| Error::InvalidValue {
        key,
        value: String::from(value),
    })
}

/// Raw name bytes from their text form, undoing `\xNN` escapes.
pub fn parse_name(key: &'static str, value: &str) -> Result<Vec<u8>, Error> {
    let invalid = || Error::InvalidValue {
        key,
        value: String::from(value),
    };

    let mut name = Vec::with_capacity(value.len());
    let mut rest = value.as_bytes();

    while let Some((&b, tail)) = rest.split_first() {
        if b != b'\\' {
            name.push(b);
            rest = tail;
            continue;
        }

        let hex = tail
            .strip_prefix(b"x")
            .and_then(|t| t.get(..2))
            .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
            .ok_or_else(invalid)?;
        let hex = core::str::from_utf8(hex).map_err(|_| invalid())?;
        name.push(u8::from_str_radix(hex, 16).map_err(|_| invalid())?);
        rest = &tail[3..];
    }

    Ok(name)
}

/// Translate comma separated flag names into a bitmap.
pub fn parse_flags(value: &str) -> Result<u16, Error> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .try_fold(0u16, |flags, name| {
            let bit = str2val(name, &FLAG_LUT).ok_or_else(|| Error::InvalidValue {
                key: "area_flags",
                value: String::from(value),
            })?;
            Ok(flags | bit)
        })
}

fn required<'a>(kv: &'a KvList, key: &'static str) -> Result<&'a str, Error> {
    kv.find_value(key).ok_or(Error::MissingKey(key))
}

fn number<T: TryFrom<u64>>(kv: &KvList, key: &'static str) -> Result<T, Error> {
    let value = required(kv, key)?;

    T::try_from(parse_number(key, value)?).map_err(|_| Error::InvalidValue {
        key,
        value: String::from(value),
    })
}

impl Fmap {
    /// Parse a header line, returning the map and its declared area count.
    pub fn parse_header(line: &str) -> Result<(Self, usize), Error> {
        let kv = parse_line(line)?;

        let signature = required(&kv, "fmap_signature")?;
        if !signature.eq_ignore_ascii_case(&signature_hex()) {
            return Err(Error::InvalidValue {
                key: "fmap_signature",
                value: String::from(signature),
            });
        }

        let ver_major: u8 = number(&kv, "fmap_ver_major")?;
        let ver_minor: u8 = number(&kv, "fmap_ver_minor")?;
        if !version_supported(ver_major, ver_minor) {
            return Err(Error::IncompatibleVersion {
                major: ver_major,
                minor: ver_minor,
            });
        }

        let mut fmap = Fmap::create(
            number(&kv, "fmap_base")?,
            number(&kv, "fmap_size")?,
            parse_name("fmap_name", required(&kv, "fmap_name")?)?,
        )?;
        fmap.ver_major = ver_major;
        fmap.ver_minor = ver_minor;

        let nareas: u16 = number(&kv, "fmap_nareas")?;

        Ok((fmap, nareas as usize))
    }

    /// Parse the whole key/value text: header line then one line per area.
    pub fn from_kv_str(text: &str) -> Result<Self, Error> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let header = lines.next().ok_or(Error::MissingKey("fmap_signature"))?;
        let (mut fmap, nareas) = Self::parse_header(header)?;

        for line in lines {
            fmap.push_area(FmapArea::parse(line)?)?;
        }

        if fmap.area_count() != nareas {
            return Err(Error::AreaCountMismatch {
                expected: nareas,
                found: fmap.area_count(),
            });
        }

        Ok(fmap)
    }
}

impl FmapArea {
    /// Parse one area line. The raw flags value wins over the flag names.
    pub fn parse(line: &str) -> Result<Self, Error> {
        let kv = parse_line(line)?;

        let flags = match kv.find_value("area_flags_raw") {
            Some(_) => number(&kv, "area_flags_raw")?,
            None => parse_flags(required(&kv, "area_flags")?)?,
        };

        FmapArea::create(
            number(&kv, "area_offset")?,
            number(&kv, "area_size")?,
            parse_name("area_name", required(&kv, "area_name")?)?,
            flags,
        )
    }
}
