//! Key/value rendering of a flash map, one `key="value"` line per record.

use crate::{Error, Fmap, FmapArea, FMAP_SIGNATURE};
use alloc::{format, string::String, vec::Vec};
use core::fmt;

pub const KV_MAX_VALUE_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    key: String,
    value: String,
}

impl KvPair {
    pub fn create(key: &str, value: &str) -> Result<Self, Error> {
        let bad_key = key.is_empty()
            || key.contains(|c: char| c == '=' || c == '"' || c.is_whitespace());
        if bad_key || value.contains('"') || value.len() > KV_MAX_VALUE_LEN {
            return Err(Error::MalformedKv(format!("{key}=\"{value}\"")));
        }

        Ok(Self {
            key: String::from(key),
            value: String::from(value),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KvList {
    list: Vec<KvPair>,
}

impl KvList {
    pub const fn new() -> Self {
        Self { list: Vec::new() }
    }

    pub fn create(key: &str, value: &str) -> Result<Self, Error> {
        let mut kv = Self::new();
        kv.add(key, value)?;
        Ok(kv)
    }

    pub fn add(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.list.push(KvPair::create(key, value)?);

        Ok(())
    }

    /// Unchecked append for values rendered by this crate. Names must go
    /// through [`escape_name`] first.
    fn push(&mut self, key: &str, value: String) {
        debug_assert!(!value.contains('"'));
        self.list.push(KvPair {
            key: String::from(key),
            value,
        });
    }

    /// Value of the first pair with `key`.
    pub fn find_value(&self, key: &str) -> Option<&str> {
        self.list
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| kv.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KvPair> {
        self.list.iter()
    }
}

impl fmt::Display for KvList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kv) in self.list.iter().enumerate() {
            if i != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}=\"{}\"", kv.key, kv.value)?;
        }

        Ok(())
    }
}

/// `0x` followed by each signature byte in order.
pub(crate) fn signature_hex() -> String {
    FMAP_SIGNATURE
        .iter()
        .fold(String::from("0x"), |s, b| s + &format!("{b:02x}"))
}

/// Text form of a raw name.
///
/// Printable ASCII is kept as is, except `"` and `\`. Those and every other
/// byte are written as `\xNN`, so the result never ends a quoted value early
/// and maps back to the exact bytes.
pub fn escape_name(name: &[u8]) -> String {
    let mut string = String::with_capacity(name.len());

    for &b in name {
        if (0x20..=0x7e).contains(&b) && b != b'"' && b != b'\\' {
            string.push(char::from(b));
        } else {
            string.push_str(&format!("\\x{b:02x}"));
        }
    }

    string
}

impl FmapArea {
    pub fn to_kv_list(&self) -> KvList {
        let mut kv = KvList::new();

        kv.push("area_offset", format!("0x{:08x}", self.offset()));
        kv.push("area_size", format!("0x{:08x}", self.size()));
        kv.push("area_name", escape_name(self.name_bytes()));
        kv.push("area_flags_raw", format!("0x{:02x}", self.flags()));
        // descriptive strings rather than the field
        kv.push("area_flags", self.flags_to_string());

        kv
    }
}

impl Fmap {
    /// Header list followed by one list per area.
    pub fn to_kv_lists(&self) -> Vec<KvList> {
        let mut lists = Vec::with_capacity(self.area_count() + 1);

        let mut kv = KvList::new();
        kv.push("fmap_signature", signature_hex());
        kv.push("fmap_ver_major", format!("{}", self.version_major()));
        kv.push("fmap_ver_minor", format!("{}", self.version_minor()));
        kv.push("fmap_base", format!("0x{:016x}", self.base()));
        kv.push("fmap_size", format!("0x{:04x}", self.size()));
        kv.push("fmap_name", escape_name(self.name_bytes()));
        kv.push("fmap_nareas", format!("{}", self.area_count()));
        lists.push(kv);

        lists.extend(self.areas().iter().map(FmapArea::to_kv_list));

        lists
    }
}

impl fmt::Display for Fmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for kv in self.to_kv_lists() {
            writeln!(f, "{kv}")?;
        }

        Ok(())
    }
}
