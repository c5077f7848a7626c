/// Value + string structure for flag conversions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValStr<'a> {
    /// Field value
    val: u16,
    /// Field description
    string: &'a str,
}

impl<'a> ValStr<'a> {
    pub const fn create(val: u16, string: &'a str) -> Self {
        Self { val, string }
    }

    pub fn match_val(&self, val: u16) -> Option<&'a str> {
        if self.val == val {
            return Some(self.string);
        }

        None
    }

    pub fn value(&self) -> u16 {
        self.val
    }

    pub fn string(&self) -> &'a str {
        self.string
    }
}

/// val2str_default  -  convert value to string
///
/// returns the string of the matching entry, or `def_str` if none matches
pub fn val2str_default<'a>(val: u16, vs: &[ValStr<'a>], def_str: &'a str) -> &'a str {
    vs.iter()
        .find_map(|v| v.match_val(val))
        .unwrap_or(def_str)
}

/// val2str  -  convert value to string
///
/// returns "Unknown" if no entry matches
pub fn val2str<'a>(val: u16, vs: &[ValStr<'a>]) -> &'a str {
    val2str_default(val, vs, "Unknown")
}

/// str2val  -  convert string to value
///
/// returns `None` if no entry carries `string`
pub fn str2val(string: &str, vs: &[ValStr]) -> Option<u16> {
    vs.iter().find(|v| v.string == string).map(ValStr::value)
}
