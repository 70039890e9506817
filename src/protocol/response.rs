//! Response definitions
//!
//! Typed replies decoded from the server.

/// Result of a `get` or `gets`
///
/// A miss is the default value: empty value, zero flags, zero cas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    /// Value bytes (empty on a miss)
    pub value: Vec<u8>,

    /// Client flags stored alongside the value
    pub flags: u16,

    /// Cas token, only non-zero for `gets`
    pub cas: u64,
}

impl FetchResult {
    /// Returns true if this represents a cache miss.
    ///
    /// Note that a stored empty value with zero flags looks the same.
    pub fn is_miss(&self) -> bool {
        self.value.is_empty() && self.flags == 0 && self.cas == 0
    }
}

/// Parsed `VALUE <key> <flags> <bytes> [<cas>]` header line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueHeader {
    pub key: String,
    pub flags: u16,
    /// Length of the data block, excluding its trailing `\r\n`
    pub length: usize,
    pub cas: Option<u64>,
}

/// Classification of one line of a `stats` reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsLine<'a> {
    /// A line to keep, verbatim
    Line(&'a str),

    /// The `END` terminator
    End,
}
