//! Command definitions
//!
//! Typed requests sent to the server.

/// Storage verbs: every one of them carries a value block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreVerb {
    Set,
    Add,
    Replace,
    Append,
    Prepend,
    Cas,
}

impl StoreVerb {
    /// Verb as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreVerb::Set => "set",
            StoreVerb::Add => "add",
            StoreVerb::Replace => "replace",
            StoreVerb::Append => "append",
            StoreVerb::Prepend => "prepend",
            StoreVerb::Cas => "cas",
        }
    }
}

/// Retrieval verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalVerb {
    Get,
    /// Like `get`, but the reply carries the cas token
    Gets,
}

impl RetrievalVerb {
    /// Verb as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalVerb::Get => "get",
            RetrievalVerb::Gets => "gets",
        }
    }
}

/// A request to the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch a single key
    Retrieval { verb: RetrievalVerb, key: String },

    /// Store a value. `cas` of 0 means no cas field is sent.
    Store {
        verb: StoreVerb,
        key: String,
        flags: u16,
        exptime: u64,
        value: Vec<u8>,
        cas: u64,
    },

    /// Delete a key
    Delete { key: String },

    /// Statistics, optionally for a sub-group such as `slabs`
    Stats { argument: Option<String> },

    /// Server version
    Version,
}

impl Command {
    /// Build a storage command
    pub fn store(
        verb: StoreVerb,
        key: impl Into<String>,
        flags: u16,
        exptime: u64,
        value: impl Into<Vec<u8>>,
        cas: u64,
    ) -> Self {
        Command::Store {
            verb,
            key: key.into(),
            flags,
            exptime,
            value: value.into(),
            cas,
        }
    }

    /// Build a stats command; an empty argument means plain `stats`
    pub fn stats(argument: &str) -> Self {
        let argument = if argument.is_empty() {
            None
        } else {
            Some(argument.to_string())
        };
        Command::Stats { argument }
    }

    /// Verb name, used for logging
    pub fn name(&self) -> &'static str {
        match self {
            Command::Retrieval { verb, .. } => verb.as_str(),
            Command::Store { verb, .. } => verb.as_str(),
            Command::Delete { .. } => "delete",
            Command::Stats { .. } => "stats",
            Command::Version => "version",
        }
    }
}
