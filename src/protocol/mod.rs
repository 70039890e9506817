//! Protocol Module
//!
//! Defines the memcached text protocol as spoken by the client.
//!
//! ## Framing
//! Every request and every reply line ends in `\r\n`. Storage requests and
//! retrieval replies carry a data block whose length is announced on the
//! preceding line; the block is followed by its own `\r\n`.
//!
//! ### Commands
//! - `get`, `gets`: fetch one key
//! - `set`, `add`, `replace`, `append`, `prepend`, `cas`: store a value
//! - `delete`: remove a key
//! - `stats`: server statistics, optionally a sub-group
//! - `version`: server version
//!
//! ### Faults
//! Any reply line containing `ERROR` is a server fault. Lines that do not
//! match the expected grammar are protocol faults.

mod command;
mod response;
mod codec;

pub use command::{Command, RetrievalVerb, StoreVerb};
pub use response::{FetchResult, StatsLine, ValueHeader};
pub use codec::{
    classify_stats_line, encode_command, parse_delete_reply, parse_store_reply,
    parse_value_header, parse_version_reply, read_fetch_reply, read_line, read_stats_reply,
    read_value_block, write_command, CRLF, MAX_LINE_LENGTH, MAX_VALUE_SIZE,
};
