//! Protocol codec
//!
//! Encoding and decoding functions for the memcached text protocol.
//!
//! ## Wire Format
//!
//! ### Requests
//! ```text
//! <verb> <key> <flags> <exptime> <bytes>[ <cas>]\r\n<data>\r\n   storage
//! <get|gets> <key>\r\n                                          retrieval
//! delete <key>\r\n
//! stats[ <argument>]\r\n
//! version\r\n
//! ```
//!
//! ### Replies
//! ```text
//! STORED | NOT_STORED | EXISTS | NOT_FOUND                      storage
//! [VALUE <key> <flags> <bytes>[ <cas>]\r\n<data>\r\n]END\r\n     retrieval
//! DELETED | NOT_FOUND                                           delete
//! (STAT <name> <value>\r\n)* END\r\n                            stats
//! VERSION <version>\r\n                                         version
//! ERROR | CLIENT_ERROR <msg> | SERVER_ERROR <msg>               any
//! ```
//!
//! The line parsers take a line with its terminator already removed and
//! never touch I/O. The stream helpers at the bottom glue them to a
//! `BufRead`/`Write` pair.

use std::io::{self, BufRead, Read, Write};
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};

use super::{Command, FetchResult, StatsLine, ValueHeader};
use crate::error::{MemcacheError, Result};

/// Line terminator used throughout the protocol
pub const CRLF: &[u8] = b"\r\n";

/// Largest value the client will send (1,000,000 bytes).
///
/// Slightly below the server's default 1 MB item limit. Larger values are
/// refused locally without contacting the server.
pub const MAX_VALUE_SIZE: usize = 1_000_000;

/// Longest reply line accepted, terminator excluded
pub const MAX_LINE_LENGTH: usize = 4096;

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode a command into a single wire frame
pub fn encode_command(command: &Command) -> Bytes {
    match command {
        Command::Retrieval { verb, key } => encode_line(&format!("{} {}", verb.as_str(), key)),
        Command::Store {
            verb,
            key,
            flags,
            exptime,
            value,
            cas,
        } => {
            let header = if *cas != 0 {
                format!(
                    "{} {} {} {} {} {}\r\n",
                    verb.as_str(),
                    key,
                    flags,
                    exptime,
                    value.len(),
                    cas
                )
            } else {
                format!(
                    "{} {} {} {} {}\r\n",
                    verb.as_str(),
                    key,
                    flags,
                    exptime,
                    value.len()
                )
            };

            let mut frame = BytesMut::with_capacity(header.len() + value.len() + CRLF.len());
            frame.put_slice(header.as_bytes());
            frame.put_slice(value);
            frame.put_slice(CRLF);
            frame.freeze()
        }
        Command::Delete { key } => encode_line(&format!("delete {}", key)),
        Command::Stats { argument: Some(argument) } => {
            encode_line(&format!("stats {}", argument))
        }
        Command::Stats { argument: None } => encode_line("stats"),
        Command::Version => encode_line("version"),
    }
}

fn encode_line(line: &str) -> Bytes {
    let mut frame = BytesMut::with_capacity(line.len() + CRLF.len());
    frame.put_slice(line.as_bytes());
    frame.put_slice(CRLF);
    frame.freeze()
}

// =============================================================================
// Reply Line Parsing
// =============================================================================

/// Any reply line mentioning `ERROR` (ERROR, CLIENT_ERROR, SERVER_ERROR)
fn is_error_line(line: &str) -> bool {
    line.contains("ERROR")
}

/// Parse the reply to a storage command
///
/// `STORED` is success; anything else that is not an error (`NOT_STORED`,
/// `EXISTS`, `NOT_FOUND`) means the value was not stored.
pub fn parse_store_reply(line: &str) -> Result<bool> {
    if is_error_line(line) {
        return Err(MemcacheError::Server(line.to_string()));
    }
    Ok(line.starts_with("STORED"))
}

/// Parse the reply to a delete command
pub fn parse_delete_reply(line: &str) -> Result<bool> {
    if is_error_line(line) {
        return Err(MemcacheError::Server(line.to_string()));
    }
    Ok(line.starts_with("DELETED"))
}

/// Parse the reply to a version command, returning the version string
pub fn parse_version_reply(line: &str) -> Result<String> {
    if is_error_line(line) {
        return Err(MemcacheError::Server(line.to_string()));
    }
    match line.strip_prefix("VERSION ") {
        Some(version) => Ok(version.trim_end().to_string()),
        None => Err(MemcacheError::Protocol(line.to_string())),
    }
}

/// Classify one line of a stats reply
pub fn classify_stats_line(line: &str) -> Result<StatsLine<'_>> {
    if line.starts_with("END") {
        return Ok(StatsLine::End);
    }
    if is_error_line(line) {
        return Err(MemcacheError::Server(line.to_string()));
    }
    Ok(StatsLine::Line(line))
}

/// Parse a `VALUE <key> <flags> <bytes>[ <cas>]` header line
pub fn parse_value_header(line: &str) -> Result<ValueHeader> {
    let fields: Vec<&str> = line.split(' ').collect();

    if fields[0] != "VALUE" || fields.len() < 4 || fields.len() > 5 {
        return Err(MemcacheError::Protocol(line.to_string()));
    }

    let flags = parse_number::<u16>(fields[2], "flags", line)?;
    let length = parse_number::<usize>(fields[3], "length", line)?;
    let cas = match fields.get(4) {
        Some(field) => Some(parse_number::<u64>(field, "cas", line)?),
        None => None,
    };

    Ok(ValueHeader {
        key: fields[1].to_string(),
        flags,
        length,
        cas,
    })
}

/// Parse an unsigned decimal field
///
/// `FromStr` accepts a leading `+`, which is not valid on the wire, so the
/// digits are checked first. Overflow is reported by `parse`.
fn parse_number<T: FromStr>(field: &str, what: &str, line: &str) -> Result<T> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MemcacheError::Protocol(format!(
            "invalid {} {:?} in {:?}",
            what, field, line
        )));
    }
    field.parse::<T>().map_err(|_| {
        MemcacheError::Protocol(format!("{} {:?} out of range in {:?}", what, field, line))
    })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a command to a stream and flush it
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let frame = encode_command(command);
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Read one reply line, without its `\r\n` (a bare `\n` is tolerated)
///
/// Blocks until a full line is available. EOF before the newline is an I/O
/// error; a line longer than `MAX_LINE_LENGTH` is a protocol error.
pub fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let limit = (MAX_LINE_LENGTH + CRLF.len()) as u64;
    let mut buf = Vec::new();
    reader.by_ref().take(limit).read_until(b'\n', &mut buf)?;

    if buf.last() != Some(&b'\n') {
        if buf.len() as u64 >= limit {
            return Err(MemcacheError::Protocol(format!(
                "reply line longer than {} bytes",
                MAX_LINE_LENGTH
            )));
        }
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "connection closed while reading reply line",
        )
        .into());
    }

    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    let line = String::from_utf8(buf)
        .map_err(|_| MemcacheError::Protocol("reply line is not valid UTF-8".to_string()))?;
    tracing::trace!("<< {}", line);
    Ok(line)
}

/// Read a `length`-byte data block plus its trailing `\r\n`
pub fn read_value_block<R: Read>(reader: &mut R, length: usize) -> Result<Vec<u8>> {
    let total = length
        .checked_add(CRLF.len())
        .ok_or_else(|| MemcacheError::Protocol(format!("value length {} overflows", length)))?;

    // Grow with the data actually received instead of trusting the header
    let mut block = Vec::new();
    reader.by_ref().take(total as u64).read_to_end(&mut block)?;
    if block.len() != total {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("value block truncated: expected {} bytes, got {}", total, block.len()),
        )
        .into());
    }

    if &block[length..] != CRLF {
        return Err(MemcacheError::Protocol(
            "value block not terminated by \\r\\n".to_string(),
        ));
    }
    block.truncate(length);
    Ok(block)
}

/// Read the complete reply to `get`/`gets`
///
/// The terminating line must begin with `END` whether or not a value came
/// first. A miss yields `FetchResult::default()`.
pub fn read_fetch_reply<R: BufRead>(reader: &mut R) -> Result<FetchResult> {
    let mut line = read_line(reader)?;
    let mut result = FetchResult::default();

    if line.starts_with("VALUE") {
        let header = parse_value_header(&line)?;
        result.value = read_value_block(reader, header.length)?;
        result.flags = header.flags;
        result.cas = header.cas.unwrap_or(0);
        line = read_line(reader)?;
    }

    if !line.starts_with("END") {
        if is_error_line(&line) {
            return Err(MemcacheError::Server(line));
        }
        return Err(MemcacheError::Protocol(line));
    }
    Ok(result)
}

/// Read the complete reply to `stats`
///
/// Every line before `END` is kept verbatim followed by `\n`.
pub fn read_stats_reply<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    loop {
        let line = read_line(reader)?;
        match classify_stats_line(&line)? {
            StatsLine::End => return Ok(result),
            StatsLine::Line(text) => {
                result.extend_from_slice(text.as_bytes());
                result.push(b'\n');
            }
        }
    }
}
