//! Client Connection
//!
//! One synchronous connection to one memcached server.

use crate::config::Config;
use crate::error::{MemcacheError, Result};
use crate::protocol::{
    parse_delete_reply, parse_store_reply, parse_version_reply, Command, FetchResult,
    RetrievalVerb, StoreVerb, MAX_VALUE_SIZE,
};

use super::{choose_address, Address, Transport};

/// A connection to a single memcached server
///
/// ## State
/// - `transport` is `None` once the connection is closed. Every operation
///   after `close()` fails with `MemcacheError::Closed`.
/// - `has_error` is sticky: the first failed operation sets it and nothing
///   clears it. It does not block further calls; callers use it to decide
///   whether to discard the connection.
///
/// Methods take `&mut self`, one request is in flight at a time. Share a
/// connection between threads only behind a lock.
pub struct Connection {
    /// Buffered socket, `None` after close
    transport: Option<Transport>,

    /// Server this connection was opened to
    address: Address,

    /// Set by any failed operation, never cleared
    has_error: bool,
}

impl Connection {
    /// Connect to one server picked at random from `addresses`
    pub fn connect<S: AsRef<str>>(addresses: &[S]) -> Result<Self> {
        let config = Config::builder()
            .addresses(addresses.iter().map(|a| a.as_ref().to_string()))
            .build();
        Self::with_config(config)
    }

    /// Connect using an explicit configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let chosen = choose_address(&config.addresses, &mut rand::thread_rng())?;
        let address = Address::parse(chosen)?;
        tracing::info!("Memcache address is {}", address);

        let transport = Transport::open(&address, &config)?;

        Ok(Self {
            transport: Some(transport),
            address,
            has_error: false,
        })
    }

    /// Close the connection, releasing the socket
    ///
    /// Closing twice is harmless.
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.close();
            tracing::debug!("Connection to {} closed", self.address);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// Whether any operation on this connection has failed
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// The server this connection talks to
    pub fn address(&self) -> &Address {
        &self.address
    }

    // =========================================================================
    // Retrieval
    // =========================================================================

    /// Fetch a value. A miss is an empty value with zero flags.
    pub fn get(&mut self, key: &str) -> Result<FetchResult> {
        let mut result = self.fetch(RetrievalVerb::Get, key)?;
        result.cas = 0;
        Ok(result)
    }

    /// Fetch a value together with its cas token
    pub fn gets(&mut self, key: &str) -> Result<FetchResult> {
        self.fetch(RetrievalVerb::Gets, key)
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Store a value unconditionally
    pub fn set(&mut self, key: &str, flags: u16, exptime: u64, value: &[u8]) -> Result<bool> {
        self.store(StoreVerb::Set, key, flags, exptime, value, 0)
    }

    /// Store a value only if the key is absent
    pub fn add(&mut self, key: &str, flags: u16, exptime: u64, value: &[u8]) -> Result<bool> {
        self.store(StoreVerb::Add, key, flags, exptime, value, 0)
    }

    /// Store a value only if the key already exists
    pub fn replace(&mut self, key: &str, flags: u16, exptime: u64, value: &[u8]) -> Result<bool> {
        self.store(StoreVerb::Replace, key, flags, exptime, value, 0)
    }

    /// Append bytes to an existing value
    pub fn append(&mut self, key: &str, flags: u16, exptime: u64, value: &[u8]) -> Result<bool> {
        self.store(StoreVerb::Append, key, flags, exptime, value, 0)
    }

    /// Prepend bytes to an existing value
    pub fn prepend(&mut self, key: &str, flags: u16, exptime: u64, value: &[u8]) -> Result<bool> {
        self.store(StoreVerb::Prepend, key, flags, exptime, value, 0)
    }

    /// Store a value only if it has not changed since `cas` was read with `gets`
    pub fn cas(
        &mut self,
        key: &str,
        flags: u16,
        exptime: u64,
        value: &[u8],
        cas: u64,
    ) -> Result<bool> {
        self.store(StoreVerb::Cas, key, flags, exptime, value, cas)
    }

    // =========================================================================
    // Other commands
    // =========================================================================

    /// Delete a key. Returns false if it was not there.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        let command = Command::Delete {
            key: key.to_string(),
        };
        self.execute(&command, |transport| {
            let line = transport.read_line()?;
            parse_delete_reply(&line)
        })
    }

    /// Raw statistics lines, each followed by `\n`, without the `END` line
    ///
    /// An empty `argument` sends plain `stats`.
    pub fn stats(&mut self, argument: &str) -> Result<Vec<u8>> {
        let command = Command::stats(argument);
        self.execute(&command, |transport| transport.read_stats_reply())
    }

    /// Server version string
    pub fn version(&mut self) -> Result<String> {
        self.execute(&Command::Version, |transport| {
            let line = transport.read_line()?;
            parse_version_reply(&line)
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn fetch(&mut self, verb: RetrievalVerb, key: &str) -> Result<FetchResult> {
        let command = Command::Retrieval {
            verb,
            key: key.to_string(),
        };
        self.execute(&command, |transport| transport.read_fetch_reply())
    }

    fn store(
        &mut self,
        verb: StoreVerb,
        key: &str,
        flags: u16,
        exptime: u64,
        value: &[u8],
        cas: u64,
    ) -> Result<bool> {
        if self.is_closed() {
            return self.fail(MemcacheError::Closed);
        }
        if value.len() > MAX_VALUE_SIZE {
            tracing::debug!(
                "Refusing to {} {}: {} bytes exceeds {}",
                verb.as_str(),
                key,
                value.len(),
                MAX_VALUE_SIZE
            );
            return Ok(false);
        }

        let command = Command::store(verb, key, flags, exptime, value, cas);
        self.execute(&command, |transport| {
            let line = transport.read_line()?;
            parse_store_reply(&line)
        })
    }

    /// Send `command`, read its reply with `read_reply`, and record failures
    ///
    /// This is the single place where the sticky error flag is set.
    fn execute<T, F>(&mut self, command: &Command, read_reply: F) -> Result<T>
    where
        F: FnOnce(&mut Transport) -> Result<T>,
    {
        let Some(transport) = self.transport.as_mut() else {
            return self.fail(MemcacheError::Closed);
        };

        tracing::debug!("Sending {} to {}", command.name(), self.address);

        let outcome = transport.send(command).and_then(|()| read_reply(transport));
        match outcome {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("{} failed on {}: {}", command.name(), self.address, e);
                self.fail(e)
            }
        }
    }

    fn fail<T>(&mut self, error: MemcacheError) -> Result<T> {
        self.has_error = true;
        Err(error)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.address)
            .field("closed", &self.is_closed())
            .field("has_error", &self.has_error)
            .finish()
    }
}
