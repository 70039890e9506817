//! Server addresses
//!
//! Parsing of address strings and the random pick among candidates.

use std::fmt;
use std::path::PathBuf;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{MemcacheError, Result};

/// Where a memcached server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    /// `host:port`
    Tcp(String),

    /// Filesystem path of a unix domain socket
    Unix(PathBuf),
}

impl Address {
    /// Parse an address string
    ///
    /// Anything containing a `/` is treated as a socket path.
    pub fn parse(address: &str) -> Result<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(MemcacheError::Connect("empty address".to_string()));
        }
        if address.contains('/') {
            Ok(Address::Unix(PathBuf::from(address)))
        } else {
            Ok(Address::Tcp(address.to_string()))
        }
    }

    pub fn is_unix(&self) -> bool {
        matches!(self, Address::Unix(_))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Tcp(addr) => write!(f, "{}", addr),
            Address::Unix(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Pick one candidate uniformly at random
///
/// This is a single draw: the other candidates are never tried.
pub fn choose_address<'a, S, R>(addresses: &'a [S], rng: &mut R) -> Result<&'a str>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    addresses
        .choose(rng)
        .map(|address| address.as_ref())
        .ok_or_else(|| MemcacheError::Connect("no addresses supplied".to_string()))
}
