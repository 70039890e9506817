//! Transport
//!
//! Buffered duplex byte stream to one server, over TCP or a unix socket.

use std::io::{self, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crate::config::Config;
use crate::error::{MemcacheError, Result};
use crate::protocol::{self, Command, FetchResult};

use super::Address;

/// Raw socket behind the buffers
enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Stream {
    fn try_clone(&self) -> io::Result<Self> {
        match self {
            Stream::Tcp(s) => s.try_clone().map(Stream::Tcp),
            #[cfg(unix)]
            Stream::Unix(s) => s.try_clone().map(Stream::Unix),
        }
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.set_read_timeout(timeout),
            #[cfg(unix)]
            Stream::Unix(s) => s.set_read_timeout(timeout),
        }
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.set_write_timeout(timeout),
            #[cfg(unix)]
            Stream::Unix(s) => s.set_write_timeout(timeout),
        }
    }

    fn shutdown(&self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Stream::Unix(s) => s.shutdown(Shutdown::Both),
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.read(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.write(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.flush(),
            #[cfg(unix)]
            Stream::Unix(s) => s.flush(),
        }
    }
}

/// A connected, buffered byte channel
///
/// Reads and writes go through separate buffers over cloned handles of the
/// same socket. Nothing is buffered across requests: every `send` flushes.
pub struct Transport {
    /// Socket reader (buffered for efficiency)
    reader: BufReader<Stream>,

    /// Socket writer (buffered for efficiency)
    writer: BufWriter<Stream>,
}

impl Transport {
    /// Open a transport to the given address
    ///
    /// Any failure here is reported as a connect error.
    pub fn open(address: &Address, config: &Config) -> Result<Self> {
        Self::open_stream(address, config)
            .map_err(|e| MemcacheError::Connect(format!("{}: {}", address, e)))
    }

    fn open_stream(address: &Address, config: &Config) -> io::Result<Self> {
        let stream = match address {
            Address::Tcp(addr) => {
                let stream = TcpStream::connect(addr.as_str())?;
                stream.set_nodelay(config.tcp_nodelay)?;
                Stream::Tcp(stream)
            }
            #[cfg(unix)]
            Address::Unix(path) => Stream::Unix(UnixStream::connect(path)?),
            #[cfg(not(unix))]
            Address::Unix(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "unix sockets are not available on this platform",
                ))
            }
        };

        if config.read_timeout_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(config.read_timeout_ms)))?;
        }
        if config.write_timeout_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(config.write_timeout_ms)))?;
        }

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Write a command and flush it
    pub fn send(&mut self, command: &Command) -> Result<()> {
        protocol::write_command(&mut self.writer, command)
    }

    /// Read one reply line
    pub fn read_line(&mut self) -> Result<String> {
        protocol::read_line(&mut self.reader)
    }

    /// Read a full `get`/`gets` reply
    pub fn read_fetch_reply(&mut self) -> Result<FetchResult> {
        protocol::read_fetch_reply(&mut self.reader)
    }

    /// Read a full `stats` reply
    pub fn read_stats_reply(&mut self) -> Result<Vec<u8>> {
        protocol::read_stats_reply(&mut self.reader)
    }

    /// Shut the socket down in both directions
    pub fn close(self) {
        if let Err(e) = self.writer.get_ref().shutdown() {
            tracing::debug!("Error shutting down socket: {}", e);
        }
    }
}
