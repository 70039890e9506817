//! Configuration for memtext
//!
//! Centralized client configuration with sensible defaults.

/// Main configuration for a memtext connection
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Server Selection
    // -------------------------------------------------------------------------
    /// Candidate server addresses. One is picked at random per connect.
    /// Entries containing `/` are unix socket paths, the rest are host:port.
    pub addresses: Vec<String>,

    // -------------------------------------------------------------------------
    // Socket Configuration
    // -------------------------------------------------------------------------
    /// Read timeout in milliseconds (0 = block indefinitely)
    pub read_timeout_ms: u64,

    /// Write timeout in milliseconds (0 = block indefinitely)
    pub write_timeout_ms: u64,

    /// Disable Nagle's algorithm on TCP connections
    pub tcp_nodelay: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addresses: vec!["127.0.0.1:11211".to_string()],
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            tcp_nodelay: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Replace the candidate address list
    pub fn addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.config.tcp_nodelay = nodelay;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
