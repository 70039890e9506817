//! # memtext
//!
//! A small synchronous client for the memcached ASCII text protocol:
//! - One connection to one server, TCP or unix domain socket
//! - get/gets/set/add/replace/append/prepend/cas/delete/stats/version
//! - Strict request/response framing, no pipelining
//! - Sticky per-connection error flag
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Connection                            │
//! │          (public API, closed + sticky error state)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │    Codec    │          │  Transport  │
//!   │ (line/block)│          │ (TCP / UDS) │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use memtext::Connection;
//!
//! let mut conn = Connection::connect(&["127.0.0.1:11211"])?;
//! conn.set("greeting", 0, 0, b"hello")?;
//! let item = conn.get("greeting")?;
//! assert_eq!(item.value, b"hello");
//! # Ok::<(), memtext::MemcacheError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{MemcacheError, Result};
pub use config::Config;
pub use network::{Address, Connection};
pub use protocol::{FetchResult, MAX_VALUE_SIZE};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of memtext
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
