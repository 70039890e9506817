//! Network Module
//!
//! Client side of the connection to a memcached server.
//!
//! ## Architecture
//! - `Address` picks TCP or unix socket from the address string
//! - `Transport` owns the buffered socket
//! - `Connection` runs one request/response exchange per call

mod address;
mod transport;
mod connection;

pub use address::{choose_address, Address};
pub use transport::Transport;
pub use connection::Connection;
