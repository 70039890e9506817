//! Shared test servers
//!
//! - `ScriptedServer`: answers each request with the next canned reply and
//!   records what it received
//! - `FakeMemcached`: a tiny in-memory server speaking enough of the text
//!   protocol to exercise every client operation

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
#[cfg(unix)]
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tempfile::TempDir;

// =============================================================================
// Request framing (server side)
// =============================================================================

const STORE_VERBS: [&str; 6] = ["set", "add", "replace", "append", "prepend", "cas"];

/// Read one full request: the command line plus, for storage commands,
/// the data block. Returns None on EOF.
fn read_request<R: BufRead>(reader: &mut R) -> Option<(String, Vec<u8>, Vec<u8>)> {
    let mut raw = Vec::new();
    let n = reader.read_until(b'\n', &mut raw).ok()?;
    if n == 0 {
        return None;
    }

    let line = String::from_utf8_lossy(&raw)
        .trim_end_matches(&['\r', '\n'][..])
        .to_string();

    let mut data = Vec::new();
    let parts: Vec<&str> = line.split(' ').collect();
    if STORE_VERBS.contains(&parts[0]) && parts.len() >= 5 {
        let len: usize = parts[4].parse().ok()?;
        let mut block = vec![0u8; len + 2];
        reader.read_exact(&mut block).ok()?;
        raw.extend_from_slice(&block);
        block.truncate(len);
        data = block;
    }

    Some((line, data, raw))
}

// =============================================================================
// Scripted server
// =============================================================================

/// Replies to requests with a fixed script over TCP
pub struct ScriptedServer {
    pub addr: String,
    handle: JoinHandle<Vec<Vec<u8>>>,
}

impl ScriptedServer {
    /// Serve exactly one connection. Each request gets the next reply and
    /// the server hangs up after the last one (or on the first request if
    /// the script is empty).
    pub fn start(replies: Vec<&'static [u8]>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            let mut received = Vec::new();
            let mut replies = replies.into_iter().peekable();

            while let Some((_, _, raw)) = read_request(&mut reader) {
                received.push(raw);
                let Some(reply) = replies.next() else { break };
                if writer.write_all(reply).is_err() || replies.peek().is_none() {
                    // Script exhausted: hang up so the client sees EOF
                    break;
                }
            }
            received
        });

        Self { addr, handle }
    }

    /// Wait for the client to disconnect and return every request received
    pub fn requests(self) -> Vec<Vec<u8>> {
        self.handle.join().unwrap()
    }
}

// =============================================================================
// Fake memcached
// =============================================================================

struct Item {
    value: Vec<u8>,
    flags: u16,
    cas: u64,
    expires: Option<Instant>,
}

#[derive(Default)]
struct Store {
    items: HashMap<String, Item>,
    next_cas: u64,
}

impl Store {
    fn live(&mut self, key: &str) -> Option<&Item> {
        let expired = match self.items.get(key) {
            Some(item) => item.expires.map_or(false, |at| Instant::now() >= at),
            None => return None,
        };
        if expired {
            self.items.remove(key);
            return None;
        }
        self.items.get(key)
    }

    fn put(&mut self, key: &str, value: Vec<u8>, flags: u16, exptime: u64) {
        self.next_cas += 1;
        let expires = if exptime > 0 {
            Some(Instant::now() + Duration::from_secs(exptime))
        } else {
            None
        };
        self.items.insert(
            key.to_string(),
            Item {
                value,
                flags,
                cas: self.next_cas,
                expires,
            },
        );
    }

    fn handle(&mut self, line: &str, data: Vec<u8>) -> Vec<u8> {
        let parts: Vec<&str> = line.split(' ').collect();
        match parts.as_slice() {
            [verb @ ("get" | "gets"), key] => {
                let mut out = Vec::new();
                if let Some(item) = self.live(key) {
                    let header = if *verb == "gets" {
                        format!("VALUE {} {} {} {}\r\n", key, item.flags, item.value.len(), item.cas)
                    } else {
                        format!("VALUE {} {} {}\r\n", key, item.flags, item.value.len())
                    };
                    out.extend_from_slice(header.as_bytes());
                    out.extend_from_slice(&item.value);
                    out.extend_from_slice(b"\r\n");
                }
                out.extend_from_slice(b"END\r\n");
                out
            }
            [verb, key, flags, exptime, _len, rest @ ..] if STORE_VERBS.contains(verb) => {
                let (flags, exptime) = match (flags.parse::<u16>(), exptime.parse::<u64>()) {
                    (Ok(f), Ok(e)) => (f, e),
                    _ => return b"CLIENT_ERROR bad command line format\r\n".to_vec(),
                };
                self.store(verb, key, flags, exptime, data, rest.first().copied())
            }
            ["delete", key] => {
                if self.live(key).is_some() {
                    self.items.remove(*key);
                    b"DELETED\r\n".to_vec()
                } else {
                    b"NOT_FOUND\r\n".to_vec()
                }
            }
            ["stats"] => format!(
                "STAT pid 4242\r\nSTAT curr_items {}\r\nSTAT total_items {}\r\nEND\r\n",
                self.items.len(),
                self.next_cas
            )
            .into_bytes(),
            ["stats", "slabs"] => {
                b"STAT active_slabs 1\r\nSTAT total_malloced 1048576\r\nEND\r\n".to_vec()
            }
            ["version"] => b"VERSION 1.6.21\r\n".to_vec(),
            _ => b"ERROR\r\n".to_vec(),
        }
    }

    fn store(
        &mut self,
        verb: &str,
        key: &str,
        flags: u16,
        exptime: u64,
        data: Vec<u8>,
        cas: Option<&str>,
    ) -> Vec<u8> {
        let existing = self.live(key).map(|item| (item.value.clone(), item.flags, item.cas));
        let stored = b"STORED\r\n".to_vec();
        let not_stored = b"NOT_STORED\r\n".to_vec();

        match (verb, existing) {
            ("set", _) => {
                self.put(key, data, flags, exptime);
                stored
            }
            ("add", Some(_)) | ("replace", None) | ("append", None) | ("prepend", None) => {
                not_stored
            }
            ("add", None) | ("replace", Some(_)) => {
                self.put(key, data, flags, exptime);
                stored
            }
            ("append", Some((mut value, old_flags, _))) => {
                value.extend_from_slice(&data);
                self.put(key, value, old_flags, 0);
                stored
            }
            ("prepend", Some((value, old_flags, _))) => {
                let mut joined = data;
                joined.extend_from_slice(&value);
                self.put(key, joined, old_flags, 0);
                stored
            }
            ("cas", None) => b"NOT_FOUND\r\n".to_vec(),
            ("cas", Some((_, _, current))) => match cas.and_then(|c| c.parse::<u64>().ok()) {
                Some(token) if token == current => {
                    self.put(key, data, flags, exptime);
                    stored
                }
                Some(_) => b"EXISTS\r\n".to_vec(),
                None => b"ERROR\r\n".to_vec(),
            },
            _ => b"ERROR\r\n".to_vec(),
        }
    }
}

fn serve<S: Read + Write>(stream: S, reader: impl Read, store: Arc<Mutex<Store>>) {
    let mut writer = stream;
    let mut reader = BufReader::new(reader);
    while let Some((line, data, _)) = read_request(&mut reader) {
        let reply = store.lock().unwrap().handle(&line, data);
        if writer.write_all(&reply).is_err() {
            break;
        }
    }
}

/// In-memory memcached listening on TCP and, on unix, a socket file
pub struct FakeMemcached {
    pub tcp_addr: String,
    pub unix_path: Option<PathBuf>,
    _dir: TempDir,
}

impl FakeMemcached {
    pub fn start() -> Self {
        let store = Arc::new(Mutex::new(Store::default()));
        let dir = TempDir::new().unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let tcp_addr = listener.local_addr().unwrap().to_string();
        let tcp_store = Arc::clone(&store);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let store = Arc::clone(&tcp_store);
                thread::spawn(move || {
                    let reader = stream.try_clone().unwrap();
                    serve(stream, reader, store);
                });
            }
        });

        #[cfg(unix)]
        let unix_path = {
            let path = dir.path().join("memc.sock");
            let listener = UnixListener::bind(&path).unwrap();
            let unix_store = Arc::clone(&store);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { break };
                    let store = Arc::clone(&unix_store);
                    thread::spawn(move || {
                        let reader = stream.try_clone().unwrap();
                        serve(stream, reader, store);
                    });
                }
            });
            Some(path)
        };
        #[cfg(not(unix))]
        let unix_path = None;

        Self {
            tcp_addr,
            unix_path,
            _dir: dir,
        }
    }
}
