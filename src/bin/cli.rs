//! memtext CLI Client
//!
//! Issues a single command against a memcached server and prints the reply.

use std::io::Write;

use clap::{Args as ClapArgs, Parser, Subcommand};
use memtext::{Config, Connection, MemcacheError};
use tracing_subscriber::{fmt, EnvFilter};

/// memtext CLI
#[derive(Parser, Debug)]
#[command(name = "memtext-cli")]
#[command(about = "CLI for memcached text protocol servers")]
#[command(version)]
struct Args {
    /// Server address (host:port or socket path); repeat to pick one at random
    #[arg(short, long = "server", default_value = "127.0.0.1:11211")]
    servers: Vec<String>,

    /// Read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments shared by the storage commands
#[derive(ClapArgs, Debug)]
struct StoreArgs {
    /// The key to store
    key: String,

    /// The value to store
    value: String,

    /// Client flags
    #[arg(short, long, default_value = "0")]
    flags: u16,

    /// Expiration time in seconds (0 = never)
    #[arg(short, long, default_value = "0")]
    exptime: u64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Get a value and its cas token
    Gets {
        /// The key to get
        key: String,
    },

    /// Store a value
    Set(StoreArgs),

    /// Store a value if the key does not exist
    Add(StoreArgs),

    /// Store a value if the key exists
    Replace(StoreArgs),

    /// Append to an existing value
    Append(StoreArgs),

    /// Prepend to an existing value
    Prepend(StoreArgs),

    /// Store a value if the cas token still matches
    Cas {
        #[command(flatten)]
        store: StoreArgs,

        /// Token returned by `gets`
        cas: u64,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// Print server statistics
    Stats {
        /// Statistics group, e.g. `slabs` or `items`
        #[arg(default_value = "")]
        argument: String,
    },

    /// Print the server version
    Version,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,memtext=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .addresses(args.servers)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let mut conn = match Connection::with_config(config) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Failed to connect: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = run(&mut conn, args.command);
    conn.close();

    if let Err(e) = outcome {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(conn: &mut Connection, command: Commands) -> Result<(), MemcacheError> {
    let mut out = std::io::stdout().lock();

    match command {
        Commands::Get { key } => {
            let item = conn.get(&key)?;
            out.write_all(&item.value)?;
            writeln!(out)?;
            tracing::info!("flags={}", item.flags);
        }
        Commands::Gets { key } => {
            let item = conn.gets(&key)?;
            out.write_all(&item.value)?;
            writeln!(out)?;
            tracing::info!("flags={} cas={}", item.flags, item.cas);
        }
        Commands::Set(a) => {
            let stored = conn.set(&a.key, a.flags, a.exptime, a.value.as_bytes())?;
            report(&mut out, stored)?;
        }
        Commands::Add(a) => {
            let stored = conn.add(&a.key, a.flags, a.exptime, a.value.as_bytes())?;
            report(&mut out, stored)?;
        }
        Commands::Replace(a) => {
            let stored = conn.replace(&a.key, a.flags, a.exptime, a.value.as_bytes())?;
            report(&mut out, stored)?;
        }
        Commands::Append(a) => {
            let stored = conn.append(&a.key, a.flags, a.exptime, a.value.as_bytes())?;
            report(&mut out, stored)?;
        }
        Commands::Prepend(a) => {
            let stored = conn.prepend(&a.key, a.flags, a.exptime, a.value.as_bytes())?;
            report(&mut out, stored)?;
        }
        Commands::Cas { store: a, cas } => {
            let stored = conn.cas(&a.key, a.flags, a.exptime, a.value.as_bytes(), cas)?;
            report(&mut out, stored)?;
        }
        Commands::Delete { key } => {
            let deleted = conn.delete(&key)?;
            writeln!(out, "{}", if deleted { "DELETED" } else { "NOT_FOUND" })?;
        }
        Commands::Stats { argument } => {
            out.write_all(&conn.stats(&argument)?)?;
        }
        Commands::Version => writeln!(out, "{}", conn.version()?)?,
    }

    out.flush()?;
    Ok(())
}

fn report<W: Write>(out: &mut W, stored: bool) -> std::io::Result<()> {
    writeln!(out, "{}", if stored { "STORED" } else { "NOT_STORED" })
}
