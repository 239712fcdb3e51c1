//! Connection multiplexer implementation.
//!
//! Tracks which connections currently claim each local address so several
//! logical connections can share one socket.
//!
//! ```text
//! conn A (udp 0.0.0.0:4433) ─┐
//! conn B (udp 0.0.0.0:4433) ─┼─> ConnMultiplexer ─> "udp 0.0.0.0:4433" => [A, B]
//! conn C (udp 0.0.0.0:5000) ─┘                      "udp 0.0.0.0:5000" => [C]
//! ```
//!
//! The whole table sits behind one mutex. Adds and removes for different
//! addresses serialize against each other; registration is rare compared to
//! traffic and each critical section only walks one address's list.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::addr::{ConnKey, ListenAddr};
use crate::conn::{key_of, same_conn, ConnHandle};
use crate::error::{MuxError, Result};
use crate::metrics;

/// Default number of addresses the table is sized for.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

static GLOBAL: OnceLock<ConnMultiplexer> = OnceLock::new();

/// Multiplexer configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MultiplexerConfig {
    /// Number of addresses to pre-allocate room for (default: 16)
    pub initial_capacity: usize,
    /// Log a warning when a handle is registered while already present
    /// under the same address (default: true). The handle is appended either way.
    pub warn_on_duplicate: bool,
}

impl Default for MultiplexerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            warn_on_duplicate: true,
        }
    }
}

/// Registration capability handed to socket-owning components.
pub trait Multiplexer: Send + Sync {
    /// Register a connection under its local address.
    fn add_conn(&self, conn: ConnHandle);

    /// Deregister a previously registered connection.
    fn remove_conn(&self, conn: &ConnHandle) -> Result<()>;
}

#[derive(Default)]
struct Table {
    conns: HashMap<ConnKey, Vec<ConnHandle>>,
    /// Sum of all list lengths in `conns`
    total: usize,
}

/// Registry of connections sharing local addresses.
///
/// Either construct one with [`ConnMultiplexer::new`] and pass it down to the
/// components that open sockets, or use the process-wide [`global`] instance.
pub struct ConnMultiplexer {
    table: Mutex<Table>,
    config: MultiplexerConfig,
}

/// The process-wide multiplexer.
///
/// Built on first call with the default configuration; every caller, on any
/// thread, gets the same instance.
pub fn global() -> &'static ConnMultiplexer {
    GLOBAL.get_or_init(ConnMultiplexer::new)
}

impl ConnMultiplexer {
    /// Create an empty multiplexer with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MultiplexerConfig::default())
    }

    /// Create an empty multiplexer with a custom configuration.
    pub fn with_config(config: MultiplexerConfig) -> Self {
        info!(
            initial_capacity = config.initial_capacity,
            "Creating connection multiplexer"
        );
        Self {
            table: Mutex::new(Table {
                conns: HashMap::with_capacity(config.initial_capacity),
                total: 0,
            }),
            config,
        }
    }

    pub fn config(&self) -> &MultiplexerConfig {
        &self.config
    }

    /// Lock the table.
    ///
    /// Every mutation leaves the table consistent before it can panic, so a
    /// poisoned lock is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a connection under the key derived from its local address.
    ///
    /// Never fails. Registering the same handle twice stores it twice, and it
    /// then takes two removals to clear.
    #[instrument(skip_all, fields(key = tracing::field::Empty))]
    pub fn add_conn(&self, conn: ConnHandle) {
        let key = key_of(&conn);
        tracing::Span::current().record("key", tracing::field::display(&key));

        let (duplicate, shared_with, addresses, connections) = {
            let mut table = self.lock();
            let conns = table.conns.entry(key).or_default();
            let duplicate = conns.iter().any(|c| same_conn(c, &conn));
            conns.push(conn);
            let shared_with = conns.len() - 1;
            table.total += 1;
            (duplicate, shared_with, table.conns.len(), table.total)
        };

        if duplicate && self.config.warn_on_duplicate {
            warn!("Connection registered twice under the same address");
        }
        debug!(shared_with, "Registered connection");
        metrics::record_table_size(addresses, connections);
    }

    /// Deregister a connection.
    ///
    /// Removes the first entry identical to `conn` under its address, keeping
    /// the order of the others. An address whose last connection goes away is
    /// dropped from the table.
    ///
    /// Fails with [`MuxError::UnknownConnection`] if nothing is registered
    /// under the address, and with [`MuxError::ConnectionNotFound`] if other
    /// connections are but this one is not.
    #[instrument(skip_all, fields(key = tracing::field::Empty))]
    pub fn remove_conn(&self, conn: &ConnHandle) -> Result<()> {
        let key = key_of(conn);
        tracing::Span::current().record("key", tracing::field::display(&key));

        let (result, addresses, connections) = {
            let mut table = self.lock();
            let result = remove_from(&mut table, key, conn);
            (result, table.conns.len(), table.total)
        };

        match &result {
            Ok(()) => {
                debug!("Unregistered connection");
                metrics::record_table_size(addresses, connections);
            }
            Err(e) => {
                debug!(error = %e, "Connection was not registered");
                metrics::record_remove_failure(e.kind());
            }
        }

        result
    }

    /// Snapshot of the connections registered under an address, in
    /// registration order.
    pub fn connections(&self, addr: &ListenAddr) -> Vec<ConnHandle> {
        self.lock()
            .conns
            .get(&addr.key())
            .cloned()
            .unwrap_or_default()
    }

    /// Check if a handle is currently registered under its address.
    pub fn contains(&self, conn: &ConnHandle) -> bool {
        let key = key_of(conn);
        self.lock()
            .conns
            .get(&key)
            .is_some_and(|conns| conns.iter().any(|c| same_conn(c, conn)))
    }

    /// Number of addresses with at least one registered connection.
    pub fn address_count(&self) -> usize {
        self.lock().conns.len()
    }

    /// Number of registrations across all addresses.
    pub fn connection_count(&self) -> usize {
        self.lock().total
    }

    pub fn is_empty(&self) -> bool {
        self.lock().conns.is_empty()
    }

    /// List all keys currently in the table.
    ///
    /// Useful for debugging and monitoring.
    pub fn list_keys(&self) -> Vec<ConnKey> {
        self.lock().conns.keys().cloned().collect()
    }
}

fn remove_from(table: &mut Table, key: ConnKey, conn: &ConnHandle) -> Result<()> {
    let Some(conns) = table.conns.get_mut(&key) else {
        return Err(MuxError::UnknownConnection { key });
    };

    let Some(pos) = conns.iter().position(|c| same_conn(c, conn)) else {
        return Err(MuxError::ConnectionNotFound { key });
    };

    conns.remove(pos);
    if conns.is_empty() {
        table.conns.remove(&key);
    }
    table.total -= 1;
    Ok(())
}

impl Multiplexer for ConnMultiplexer {
    fn add_conn(&self, conn: ConnHandle) {
        ConnMultiplexer::add_conn(self, conn)
    }

    fn remove_conn(&self, conn: &ConnHandle) -> Result<()> {
        ConnMultiplexer::remove_conn(self, conn)
    }
}

impl Default for ConnMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnMultiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.lock();
        f.debug_struct("ConnMultiplexer")
            .field("address_count", &table.conns.len())
            .field("connection_count", &table.total)
            .finish()
    }
}
