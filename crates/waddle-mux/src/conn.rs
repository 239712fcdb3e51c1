//! Connection handles tracked by the multiplexer.

use std::sync::Arc;

use crate::addr::{ConnKey, ListenAddr};

/// A bound endpoint that can report its local address.
///
/// Implemented by whatever owns the socket (a packet conn, a listener, ...).
/// The multiplexer only ever asks for the address; everything else about the
/// connection is opaque to it.
pub trait IndexableConn: Send + Sync + 'static {
    /// The local address this connection is bound to.
    fn local_addr(&self) -> ListenAddr;
}

/// Shared handle to a registered connection.
///
/// Handles are compared by identity: two handles are the same registration
/// only if they point at the same allocation.
pub type ConnHandle = Arc<dyn IndexableConn>;

/// Identity comparison between two handles.
#[inline]
pub fn same_conn(a: &ConnHandle, b: &ConnHandle) -> bool {
    Arc::ptr_eq(a, b)
}

/// Key under which a handle is registered.
pub(crate) fn key_of(conn: &ConnHandle) -> ConnKey {
    conn.local_addr().key()
}
