//! # waddle-mux
//!
//! Shared listener registry for Waddle Social.
//!
//! Several logical connections can send and receive on the same local
//! address. The socket-owning side registers each connection when it starts
//! listening and deregisters it when it stops; this crate keeps the table of
//! which connections currently claim each address so inbound traffic can be
//! dispatched among them.
//!
//! The registry only tracks membership. It does not open or close sockets and
//! does not pick a connection for an inbound packet; callers do that with the
//! list [`ConnMultiplexer::connections`] returns.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use waddle_mux::{global, ConnHandle, IndexableConn, ListenAddr};
//!
//! struct PacketConn { addr: ListenAddr }
//!
//! impl IndexableConn for PacketConn {
//!     fn local_addr(&self) -> ListenAddr { self.addr }
//! }
//!
//! let conn: ConnHandle = Arc::new(PacketConn { addr: "udp 0.0.0.0:4433".parse()? });
//! global().add_conn(Arc::clone(&conn));
//!
//! // On teardown:
//! if let Err(e) = global().remove_conn(&conn) {
//!     tracing::warn!(error = %e, "Connection was not registered");
//! }
//! ```

pub mod addr;
pub mod conn;
pub mod metrics;
pub mod multiplexer;

mod error;

pub use addr::{ConnKey, ListenAddr, Network};
pub use conn::{same_conn, ConnHandle, IndexableConn};
pub use error::{AddrParseError, MuxError, Result};
pub use multiplexer::{global, ConnMultiplexer, Multiplexer, MultiplexerConfig};
