//! Shared helpers for multiplexer integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use waddle_mux::{ConnHandle, IndexableConn, ListenAddr, Network};

/// Install a test-friendly tracing subscriber.
/// Safe to call from every test; only the first call has an effect.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waddle_mux=debug"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// Connection stand-in that only knows its local address.
#[derive(Debug)]
pub struct FakeConn {
    pub addr: ListenAddr,
}

impl IndexableConn for FakeConn {
    fn local_addr(&self) -> ListenAddr {
        self.addr
    }
}

/// New handle bound to `addr` (e.g. `"udp 0.0.0.0:1234"`).
pub fn fake_conn(addr: &str) -> ConnHandle {
    Arc::new(FakeConn {
        addr: addr.parse().expect("valid test address"),
    })
}

/// New handle bound to `0.0.0.0:<port>` on `network`.
pub fn fake_conn_on(network: Network, port: u16) -> ConnHandle {
    Arc::new(FakeConn {
        addr: ListenAddr::new(network, SocketAddr::from(([0, 0, 0, 0], port))),
    })
}
