//! Registration and deregistration behaviour of an injected multiplexer.

mod common;

use std::sync::Arc;

use common::{fake_conn, fake_conn_on, init_tracing};
use waddle_mux::{same_conn, ConnMultiplexer, ListenAddr, MuxError, Network};

fn addr(s: &str) -> ListenAddr {
    s.parse().unwrap()
}

#[test]
fn test_add_then_remove_leaves_no_residue() {
    init_tracing();
    let mux = ConnMultiplexer::new();
    let c = fake_conn("udp 10.0.0.1:9000");

    mux.add_conn(Arc::clone(&c));
    assert_eq!(mux.list_keys(), vec![addr("udp 10.0.0.1:9000").key()]);

    mux.remove_conn(&c).unwrap();
    assert!(mux.list_keys().is_empty());
    assert!(mux.connections(&addr("udp 10.0.0.1:9000")).is_empty());
}

#[test]
fn test_separately_built_addresses_multiplex_together() {
    init_tracing();
    let mux = ConnMultiplexer::new();
    let a = fake_conn("udp 0.0.0.0:1234");
    let b = fake_conn_on(Network::Udp, 1234);

    mux.add_conn(Arc::clone(&a));
    mux.add_conn(Arc::clone(&b));

    assert_eq!(mux.address_count(), 1);
    assert_eq!(mux.connections(&addr("udp 0.0.0.0:1234")).len(), 2);
}

#[test]
fn test_remove_of_handle_from_other_address() {
    init_tracing();
    let mux = ConnMultiplexer::new();
    let here = fake_conn("udp 0.0.0.0:1234");
    let there = fake_conn("udp 0.0.0.0:4321");
    let neighbour = fake_conn("udp 0.0.0.0:4321");

    mux.add_conn(Arc::clone(&here));
    assert!(matches!(
        mux.remove_conn(&there),
        Err(MuxError::UnknownConnection { .. })
    ));

    mux.add_conn(Arc::clone(&neighbour));
    assert!(matches!(
        mux.remove_conn(&there),
        Err(MuxError::ConnectionNotFound { .. })
    ));
    assert_eq!(mux.connection_count(), 2);
}

#[test]
fn test_double_removal_reports_mismatch() {
    init_tracing();
    let mux = ConnMultiplexer::new();
    let a = fake_conn("udp 0.0.0.0:1234");
    let b = fake_conn("udp 0.0.0.0:1234");

    mux.add_conn(Arc::clone(&a));
    mux.add_conn(Arc::clone(&b));

    mux.remove_conn(&a).unwrap();
    let err = mux.remove_conn(&a).unwrap_err();
    assert_eq!(
        err,
        MuxError::ConnectionNotFound {
            key: addr("udp 0.0.0.0:1234").key()
        }
    );

    let remaining = mux.connections(&addr("udp 0.0.0.0:1234"));
    assert_eq!(remaining.len(), 1);
    assert!(same_conn(&remaining[0], &b));
}

#[test]
fn test_order_kept_across_interleaved_operations() {
    init_tracing();
    let mux = ConnMultiplexer::new();
    let conns: Vec<_> = (0..5).map(|_| fake_conn("udp 0.0.0.0:7000")).collect();

    for c in &conns {
        mux.add_conn(Arc::clone(c));
    }
    mux.remove_conn(&conns[0]).unwrap();
    mux.remove_conn(&conns[3]).unwrap();

    let late = fake_conn("udp 0.0.0.0:7000");
    mux.add_conn(Arc::clone(&late));

    let listed = mux.connections(&addr("udp 0.0.0.0:7000"));
    let expected = [&conns[1], &conns[2], &conns[4], &late];
    assert_eq!(listed.len(), expected.len());
    for (got, want) in listed.iter().zip(expected) {
        assert!(same_conn(got, want));
    }
}
