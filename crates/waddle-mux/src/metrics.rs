//! Multiplexer metrics for observability.
//!
//! Uses the global OpenTelemetry meter provider, which must be initialized by
//! the host application before the first registration. Without one, every
//! instrument is a no-op.

use opentelemetry::metrics::{Counter, Gauge, Meter};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

static METER: OnceLock<Meter> = OnceLock::new();
static INSTRUMENTS: OnceLock<MuxInstruments> = OnceLock::new();

fn meter() -> &'static Meter {
    METER.get_or_init(|| opentelemetry::global::meter("waddle-mux"))
}

struct MuxInstruments {
    addresses_active: Gauge<i64>,
    connections_active: Gauge<i64>,
    remove_failures: Counter<u64>,
}

fn instruments() -> &'static MuxInstruments {
    INSTRUMENTS.get_or_init(|| MuxInstruments {
        addresses_active: addresses_active(),
        connections_active: connections_active(),
        remove_failures: remove_failures(),
    })
}

/// Gauge for addresses with at least one registered connection.
pub fn addresses_active() -> Gauge<i64> {
    meter()
        .i64_gauge("mux.addresses.active")
        .with_description("Current number of multiplexed local addresses")
        .with_unit("address")
        .build()
}

/// Gauge for registered connections across all addresses.
pub fn connections_active() -> Gauge<i64> {
    meter()
        .i64_gauge("mux.connections.active")
        .with_description("Current number of registered connections")
        .with_unit("connection")
        .build()
}

/// Counter for failed removals.
pub fn remove_failures() -> Counter<u64> {
    meter()
        .u64_counter("mux.remove.failures")
        .with_description("Total connection removals that found nothing to remove")
        .with_unit("removal")
        .build()
}

/// Record the current table size.
pub fn record_table_size(addresses: usize, connections: usize) {
    let instruments = instruments();
    instruments.addresses_active.record(addresses as i64, &[]);
    instruments.connections_active.record(connections as i64, &[]);
}

/// Record a failed removal.
pub fn record_remove_failure(kind: &'static str) {
    instruments()
        .remove_failures
        .add(1, &[KeyValue::new("kind", kind)]);
}
