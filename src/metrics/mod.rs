//! Fuse metrics
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Register descriptions for all fuse metrics
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!("fuse_melts_total", "Total number of melts recorded per fuse");
    describe_counter!(
        "fuse_trips_total",
        "Total number of times a fuse blew (closed -> blown)"
    );
    describe_counter!(
        "fuse_recoveries_total",
        "Total number of times a fuse recovered (blown -> closed)"
    );
    describe_gauge!("fuse_blown", "1 while the fuse is known to be blown, 0 otherwise");
}

pub(crate) fn record_melt(fuse: &str) {
    counter!("fuse_melts_total", "fuse" => fuse.to_string()).increment(1);
}

pub(crate) fn record_trip(fuse: &str) {
    counter!("fuse_trips_total", "fuse" => fuse.to_string()).increment(1);
    gauge!("fuse_blown", "fuse" => fuse.to_string()).set(1.0);
}

pub(crate) fn record_recovery(fuse: &str) {
    counter!("fuse_recoveries_total", "fuse" => fuse.to_string()).increment(1);
    gauge!("fuse_blown", "fuse" => fuse.to_string()).set(0.0);
}
