//! Engine-level counters for ripd.
//!
//! Incremented at the same seams the teacher's metrics module instruments
//! (packet send/receive, routing update send/receive), plus a
//! triggered-update counter and a route-count gauge specific to this engine.
//! Counters are diagnostic only: [`crate::router::Router`] never reads them
//! back to make a forwarding decision.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Point-in-time view of the counters, suitable for logging or display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub routing_updates_sent: u64,
    pub routing_updates_received: u64,
    pub triggered_updates_sent: u64,
    pub route_count: u32,
    pub uptime_seconds: u64,
}

#[derive(Debug)]
struct MetricsInner {
    packets_sent: AtomicU64,
    packets_received: AtomicU64,
    routing_updates_sent: AtomicU64,
    routing_updates_received: AtomicU64,
    triggered_updates_sent: AtomicU64,
    route_count: AtomicU32,
    start_time: Instant,
}

/// Cheaply cloneable counter handle, shared between the scheduler loop and
/// anything that wants to observe it (the display renderer, tests).
#[derive(Clone, Debug)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                packets_sent: AtomicU64::new(0),
                packets_received: AtomicU64::new(0),
                routing_updates_sent: AtomicU64::new(0),
                routing_updates_received: AtomicU64::new(0),
                triggered_updates_sent: AtomicU64::new(0),
                route_count: AtomicU32::new(0),
                start_time: Instant::now(),
            }),
        }
    }

    pub fn record_packet_sent(&self) {
        self.inner.packets_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_packet_received(&self) {
        self.inner.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_routing_update_sent(&self) {
        self.inner
            .routing_updates_sent
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_routing_update_received(&self) {
        self.inner
            .routing_updates_received
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_triggered_update_sent(&self) {
        self.inner
            .triggered_updates_sent
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_route_count(&self, count: usize) {
        self.inner.route_count.store(count as u32, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_sent: self.inner.packets_sent.load(Ordering::Relaxed),
            packets_received: self.inner.packets_received.load(Ordering::Relaxed),
            routing_updates_sent: self.inner.routing_updates_sent.load(Ordering::Relaxed),
            routing_updates_received: self
                .inner
                .routing_updates_received
                .load(Ordering::Relaxed),
            triggered_updates_sent: self.inner.triggered_updates_sent.load(Ordering::Relaxed),
            route_count: self.inner.route_count.load(Ordering::Relaxed),
            uptime_seconds: self.uptime_seconds(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
