//! The routing engine proper: owns one [`RoutingTable`], applies inbound
//! updates to it, and exposes the outbound snapshots and timer sweeps the
//! [`crate::scheduler`] event loop drives. Runs on a single task, so the
//! table is a plain field rather than an `Arc<RwLock<_>>`.

use crate::metrics::Metrics;
use crate::neighbor::NeighborTable;
use crate::protocol::{self, DecodedPacket, WireEntry};
use crate::routing_table::RoutingTable;
use crate::{Metric, Port, RouterId, INFINITY};
use log::{debug, warn};
use std::time::{Duration, Instant};

/// Outcome of feeding one inbound datagram to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Whether any destination's route was installed, improved, or refreshed.
    pub table_changed: bool,
}

/// Result of one expiry/gc sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepOutcome {
    /// Destinations that just transitioned Active -> Expired this sweep.
    pub newly_unreachable: Vec<RouterId>,
    /// Destinations garbage-collected (removed) this sweep.
    pub collected: Vec<RouterId>,
}

impl SweepOutcome {
    pub fn triggers_update(&self) -> bool {
        !self.newly_unreachable.is_empty()
    }
}

#[derive(Debug)]
pub struct Router {
    table: RoutingTable,
    neighbors: NeighborTable,
    metrics: Metrics,
}

impl Router {
    pub fn new(
        self_id: RouterId,
        neighbors: NeighborTable,
        route_timeout: Duration,
        gc_period: Duration,
        metrics: Metrics,
    ) -> Self {
        Self {
            table: RoutingTable::new(self_id, route_timeout, gc_period),
            neighbors,
            metrics,
        }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbors
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.clone()
    }

    /// Decode and apply one datagram, per SPEC_FULL.md §4.3's reception
    /// algorithm. Unknown senders and malformed packets are logged and
    /// dropped; they never reach the table.
    pub fn on_datagram(&mut self, data: &[u8], now: Instant) -> UpdateOutcome {
        let (sender, entries) = match protocol::decode(data) {
            DecodedPacket::Accepted { sender, entries } => (sender, entries),
            DecodedPacket::MalformedHeader => {
                warn!("dropping malformed datagram ({} bytes)", data.len());
                return UpdateOutcome { table_changed: false };
            }
            DecodedPacket::WrongCommand => {
                warn!("dropping datagram with unsupported command");
                return UpdateOutcome { table_changed: false };
            }
            DecodedPacket::WrongVersion => {
                warn!("dropping datagram with unsupported version");
                return UpdateOutcome { table_changed: false };
            }
        };

        let Some(link) = self.neighbors.get(sender) else {
            warn!("dropping response from unconfigured sender {sender}");
            return UpdateOutcome { table_changed: false };
        };

        self.metrics.record_packet_received();
        self.metrics.record_routing_update_received();

        let mut table_changed = false;
        for entry in entries {
            if entry.metric >= INFINITY {
                // The neighbor is reporting this destination unreachable. Only
                // acts if the neighbor is still this destination's authoritative
                // source; otherwise it carries no new information.
                if self.table.get_next_hop(entry.destination) == Some(sender)
                    && self.table.mark_unreachable(entry.destination, now)
                {
                    table_changed = true;
                }
                continue;
            }

            let new_metric = entry.metric.saturating_add(link.link_cost).min(INFINITY);
            if self
                .table
                .insert_or_relax(entry.destination, sender, new_metric, link.outgoing_port, now)
            {
                table_changed = true;
            }
        }

        self.metrics.set_route_count(self.table.len());
        if table_changed {
            debug!("table updated from neighbor {sender}");
        }

        UpdateOutcome { table_changed }
    }

    /// Build the split-horizon-with-poisoned-reverse payload addressed to
    /// `neighbor_id`.
    pub fn build_update_for(&self, neighbor_id: RouterId) -> Vec<u8> {
        let entries: Vec<WireEntry> = self
            .table
            .snapshot_for_neighbor(neighbor_id)
            .into_iter()
            .map(|(destination, metric)| WireEntry { destination, metric })
            .collect();
        protocol::encode_response(self.table.self_id(), &entries)
    }

    /// Outgoing port configured for `neighbor_id`, if any.
    pub fn outgoing_port(&self, neighbor_id: RouterId) -> Option<Port> {
        self.neighbors.outgoing_port(neighbor_id)
    }

    /// All configured neighbor ids, in no particular order.
    pub fn neighbor_ids(&self) -> impl Iterator<Item = RouterId> + '_ {
        self.neighbors.ids()
    }

    /// Route-timer and gc-timer sweep, per SPEC_FULL.md §4.2. Callers run
    /// this on the `next_expiry_scan` cadence.
    pub fn sweep(&mut self, now: Instant) -> SweepOutcome {
        let expired = self.table.sweep_expired(now);
        for destination in &expired {
            self.table.mark_unreachable(*destination, now);
        }
        let collected = self.table.sweep_gc(now);

        self.metrics.set_route_count(self.table.len());
        if !expired.is_empty() {
            debug!("routes expired: {expired:?}");
        }
        if !collected.is_empty() {
            debug!("routes garbage-collected: {collected:?}");
        }

        SweepOutcome {
            newly_unreachable: expired,
            collected,
        }
    }

    pub fn record_packet_sent(&self) {
        self.metrics.record_packet_sent();
    }

    pub fn record_routing_update_sent(&self) {
        self.metrics.record_routing_update_sent();
    }

    pub fn record_triggered_update_sent(&self) {
        self.metrics.record_triggered_update_sent();
    }

    pub fn diagnostic_rows(&self, now: Instant) -> Vec<crate::routing_table::DiagnosticRow> {
        self.table.diagnostic_rows(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbor::Link;
    use std::collections::HashMap;
    use std::time::Duration;

    fn neighbors(pairs: &[(RouterId, Port, Metric)]) -> NeighborTable {
        let mut links = HashMap::new();
        for &(id, port, cost) in pairs {
            links.insert(id, Link { outgoing_port: port, link_cost: cost });
        }
        NeighborTable::new(links)
    }

    fn router(self_id: RouterId, neighbors: NeighborTable) -> Router {
        Router::new(
            self_id,
            neighbors,
            Duration::from_secs(180),
            Duration::from_secs(60),
            Metrics::new(),
        )
    }

    #[test]
    fn learns_a_route_from_a_configured_neighbor() {
        let mut r = router(1, neighbors(&[(2, 5002, 3)]));
        let datagram = protocol::encode_response(2, &[WireEntry { destination: 3, metric: 1 }]);

        let outcome = r.on_datagram(&datagram, Instant::now());
        assert!(outcome.table_changed);
        assert_eq!(r.table().get_metric(3), Some(4));
        assert_eq!(r.table().get_next_hop(3), Some(2));
    }

    #[test]
    fn ignores_datagram_from_unconfigured_sender() {
        let mut r = router(1, neighbors(&[(2, 5002, 3)]));
        let datagram = protocol::encode_response(9, &[WireEntry { destination: 3, metric: 1 }]);

        let outcome = r.on_datagram(&datagram, Instant::now());
        assert!(!outcome.table_changed);
        assert_eq!(r.table().len(), 1); // only the self route
    }

    #[test]
    fn caps_learned_metric_at_infinity() {
        let mut r = router(1, neighbors(&[(2, 5002, 10)]));
        let datagram = protocol::encode_response(2, &[WireEntry { destination: 3, metric: 15 }]);

        r.on_datagram(&datagram, Instant::now());
        assert_eq!(r.table().get_metric(3), None); // rejected: 15+10=25 -> capped 16, not installable
    }

    #[test]
    fn authoritative_unreachable_advertisement_marks_route_expired() {
        let mut r = router(1, neighbors(&[(2, 5002, 1)]));
        let now = Instant::now();
        r.on_datagram(
            &protocol::encode_response(2, &[WireEntry { destination: 3, metric: 1 }]),
            now,
        );
        assert_eq!(r.table().get_metric(3), Some(2));

        let outcome = r.on_datagram(
            &protocol::encode_response(2, &[WireEntry { destination: 3, metric: INFINITY }]),
            now,
        );
        assert!(outcome.table_changed);
        assert_eq!(r.table().get_metric(3), Some(INFINITY));
    }

    #[test]
    fn unreachable_advertisement_from_non_authoritative_source_is_ignored() {
        let mut r = router(1, neighbors(&[(2, 5002, 1), (3, 5003, 1)]));
        let now = Instant::now();
        r.on_datagram(
            &protocol::encode_response(2, &[WireEntry { destination: 4, metric: 1 }]),
            now,
        );
        assert_eq!(r.table().get_next_hop(4), Some(2));

        let outcome = r.on_datagram(
            &protocol::encode_response(3, &[WireEntry { destination: 4, metric: INFINITY }]),
            now,
        );
        assert!(!outcome.table_changed);
        assert_eq!(r.table().get_metric(4), Some(2));
    }

    #[test]
    fn build_update_poisons_the_recipient() {
        let mut r = router(1, neighbors(&[(2, 5002, 1), (3, 5003, 1)]));
        r.on_datagram(
            &protocol::encode_response(2, &[WireEntry { destination: 4, metric: 1 }]),
            Instant::now(),
        );

        let payload = r.build_update_for(2);
        match protocol::decode(&payload) {
            DecodedPacket::Accepted { entries, .. } => {
                let poisoned = entries.iter().find(|e| e.destination == 4).unwrap();
                assert_eq!(poisoned.metric, INFINITY);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sweep_reports_newly_unreachable_destinations() {
        let mut r = router(1, neighbors(&[(2, 5002, 1)]));
        let now = Instant::now();
        r.on_datagram(
            &protocol::encode_response(2, &[WireEntry { destination: 3, metric: 1 }]),
            now,
        );

        let outcome = r.sweep(now + Duration::from_secs(181));
        assert_eq!(outcome.newly_unreachable, vec![3]);
        assert!(outcome.triggers_update());
    }
}
