//! The routing table: one entry per destination, mutated only by the
//! Bellman-Ford relaxation step, the expiry scan, and the garbage collector.

use crate::{Metric, Port, RouterId, INFINITY};
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_ROUTE_TIMEOUT: Duration = Duration::from_secs(180);
pub const DEFAULT_GC_PERIOD: Duration = Duration::from_secs(60);

/// When an Active route's timer fires. The self route carries `Never`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteDeadline {
    At(Instant),
    Never,
}

/// The `state` field of a route entry, matching the tagged-record model in
/// the spec: the garbage-collection deadline only exists once a route has
/// expired, it is not a nullable field on every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteState {
    Active { route_deadline: RouteDeadline },
    Expired { gc_deadline: Instant },
}

/// A single route entry, keyed externally by destination id.
#[derive(Debug, Clone, Copy)]
struct RouteEntry {
    next_hop: RouterId,
    metric: Metric,
    outgoing_port: Port,
    state: RouteState,
}

impl RouteEntry {
    fn is_active(&self) -> bool {
        matches!(self.state, RouteState::Active { .. })
    }
}

/// Derived, externally-visible lifecycle state of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteLifecycle {
    Active,
    Expired,
}

/// One row of the diagnostic table: (destination, next_hop, metric,
/// outgoing_port, seconds_until_route_timeout, seconds_until_gc).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticRow {
    pub destination: RouterId,
    pub next_hop: RouterId,
    pub metric: Metric,
    pub outgoing_port: Port,
    pub seconds_until_route_timeout: i64,
    pub seconds_until_gc: i64,
}

/// The routing table proper.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    self_id: RouterId,
    routes: HashMap<RouterId, RouteEntry>,
    route_timeout: Duration,
    gc_period: Duration,
}

impl RoutingTable {
    /// Create a table with the self-route bootstrapped per invariant 1.
    pub fn new(self_id: RouterId, route_timeout: Duration, gc_period: Duration) -> Self {
        let mut routes = HashMap::new();
        routes.insert(
            self_id,
            RouteEntry {
                next_hop: self_id,
                metric: 0,
                outgoing_port: 0,
                state: RouteState::Active { route_deadline: RouteDeadline::Never },
            },
        );

        Self {
            self_id,
            routes,
            route_timeout,
            gc_period,
        }
    }

    pub fn with_defaults(self_id: RouterId) -> Self {
        Self::new(self_id, DEFAULT_ROUTE_TIMEOUT, DEFAULT_GC_PERIOD)
    }

    pub fn self_id(&self) -> RouterId {
        self.self_id
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get_metric(&self, destination: RouterId) -> Option<Metric> {
        self.routes.get(&destination).map(|r| r.metric)
    }

    pub fn get_next_hop(&self, destination: RouterId) -> Option<RouterId> {
        self.routes.get(&destination).map(|r| r.next_hop)
    }

    pub fn lifecycle(&self, destination: RouterId) -> Option<RouteLifecycle> {
        self.routes.get(&destination).map(|r| {
            if r.is_active() {
                RouteLifecycle::Active
            } else {
                RouteLifecycle::Expired
            }
        })
    }

    /// Bellman-Ford relaxation: see SPEC_FULL.md §4.2.
    ///
    /// Returns `true` if the table was mutated. The self route is never
    /// touched by this path.
    pub fn insert_or_relax(
        &mut self,
        destination: RouterId,
        next_hop: RouterId,
        metric: Metric,
        outgoing_port: Port,
        now: Instant,
    ) -> bool {
        if destination == self.self_id {
            return false;
        }
        if metric > INFINITY - 1 {
            return false;
        }

        let fresh_deadline = RouteDeadline::At(now + self.route_timeout);

        match self.routes.get_mut(&destination) {
            None => {
                self.routes.insert(
                    destination,
                    RouteEntry {
                        next_hop,
                        metric,
                        outgoing_port,
                        state: RouteState::Active { route_deadline: fresh_deadline },
                    },
                );
                true
            }
            Some(existing) => {
                if existing.next_hop == next_hop {
                    // Same-source rule: unconditionally refresh, improve or degrade.
                    existing.metric = metric;
                    existing.outgoing_port = outgoing_port;
                    existing.state = RouteState::Active { route_deadline: fresh_deadline };
                    true
                } else if metric < existing.metric {
                    existing.next_hop = next_hop;
                    existing.metric = metric;
                    existing.outgoing_port = outgoing_port;
                    existing.state = RouteState::Active { route_deadline: fresh_deadline };
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Marks `destination` unreachable: metric becomes 16, gc_timer is armed.
    /// Returns `true` iff this call performed the Active -> Expired
    /// transition (idempotent on an already-Expired entry).
    pub fn mark_unreachable(&mut self, destination: RouterId, now: Instant) -> bool {
        if destination == self.self_id {
            return false;
        }

        let Some(entry) = self.routes.get_mut(&destination) else {
            return false;
        };

        if !entry.is_active() {
            return false;
        }

        entry.metric = INFINITY;
        entry.state = RouteState::Expired { gc_deadline: now + self.gc_period };
        true
    }

    /// Destinations whose Active route_timer has elapsed (self excluded).
    pub fn sweep_expired(&self, now: Instant) -> Vec<RouterId> {
        self.routes
            .iter()
            .filter(|(&dest, entry)| {
                dest != self.self_id
                    && matches!(
                        entry.state,
                        RouteState::Active { route_deadline: RouteDeadline::At(d) } if d <= now
                    )
            })
            .map(|(&dest, _)| dest)
            .collect()
    }

    /// Removes and returns destinations whose gc_timer has elapsed.
    pub fn sweep_gc(&mut self, now: Instant) -> Vec<RouterId> {
        let expired: Vec<RouterId> = self
            .routes
            .iter()
            .filter_map(|(&dest, entry)| match entry.state {
                RouteState::Expired { gc_deadline } if gc_deadline <= now => Some(dest),
                _ => None,
            })
            .collect();

        for dest in &expired {
            self.routes.remove(dest);
        }

        expired
    }

    /// Split-horizon with poisoned reverse applied at emission time: routes
    /// learned from `neighbor_id` are advertised back to it with metric 16.
    /// The self route is always advertised with its real metric (0).
    pub fn snapshot_for_neighbor(&self, neighbor_id: RouterId) -> Vec<(RouterId, Metric)> {
        self.routes
            .iter()
            .map(|(&dest, entry)| {
                let effective_metric = if entry.next_hop == neighbor_id && dest != self.self_id {
                    INFINITY
                } else {
                    entry.metric
                };
                (dest, effective_metric)
            })
            .collect()
    }

    /// Read-only rows for the diagnostic renderer; does not mutate timers.
    pub fn diagnostic_rows(&self, now: Instant) -> Vec<DiagnosticRow> {
        let mut rows: Vec<DiagnosticRow> = self
            .routes
            .iter()
            .map(|(&destination, entry)| {
                let seconds_until_route_timeout = match entry.state {
                    RouteState::Active { route_deadline: RouteDeadline::At(d) } => {
                        signed_secs_until(d, now).max(-1)
                    }
                    RouteState::Active { route_deadline: RouteDeadline::Never } => i64::MAX,
                    RouteState::Expired { .. } => -1,
                };
                let seconds_until_gc = match entry.state {
                    RouteState::Expired { gc_deadline } => signed_secs_until(gc_deadline, now).max(0),
                    _ => 0,
                };

                DiagnosticRow {
                    destination,
                    next_hop: entry.next_hop,
                    metric: entry.metric,
                    outgoing_port: entry.outgoing_port,
                    seconds_until_route_timeout,
                    seconds_until_gc,
                }
            })
            .collect();

        rows.sort_by_key(|r| r.destination);
        rows
    }
}

fn signed_secs_until(deadline: Instant, now: Instant) -> i64 {
    if deadline >= now {
        (deadline - now).as_secs() as i64
    } else {
        -((now - deadline).as_secs() as i64)
    }
}
