//! Static neighbor model: `neighbor_id -> (outgoing_port, link_cost)`.
//!
//! Built once from [`crate::config::RouterConfig`] and never mutated after
//! startup — the configuration token order on disk (`port-metric-routerId`)
//! is translated here into the canonical `neighbor_id -> (port, cost)` shape
//! the rest of the engine expects.

use crate::{Metric, Port, RouterId};
use std::collections::HashMap;

/// An immutable link to a directly-configured neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub outgoing_port: Port,
    pub link_cost: Metric,
}

/// Lookup table from neighbor router id to its link.
#[derive(Debug, Clone, Default)]
pub struct NeighborTable {
    links: HashMap<RouterId, Link>,
}

impl NeighborTable {
    pub fn new(links: HashMap<RouterId, Link>) -> Self {
        Self { links }
    }

    pub fn contains(&self, neighbor_id: RouterId) -> bool {
        self.links.contains_key(&neighbor_id)
    }

    pub fn get(&self, neighbor_id: RouterId) -> Option<Link> {
        self.links.get(&neighbor_id).copied()
    }

    pub fn outgoing_port(&self, neighbor_id: RouterId) -> Option<Port> {
        self.get(neighbor_id).map(|l| l.outgoing_port)
    }

    pub fn link_cost(&self, neighbor_id: RouterId) -> Option<Metric> {
        self.get(neighbor_id).map(|l| l.link_cost)
    }

    pub fn ids(&self) -> impl Iterator<Item = RouterId> + '_ {
        self.links.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
