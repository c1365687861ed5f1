//! ripd: a RIPv2-shaped distance-vector routing daemon for many loopback
//! routers on one host.
//!
//! Each instance owns a [`routing_table::RoutingTable`], exchanges
//! [`protocol`]-encoded Response messages with its configured
//! [`neighbor::NeighborTable`], and is driven by the [`scheduler`] event loop.

pub mod cli;
pub mod config;
pub mod display;
pub mod metrics;
pub mod neighbor;
pub mod protocol;
pub mod router;
pub mod routing_table;
pub mod scheduler;

use thiserror::Error;

/// Router identifier: integer in \[1, 64000\], globally unique in the topology.
pub type RouterId = u16;

/// UDP port: integer in \[1024, 64000\], locally unique among input ports.
pub type Port = u16;

/// RIP hop-count metric: integer in \[0, 16\]. 16 denotes unreachable.
pub type Metric = u8;

/// Metric value denoting an unreachable destination.
pub const INFINITY: Metric = 16;

/// Top-level error type for ripd.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("failed to bind socket on port {port}: {source}")]
    SocketBind {
        port: Port,
        #[source]
        source: std::io::Error,
    },

    #[error("network I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RouterResult<T> = Result<T, RouterError>;
