//! End-to-end tests exercising the routing engine over real loopback UDP
//! sockets and through the configuration loader, rather than the in-module
//! unit tests that drive `Router`/`RoutingTable` directly.

use ripd::config::RouterConfig;
use ripd::metrics::Metrics;
use ripd::neighbor::{Link, NeighborTable};
use ripd::protocol::{self, DecodedPacket, WireEntry};
use ripd::router::Router;
use ripd::INFINITY;
use std::collections::HashMap;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::net::UdpSocket;

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn neighbor_table(links: &[(u16, u16, u8)]) -> NeighborTable {
    let mut map = HashMap::new();
    for &(id, port, cost) in links {
        map.insert(id, Link { outgoing_port: port, link_cost: cost });
    }
    NeighborTable::new(map)
}

fn router(self_id: u16, links: &[(u16, u16, u8)]) -> Router {
    Router::new(
        self_id,
        neighbor_table(links),
        Duration::from_secs(180),
        Duration::from_secs(60),
        Metrics::new(),
    )
}

/// Scenario 1 from SPEC_FULL.md §8: a two-router linear topology exchanging
/// real datagrams over loopback UDP sockets converges to the expected table.
#[tokio::test]
async fn two_router_linear_converges_over_real_udp() {
    let r1_socket = UdpSocket::bind((LOOPBACK, 5001)).await.unwrap();
    let r2_socket = UdpSocket::bind((LOOPBACK, 5002)).await.unwrap();

    let mut r1 = router(1, &[(2, 5002, 1)]);
    let mut r2 = router(2, &[(1, 5001, 1)]);

    let now = Instant::now();

    let payload = r1.build_update_for(2);
    r1_socket
        .send_to(&payload, SocketAddr::new(LOOPBACK, 5002))
        .await
        .unwrap();
    let mut buf = [0u8; 1024];
    let (n, _from) = r2_socket.recv_from(&mut buf).await.unwrap();
    r2.on_datagram(&buf[..n], now);

    let payload = r2.build_update_for(1);
    r2_socket
        .send_to(&payload, SocketAddr::new(LOOPBACK, 5001))
        .await
        .unwrap();
    let (n, _from) = r1_socket.recv_from(&mut buf).await.unwrap();
    r1.on_datagram(&buf[..n], now);

    assert_eq!(r1.table().get_metric(1), Some(0));
    assert_eq!(r1.table().get_metric(2), Some(1));
    assert_eq!(r1.table().get_next_hop(2), Some(2));

    assert_eq!(r2.table().get_metric(2), Some(0));
    assert_eq!(r2.table().get_metric(1), Some(1));
    assert_eq!(r2.table().get_next_hop(1), Some(1));

    // The snapshot each router would send back poisons the peer's own route.
    match protocol::decode(&r1.build_update_for(2)) {
        DecodedPacket::Accepted { entries, .. } => {
            let poisoned = entries.iter().find(|e| e.destination == 2).unwrap();
            assert_eq!(poisoned.metric, INFINITY);
        }
        other => panic!("unexpected {other:?}"),
    }
}

/// Scenario 2: a three-router line 1-2-3 with unit link costs converges so
/// that R1 reaches 3 in two hops via 2, and R1's advertisement to 2 poisons
/// destination 3 (learned from 2).
#[tokio::test]
async fn three_router_line_converges_to_shortest_path() {
    let mut r1 = router(1, &[(2, 5002, 1)]);
    let mut r2 = router(2, &[(1, 5001, 1), (3, 5003, 1)]);
    let r3 = router(3, &[(2, 5002, 1)]);

    let now = Instant::now();

    // Round 1: everyone advertises their directly-known routes.
    r2.on_datagram(&r1.build_update_for(2), now);
    r2.on_datagram(&r3.build_update_for(2), now);
    r1.on_datagram(&r2.build_update_for(1), now);

    // Round 2: R2 now knows about 3 (learned in round 1) so re-advertise to R1.
    r1.on_datagram(&r2.build_update_for(1), now);

    assert_eq!(r1.table().get_metric(3), Some(2));
    assert_eq!(r1.table().get_next_hop(3), Some(2));

    match protocol::decode(&r1.build_update_for(2)) {
        DecodedPacket::Accepted { entries, .. } => {
            let poisoned = entries.iter().find(|e| e.destination == 3).unwrap();
            assert_eq!(poisoned.metric, INFINITY);
        }
        other => panic!("unexpected {other:?}"),
    }
}

/// Scenario 3: when R2 stops advertising, R1's route through it expires,
/// fires exactly one triggered update, and is collected after `gc_period`.
#[tokio::test]
async fn link_failure_expires_and_collects_routes() {
    let route_timeout = Duration::from_secs(180);
    let gc_period = Duration::from_secs(60);
    let mut r1 = Router::new(
        1,
        neighbor_table(&[(2, 5002, 1)]),
        route_timeout,
        gc_period,
        Metrics::new(),
    );

    let now = Instant::now();
    let r2 = router(2, &[(1, 5001, 1), (3, 5003, 1)]);
    r1.on_datagram(&r2.build_update_for(1), now);
    drop(r2);

    assert_eq!(r1.table().get_metric(2), Some(1));

    let after_timeout = now + route_timeout + Duration::from_secs(1);
    let sweep = r1.sweep(after_timeout);
    assert!(sweep.triggers_update());
    assert_eq!(r1.table().get_metric(2), Some(INFINITY));

    let after_gc = after_timeout + gc_period + Duration::from_secs(1);
    let sweep = r1.sweep(after_gc);
    assert!(!sweep.triggers_update());
    assert_eq!(r1.table().get_metric(2), None);
}

/// Scenario 5: malformed datagrams never mutate state, including when
/// delivered over an actual socket.
#[tokio::test]
async fn malformed_datagram_over_real_socket_is_dropped() {
    let socket_a = UdpSocket::bind((LOOPBACK, 0)).await.unwrap();
    let socket_b = UdpSocket::bind((LOOPBACK, 0)).await.unwrap();
    let b_addr = socket_b.local_addr().unwrap();

    socket_a.send_to(&[1, 2, 3], b_addr).await.unwrap();
    let mut buf = [0u8; 1024];
    let (n, _) = socket_b.recv_from(&mut buf).await.unwrap();

    let mut r = router(1, &[(2, 5002, 1)]);
    let outcome = r.on_datagram(&buf[..n], Instant::now());
    assert!(!outcome.table_changed);
    assert_eq!(r.table().len(), 1);
}

/// Scenario 6: a config file with an out-of-range input port is rejected
/// before any socket is bound.
#[tokio::test]
async fn config_with_out_of_range_port_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "router-id 1").unwrap();
    writeln!(file, "input-ports 100,5000").unwrap();
    writeln!(file, "outputs 5002-1-2").unwrap();

    let err = RouterConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ripd::config::ConfigError::Range { .. }));
}

/// A well-formed config file round-trips through the loader into a usable
/// neighbor table, the same path `main.rs` exercises at startup.
#[tokio::test]
async fn config_load_feeds_a_working_neighbor_table() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "router-id 7").unwrap();
    writeln!(file, "input-ports 6001,6002").unwrap();
    writeln!(file, "outputs 6101-1-8,6102-3-9").unwrap();

    let config = RouterConfig::load(file.path()).unwrap();
    assert_eq!(config.router_id, 7);
    assert_eq!(config.input_ports, vec![6001, 6002]);

    let neighbors = config.neighbor_table();
    assert_eq!(neighbors.outgoing_port(8), Some(6101));
    assert_eq!(neighbors.link_cost(9), Some(3));

    let mut r = Router::new(
        config.router_id,
        neighbors,
        Duration::from_secs(18),
        Duration::from_secs(6),
        Metrics::new(),
    );
    let datagram = protocol::encode_response(8, &[WireEntry { destination: 42, metric: 2 }]);
    let outcome = r.on_datagram(&datagram, Instant::now());
    assert!(outcome.table_changed);
    assert_eq!(r.table().get_metric(42), Some(3));
}
