//! Cooperative single-task event loop: multiplexes UDP reception on every
//! bound input socket with the periodic-update, expiry-scan, and display
//! cadences, per SPEC_FULL.md §4.4/§4.4a.
//!
//! Each input socket gets its own lightweight receive task that only reads
//! bytes and forwards them over a channel — it never touches the
//! [`Router`]. The single task selecting on that channel is the only one
//! that calls into the router, so no locking is needed despite depending on
//! tokio's full feature set.

use crate::router::Router;
use crate::{Port, RouterId, RouterResult};
use log::{debug, info, warn};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::sleep_until;

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
const MAX_DATAGRAM_LEN: usize = 1024;
const INBOX_CAPACITY: usize = 256;

pub const DEFAULT_PERIODIC_UPDATE_PERIOD: Duration = Duration::from_secs(30);
pub const DEFAULT_EXPIRY_SCAN_PERIOD: Duration = Duration::from_secs(1);

/// Timing knobs for one run of the event loop. `display_period: None`
/// disables the diagnostic redraw entirely.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub periodic_update_period: Duration,
    pub expiry_scan_period: Duration,
    pub display_period: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            periodic_update_period: DEFAULT_PERIODIC_UPDATE_PERIOD,
            expiry_scan_period: DEFAULT_EXPIRY_SCAN_PERIOD,
            display_period: None,
        }
    }
}

/// Binds one UDP socket per configured input port and drives `router` until
/// an external interrupt arrives.
pub async fn run(
    mut router: Router,
    input_ports: &[Port],
    config: SchedulerConfig,
) -> RouterResult<()> {
    let (inbox_tx, mut inbox_rx) = mpsc::channel(INBOX_CAPACITY);

    for &port in input_ports {
        let addr = SocketAddr::new(LOOPBACK, port);
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| crate::RouterError::SocketBind { port, source })?;
        info!("bound input socket on {addr}");

        let tx = inbox_tx.clone();
        tokio::spawn(async move { receive_loop(socket, tx).await });
    }
    drop(inbox_tx);

    send_periodic_updates(&mut router).await;

    let now = Instant::now();
    let mut next_update = now + config.periodic_update_period;
    let mut next_expiry_scan = now + config.expiry_scan_period;
    let mut next_display = config.display_period.map(|period| now + period);

    loop {
        let now = Instant::now();
        let mut deadline = next_update.min(next_expiry_scan);
        if let Some(nd) = next_display {
            deadline = deadline.min(nd);
        }
        let deadline = deadline.max(now);

        tokio::select! {
            biased;

            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal");
                return Ok(());
            }

            datagram = inbox_rx.recv() => {
                match datagram {
                    Some((bytes, from)) => {
                        debug!("received {} bytes from {from}", bytes.len());
                        router.on_datagram(&bytes, Instant::now());
                    }
                    None => {
                        warn!("all input sockets closed; shutting down");
                        return Ok(());
                    }
                }
            }

            _ = sleep_until(deadline.into()) => {}
        }

        // Drain every datagram already buffered in the channel before
        // evaluating the timer branches below, per SPEC_FULL.md §5(c): all
        // datagrams readable at a single wait are processed before timers
        // fire.
        while let Ok((bytes, from)) = inbox_rx.try_recv() {
            debug!("received {} bytes from {from}", bytes.len());
            router.on_datagram(&bytes, Instant::now());
        }

        let now = Instant::now();

        if now >= next_expiry_scan {
            let outcome = router.sweep(now);
            if outcome.triggers_update() {
                send_periodic_updates(&mut router).await;
                router.record_triggered_update_sent();
            }
            next_expiry_scan = now + config.expiry_scan_period;
        }

        if now >= next_update {
            send_periodic_updates(&mut router).await;
            next_update = now + config.periodic_update_period;
        }

        if let Some(period) = config.display_period {
            if next_display.is_some_and(|nd| now >= nd) {
                crate::display::render(&router, now);
                next_display = Some(now + period);
            }
        }
    }
}

async fn receive_loop(socket: UdpSocket, tx: mpsc::Sender<(Vec<u8>, SocketAddr)>) {
    let mut buf = [0u8; MAX_DATAGRAM_LEN];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((n, from)) => {
                if tx.send((buf[..n].to_vec(), from)).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                warn!("error receiving on {:?}: {err}", socket.local_addr());
            }
        }
    }
}

async fn send_periodic_updates(router: &mut Router) {
    let neighbor_ids: Vec<RouterId> = router.neighbor_ids().collect();
    for neighbor_id in neighbor_ids {
        send_update_to(router, neighbor_id).await;
    }
}

async fn send_update_to(router: &mut Router, neighbor_id: RouterId) {
    let Some(port) = router.outgoing_port(neighbor_id) else {
        return;
    };
    let payload = router.build_update_for(neighbor_id);

    match UdpSocket::bind((LOOPBACK, 0)).await {
        Ok(socket) => {
            let dest = SocketAddr::new(LOOPBACK, port);
            match socket.send_to(&payload, dest).await {
                Ok(_) => {
                    router.record_packet_sent();
                    router.record_routing_update_sent();
                }
                Err(err) => warn!("failed to send update to neighbor {neighbor_id}: {err}"),
            }
        }
        Err(err) => warn!("failed to allocate sender socket: {err}"),
    }
}
