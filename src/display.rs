//! Diagnostic table renderer: prints the routing table snapshot described
//! in SPEC_FULL.md §6, one redraw per `display_period` tick.

use crate::router::Router;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use std::time::Instant;

pub fn render(router: &Router, now: Instant) {
    let rows = router.diagnostic_rows(now);
    let snapshot = router.metrics().snapshot();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Peer Router",
        "Next Hop",
        "Distance",
        "Port",
        "Route Timeout",
        "GC Timer",
    ]);

    for row in &rows {
        let timeout_cell = if row.seconds_until_route_timeout == i64::MAX {
            "-".to_string()
        } else {
            row.seconds_until_route_timeout.to_string()
        };

        table.add_row(vec![
            Cell::new(row.destination),
            Cell::new(row.next_hop),
            Cell::new(row.metric),
            Cell::new(row.outgoing_port),
            Cell::new(timeout_cell),
            Cell::new(row.seconds_until_gc),
        ]);
    }

    println!("{table}");
    println!(
        "router {} | uptime {}s | packets sent {} / received {} | updates sent {} / received {} ({} triggered)",
        router.table().self_id(),
        snapshot.uptime_seconds,
        snapshot.packets_sent,
        snapshot.packets_received,
        snapshot.routing_updates_sent,
        snapshot.routing_updates_received,
        snapshot.triggered_updates_sent,
    );
}
