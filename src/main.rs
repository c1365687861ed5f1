use clap::Parser;
use log::{error, info};
use std::process::ExitCode;
use std::time::Duration;

use ripd::cli::Cli;
use ripd::config::RouterConfig;
use ripd::metrics::Metrics;
use ripd::router::Router;
use ripd::routing_table::{DEFAULT_GC_PERIOD, DEFAULT_ROUTE_TIMEOUT};
use ripd::scheduler::{self, SchedulerConfig, DEFAULT_EXPIRY_SCAN_PERIOD, DEFAULT_PERIODIC_UPDATE_PERIOD};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ripd::RouterResult<()> {
    let config = RouterConfig::load(&cli.config)?;
    info!(
        "loaded config: router-id {}, {} input port(s), {} neighbor(s)",
        config.router_id,
        config.input_ports.len(),
        config.outputs.len()
    );

    let route_timeout = cli
        .route_timeout
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_ROUTE_TIMEOUT);
    let gc_period = cli
        .gc_period
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_GC_PERIOD);

    let metrics = Metrics::new();
    let router = Router::new(
        config.router_id,
        config.neighbor_table(),
        route_timeout,
        gc_period,
        metrics,
    );

    let scheduler_config = SchedulerConfig {
        periodic_update_period: DEFAULT_PERIODIC_UPDATE_PERIOD,
        expiry_scan_period: DEFAULT_EXPIRY_SCAN_PERIOD,
        display_period: cli.display_interval.and_then(|secs| {
            if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            }
        }),
    };

    scheduler::run(router, &config.input_ports, scheduler_config).await
}
