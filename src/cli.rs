//! Command-line surface: a configuration file path plus the timer overrides
//! used to run compressed test profiles.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "ripd")]
#[command(about = "A RIPv2-style distance-vector routing daemon")]
#[command(version)]
pub struct Cli {
    /// Path to the router's configuration file.
    pub config: String,

    /// Seconds before an Active route is declared unreachable.
    #[arg(long, value_name = "SECS")]
    pub route_timeout: Option<u64>,

    /// Seconds an Expired route waits before garbage collection.
    #[arg(long, value_name = "SECS")]
    pub gc_period: Option<u64>,

    /// Seconds between diagnostic table redraws; 0 disables the redraw.
    #[arg(long, value_name = "SECS")]
    pub display_interval: Option<u64>,
}
