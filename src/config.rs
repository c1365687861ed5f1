//! Configuration file loader: parses the three-line router config format
//! into a [`RouterConfig`] and a ready-to-use [`crate::neighbor::NeighborTable`].
//!
//! Treated as an external collaborator by SPEC_FULL.md §1: the routing
//! engine never reaches into this module's internals, it only consumes the
//! [`RouterConfig`] produced here.

use crate::neighbor::{Link, NeighborTable};
use crate::{Metric, Port, RouterId};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const ROUTER_ID_RANGE: std::ops::RangeInclusive<u32> = 1..=64000;
const PORT_RANGE: std::ops::RangeInclusive<u32> = 1024..=64000;
const METRIC_RANGE: std::ops::RangeInclusive<u32> = 1..=15;

/// Structured configuration errors, reported with line context per
/// SPEC_FULL.md §7.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line} ({field}): {message}")]
    Syntax {
        line: usize,
        field: &'static str,
        message: String,
    },

    #[error("line {line} ({field}): {value} is out of range {range}")]
    Range {
        line: usize,
        field: &'static str,
        value: i64,
        range: &'static str,
    },

    #[error("line {line}: duplicate port {port}")]
    DuplicatePort { line: usize, port: Port },
}

/// The parsed, validated configuration for one router instance.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub router_id: RouterId,
    pub input_ports: Vec<Port>,
    pub outputs: HashMap<RouterId, Link>,
}

impl RouterConfig {
    pub fn neighbor_table(&self) -> NeighborTable {
        NeighborTable::new(self.outputs.clone())
    }

    /// Load and validate a configuration file. Fails closed: any violation
    /// is reported before the caller binds a single socket.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let lines: Vec<&str> = contents.lines().collect();
        Self::parse(&lines)
    }

    fn parse(lines: &[&str]) -> Result<Self, ConfigError> {
        let router_id = parse_router_id_line(lines.first().copied())?;
        let input_ports = parse_input_ports_line(lines.get(1).copied())?;
        let outputs = parse_outputs_line(lines.get(2).copied())?;

        Ok(RouterConfig {
            router_id,
            input_ports,
            outputs,
        })
    }
}

fn parse_router_id_line(line: Option<&str>) -> Result<RouterId, ConfigError> {
    const LINE: usize = 1;
    const FIELD: &str = "router-id";

    let line = line.ok_or_else(|| ConfigError::Syntax {
        line: LINE,
        field: FIELD,
        message: "missing 'router-id' line".to_string(),
    })?;

    let rest = line.strip_prefix("router-id ").ok_or_else(|| ConfigError::Syntax {
        line: LINE,
        field: FIELD,
        message: format!("expected 'router-id <N>', got '{line}'"),
    })?;

    let value: i64 = rest.trim().parse().map_err(|_| ConfigError::Syntax {
        line: LINE,
        field: FIELD,
        message: format!("'{}' is not a valid integer", rest.trim()),
    })?;

    if !ROUTER_ID_RANGE.contains(&(value as u32)) || value < 0 {
        return Err(ConfigError::Range {
            line: LINE,
            field: FIELD,
            value,
            range: "[1, 64000]",
        });
    }

    Ok(value as RouterId)
}

fn parse_input_ports_line(line: Option<&str>) -> Result<Vec<Port>, ConfigError> {
    const LINE: usize = 2;
    const FIELD: &str = "input-ports";

    let line = line.ok_or_else(|| ConfigError::Syntax {
        line: LINE,
        field: FIELD,
        message: "missing 'input-ports' line".to_string(),
    })?;

    let rest = line.strip_prefix("input-ports ").ok_or_else(|| ConfigError::Syntax {
        line: LINE,
        field: FIELD,
        message: format!("expected 'input-ports <P1>,<P2>,...', got '{line}'"),
    })?;

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(ConfigError::Syntax {
            line: LINE,
            field: FIELD,
            message: "no ports specified after 'input-ports'".to_string(),
        });
    }

    let mut ports = Vec::new();
    for token in rest.split(',') {
        let token = token.trim();
        let value: i64 = token.parse().map_err(|_| ConfigError::Syntax {
            line: LINE,
            field: FIELD,
            message: format!("'{token}' is not a valid integer port"),
        })?;

        if !PORT_RANGE.contains(&(value.max(0) as u32)) || value < 0 {
            return Err(ConfigError::Range {
                line: LINE,
                field: FIELD,
                value,
                range: "[1024, 64000]",
            });
        }

        let port = value as Port;
        if ports.contains(&port) {
            return Err(ConfigError::DuplicatePort { line: LINE, port });
        }
        ports.push(port);
    }

    Ok(ports)
}

fn parse_outputs_line(line: Option<&str>) -> Result<HashMap<RouterId, Link>, ConfigError> {
    const LINE: usize = 3;
    const FIELD: &str = "outputs";

    let line = line.ok_or_else(|| ConfigError::Syntax {
        line: LINE,
        field: FIELD,
        message: "missing 'outputs' line".to_string(),
    })?;

    let rest = line.strip_prefix("outputs ").ok_or_else(|| ConfigError::Syntax {
        line: LINE,
        field: FIELD,
        message: format!("expected 'outputs <Port>-<Metric>-<RouterId>,...', got '{line}'"),
    })?;

    let rest = rest.trim();
    if rest.is_empty() {
        return Err(ConfigError::Syntax {
            line: LINE,
            field: FIELD,
            message: "no outputs specified after 'outputs'".to_string(),
        });
    }

    let mut outputs = HashMap::new();
    let mut seen_ports: Vec<Port> = Vec::new();

    for token in rest.split(',') {
        let token = token.trim();
        let parts: Vec<&str> = token.split('-').collect();
        if parts.len() != 3 {
            return Err(ConfigError::Syntax {
                line: LINE,
                field: FIELD,
                message: format!("'{token}' must be 'port-metric-routerId'"),
            });
        }

        let port: i64 = parts[0].trim().parse().map_err(|_| ConfigError::Syntax {
            line: LINE,
            field: FIELD,
            message: format!("'{}' is not a valid integer port", parts[0]),
        })?;
        let metric: i64 = parts[1].trim().parse().map_err(|_| ConfigError::Syntax {
            line: LINE,
            field: FIELD,
            message: format!("'{}' is not a valid integer metric", parts[1]),
        })?;
        let router_id: i64 = parts[2].trim().parse().map_err(|_| ConfigError::Syntax {
            line: LINE,
            field: FIELD,
            message: format!("'{}' is not a valid integer router id", parts[2]),
        })?;

        if !PORT_RANGE.contains(&(port.max(0) as u32)) || port < 0 {
            return Err(ConfigError::Range {
                line: LINE,
                field: "outputs.port",
                value: port,
                range: "[1024, 64000]",
            });
        }
        if !METRIC_RANGE.contains(&(metric.max(0) as u32)) || metric < 0 {
            return Err(ConfigError::Range {
                line: LINE,
                field: "outputs.metric",
                value: metric,
                range: "[1, 15]",
            });
        }
        if !ROUTER_ID_RANGE.contains(&(router_id.max(0) as u32)) || router_id < 0 {
            return Err(ConfigError::Range {
                line: LINE,
                field: "outputs.routerId",
                value: router_id,
                range: "[1, 64000]",
            });
        }

        let port = port as Port;
        if seen_ports.contains(&port) {
            return Err(ConfigError::DuplicatePort { line: LINE, port });
        }
        seen_ports.push(port);

        outputs.insert(
            router_id as RouterId,
            Link {
                outgoing_port: port,
                link_cost: metric as Metric,
            },
        );
    }

    Ok(outputs)
}
