//! RIPv2-shaped response wire codec.
//!
//! A packet is a 4-byte header followed by zero or more 20-byte route
//! entries. Only the Response command is ever transmitted; Request messages,
//! authentication entries, and multicast addressing are out of scope.

use crate::{Metric, RouterId, INFINITY};

const HEADER_LEN: usize = 4;
const ENTRY_LEN: usize = 20;
const COMMAND_RESPONSE: u8 = 2;
const VERSION: u8 = 2;
const AFI_INET: u16 = 2;

/// One route as carried on the wire: a destination and the metric advertised
/// for it (already poisoned by the sender if applicable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireEntry {
    pub destination: RouterId,
    pub metric: Metric,
}

/// Outcome of decoding a datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedPacket {
    MalformedHeader,
    WrongVersion,
    WrongCommand,
    Accepted {
        sender: RouterId,
        entries: Vec<WireEntry>,
    },
}

/// Encode a Response packet: header naming `sender`, followed by one
/// 20-byte entry per item in `entries`, in order.
pub fn encode_response(sender: RouterId, entries: &[WireEntry]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN + ENTRY_LEN * entries.len());

    buf.push(COMMAND_RESPONSE);
    buf.push(VERSION);
    buf.extend_from_slice(&sender.to_be_bytes());

    for entry in entries {
        buf.extend_from_slice(&AFI_INET.to_be_bytes());
        buf.extend_from_slice(&0u16.to_be_bytes()); // route tag / padding
        buf.extend_from_slice(&entry.destination.to_be_bytes());
        buf.extend_from_slice(&[0u8; 8]); // must-be-zero
        let metric_field = (entry.metric as u32).to_be_bytes();
        buf.extend_from_slice(&metric_field);
    }

    buf
}

/// Decode a datagram per the contract in SPEC_FULL.md §4.1.
pub fn decode(data: &[u8]) -> DecodedPacket {
    if data.len() < HEADER_LEN {
        return DecodedPacket::MalformedHeader;
    }

    let command = data[0];
    let version = data[1];

    if command != COMMAND_RESPONSE {
        return DecodedPacket::WrongCommand;
    }
    if version != VERSION {
        return DecodedPacket::WrongVersion;
    }

    let sender = u16::from_be_bytes([data[2], data[3]]);

    let num_entries = (data.len() - HEADER_LEN) / ENTRY_LEN;
    let mut entries = Vec::with_capacity(num_entries);

    for i in 0..num_entries {
        let off = HEADER_LEN + i * ENTRY_LEN;
        let afi = u16::from_be_bytes([data[off], data[off + 1]]);
        let destination = u16::from_be_bytes([data[off + 4], data[off + 5]]);
        let metric = data[off + 19];

        if afi != AFI_INET {
            continue;
        }
        if metric > INFINITY {
            continue;
        }

        entries.push(WireEntry {
            destination,
            metric,
        });
    }

    DecodedPacket::Accepted { sender, entries }
}
