//! Parser for `config get cluster` responses
//!
//! Response format:
//! ```text
//! CONFIG cluster 0 <payload-size>\n
//! <version>\n
//! <host>|<ip>|<port> <host>|<ip>|<port> ...\n
//! ```
//!
//! `<payload-size>` is the byte count of the version line plus the node
//! line, terminators included. The count is checked against the raw lines
//! so that truncated or concatenated responses are rejected even when each
//! line parses on its own.

use std::io::{BufRead, Read, Take};

use tracing::debug;

use super::node::parse_node_entry;
use super::topology::ClusterTopology;
use crate::utils::{DiscoveryError, FramingError, ResponseLine, Result, TransportError};

/// Number of space-separated tokens in the metadata line
const HEADER_TOKENS: usize = 4;

/// Longest metadata line accepted, terminator included
pub const MAX_HEADER_LEN: u64 = 256;

/// Parse a full config response from `reader`
///
/// Either every check passes and a complete topology is returned, or the
/// first failing check is reported and nothing else is.
///
/// Nothing past the declared payload size plus one byte is read, so an
/// oversized payload is rejected without buffering it.
pub fn parse_config<R: BufRead>(reader: &mut R) -> Result<ClusterTopology> {
    let header = read_header(reader)?;
    let payload_size = parse_header(line_str(&header, ResponseLine::Header)?)?;

    let mut payload = reader
        .by_ref()
        .take((payload_size as u64).saturating_add(1));

    let raw_version = read_payload_line(&mut payload, payload_size, ResponseLine::Version)?;
    let version = parse_version(line_str(&raw_version, ResponseLine::Version)?)?;

    let raw_nodes = read_payload_line(&mut payload, payload_size, ResponseLine::Nodes)?;

    let actual = raw_version.len() + raw_nodes.len();
    if actual != payload_size {
        return Err(DiscoveryError::Consistency {
            expected: payload_size,
            actual,
        });
    }

    let nodes = line_str(&raw_nodes, ResponseLine::Nodes)?
        .trim()
        .split(' ')
        .map(parse_node_entry)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(
        "Parsed cluster config version {} with {} node(s)",
        version,
        nodes.len()
    );

    Ok(ClusterTopology::new(version, nodes))
}

/// Read up to and including the next `\n`
fn read_raw_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(128);
    reader
        .read_until(b'\n', &mut buf)
        .map_err(TransportError::from_read)?;
    Ok(buf)
}

fn read_header<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut limited = reader.by_ref().take(MAX_HEADER_LEN);
    let header = read_raw_line(&mut limited)?;

    if header.last() == Some(&b'\n') {
        Ok(header)
    } else if limited.limit() == 0 {
        Err(FramingError::HeaderTooLong {
            limit: MAX_HEADER_LEN,
        }
        .into())
    } else {
        Err(FramingError::Unreadable {
            line: ResponseLine::Header,
        }
        .into())
    }
}

/// Read one payload line from a reader capped at `expected + 1` bytes
///
/// Running into the cap means the payload is longer than declared.
fn read_payload_line<R: BufRead>(
    payload: &mut Take<R>,
    expected: usize,
    line: ResponseLine,
) -> Result<Vec<u8>> {
    let raw = read_raw_line(payload)?;

    if raw.last() == Some(&b'\n') {
        Ok(raw)
    } else if payload.limit() == 0 {
        Err(DiscoveryError::Consistency {
            expected,
            actual: expected.saturating_add(1),
        })
    } else {
        Err(FramingError::Unreadable { line }.into())
    }
}

fn line_str(raw: &[u8], line: ResponseLine) -> Result<&str> {
    std::str::from_utf8(raw)
        .map_err(|_| DiscoveryError::from(FramingError::InvalidUtf8 { line }))
}

/// Validate `CONFIG cluster 0 <size>` and return the declared payload size
fn parse_header(raw: &str) -> Result<usize> {
    let header = raw.trim();
    let tokens: Vec<&str> = header.split(' ').collect();
    if tokens.len() != HEADER_TOKENS {
        return Err(FramingError::HeaderTokenCount {
            count: tokens.len(),
            header: header.to_string(),
        }
        .into());
    }

    tokens[3].parse::<usize>().map_err(|e| {
        DiscoveryError::from(FramingError::InvalidPayloadSize {
            header: header.to_string(),
            source: e,
        })
    })
}

fn parse_version(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    trimmed.parse::<u64>().map_err(|e| {
        DiscoveryError::from(FramingError::InvalidVersion {
            raw: trimmed.to_string(),
            source: e,
        })
    })
}
