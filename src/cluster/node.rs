//! Cluster node representation

use std::fmt;

use serde::Serialize;

use crate::utils::NodeFormatError;

/// Cluster member as advertised by the configuration endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClusterNode {
    /// DNS name advertised by the member
    pub hostname: String,
    /// IP literal advertised by the member (not validated)
    pub ip: String,
    /// Port
    pub port: u16,
}

impl ClusterNode {
    /// Get node address as `ip:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// Get node address as `hostname:port`
    pub fn host_address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

impl fmt::Display for ClusterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.hostname, self.ip, self.port)
    }
}

/// Parse one entry of the node list
///
/// Format: `<hostname>|<ip>|<port>`
///
/// Example:
/// ```text
/// cache-0001.abc123.cfg.use1.cache.amazonaws.com|10.0.0.1|11211
/// ```
pub fn parse_node_entry(entry: &str) -> Result<ClusterNode, NodeFormatError> {
    let fields: Vec<&str> = entry.split('|').collect();
    if fields.len() != 3 {
        return Err(NodeFormatError::FieldCount {
            entry: entry.to_string(),
            fields: fields.len(),
        });
    }

    let (hostname, ip, port) = (fields[0], fields[1], fields[2]);
    if hostname.is_empty() {
        return Err(NodeFormatError::EmptyField {
            entry: entry.to_string(),
            field: "hostname",
        });
    }
    if ip.is_empty() {
        return Err(NodeFormatError::EmptyField {
            entry: entry.to_string(),
            field: "ip",
        });
    }

    let port: u16 = port.parse().map_err(|e| NodeFormatError::InvalidPort {
        entry: entry.to_string(),
        source: e,
    })?;

    Ok(ClusterNode {
        hostname: hostname.to_string(),
        ip: ip.to_string(),
        port,
    })
}
