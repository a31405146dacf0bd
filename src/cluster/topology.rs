//! Cluster topology snapshot

use std::fmt;

use serde::Serialize;

use super::node::ClusterNode;

/// Versioned cluster membership as returned by a configuration endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterTopology {
    /// Config version assigned by the cluster
    pub version: u64,
    /// Members in wire order
    pub nodes: Vec<ClusterNode>,
}

impl ClusterTopology {
    pub fn new(version: u64, nodes: Vec<ClusterNode>) -> Self {
        Self { version, nodes }
    }

    /// Get total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterNode> {
        self.nodes.iter()
    }

    /// All node addresses as `ip:port`, in wire order
    pub fn addresses(&self) -> Vec<String> {
        self.nodes.iter().map(ClusterNode::address).collect()
    }

    /// Whether this snapshot carries a later config version than `other`
    pub fn is_newer_than(&self, other: &ClusterTopology) -> bool {
        self.version > other.version
    }

    /// Get node by hostname
    pub fn get_node_by_hostname(&self, hostname: &str) -> Option<&ClusterNode> {
        self.nodes.iter().find(|n| n.hostname == hostname)
    }
}

impl fmt::Display for ClusterTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "version {} [", self.version)?;
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", node)?;
        }
        f.write_str("]")
    }
}

impl<'a> IntoIterator for &'a ClusterTopology {
    type Item = &'a ClusterNode;
    type IntoIter = std::slice::Iter<'a, ClusterNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
