//! Cluster topology and config response parsing
//!
//! This module provides:
//! - Topology and node types returned by discovery
//! - Parsing of `config get cluster` responses with size validation

pub mod config_parser;
pub mod node;
pub mod topology;

pub use config_parser::parse_config;
pub use node::{parse_node_entry, ClusterNode};
pub use topology::ClusterTopology;
