//! Cluster membership discovery

pub mod auto_discovery;
pub mod resolver;

pub use auto_discovery::AutoDiscovery;
pub use resolver::Resolver;
