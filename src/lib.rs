//! memcache-discovery library
//!
//! Resolves the members of an auto-discovery cache cluster by sending
//! `config get cluster` to its configuration endpoint and validating the
//! length-prefixed response.
//!
//! ```no_run
//! use memcache_discovery::{AutoDiscovery, ResolveContext, Resolver};
//!
//! let resolver = AutoDiscovery::default();
//! let topology = resolver.resolve(&ResolveContext::background(), "cfg.example.com:11211")?;
//! for node in &topology {
//!     println!("{} -> {}", node.hostname, node.address());
//! }
//! # Ok::<(), memcache_discovery::DiscoveryError>(())
//! ```

pub mod client;
pub mod cluster;
pub mod config;
pub mod discovery;
pub mod utils;

pub use client::{CancelHandle, ResolveContext};
pub use cluster::{parse_config, ClusterNode, ClusterTopology};
pub use config::ResolverConfig;
pub use discovery::{AutoDiscovery, Resolver};
pub use utils::{DiscoveryError, ErrorKind};
