//! Resolver trait for cluster membership lookups
//!
//! The trait allows different lookup strategies:
//! - `AutoDiscovery`: `config get cluster` against a configuration endpoint
//! - Future: other lookup kinds as additional implementations

use crate::client::ResolveContext;
use crate::cluster::ClusterTopology;
use crate::utils::Result;

/// Cluster membership lookup
///
/// Each call is independent: one lookup, no state carried between calls.
pub trait Resolver: Send + Sync {
    /// Resolve the current topology behind `address` (`host:port`)
    ///
    /// `ctx` bounds the whole call; its expiry or cancellation is reported
    /// as a transport error.
    fn resolve(&self, ctx: &ResolveContext, address: &str) -> Result<ClusterTopology>;
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn resolve(&self, ctx: &ResolveContext, address: &str) -> Result<ClusterTopology> {
        (**self).resolve(ctx, address)
    }
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve(&self, ctx: &ResolveContext, address: &str) -> Result<ClusterTopology> {
        (**self).resolve(ctx, address)
    }
}
