//! Resolver configuration derived from CLI arguments

use std::time::Duration;

use super::cli::CliArgs;
use crate::client::ResolveContext;
use crate::utils::DiscoveryError;

/// Default connection timeout
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolver tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum time to establish the TCP connection
    pub dial_timeout: Duration,
    /// Deadline for the whole resolution; `None` leaves reads unbounded
    pub operation_timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            operation_timeout: None,
        }
    }
}

impl ResolverConfig {
    pub fn with_dial_timeout(dial_timeout: Duration) -> Self {
        Self {
            dial_timeout,
            ..Self::default()
        }
    }

    /// Build configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, DiscoveryError> {
        let config = Self {
            dial_timeout: Duration::from_millis(args.dial_timeout_ms),
            operation_timeout: args.timeout_ms.map(Duration::from_millis),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.dial_timeout.is_zero() {
            return Err(DiscoveryError::Config(
                "dial timeout must be greater than zero".to_string(),
            ));
        }
        if self.operation_timeout.map_or(false, |t| t.is_zero()) {
            return Err(DiscoveryError::Config(
                "operation timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Fresh context for one resolution, starting the operation clock now
    pub fn context(&self) -> ResolveContext {
        match self.operation_timeout {
            Some(timeout) => ResolveContext::with_timeout(timeout),
            None => ResolveContext::background(),
        }
    }
}
