//! Configuration module

pub mod cli;
pub mod resolver_config;

pub use cli::{CliArgs, OutputFormat};
pub use resolver_config::{ResolverConfig, DEFAULT_DIAL_TIMEOUT};
