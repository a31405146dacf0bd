//! Command-line argument parsing

use clap::{Parser, ValueEnum};

/// Resolve the members of an auto-discovery cache cluster
#[derive(Parser, Debug, Clone)]
#[command(name = "memcache-discovery")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Configuration endpoint (host:port)
    pub endpoint: String,

    /// Connection timeout in milliseconds
    #[arg(long = "dial-timeout-ms", default_value_t = 5000)]
    pub dial_timeout_ms: u64,

    /// Overall deadline for the resolution in milliseconds (unbounded if unset)
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Output format for the resolved topology
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl CliArgs {
    /// Parse arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
